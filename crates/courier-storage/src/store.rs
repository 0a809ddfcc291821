//! The named-data store: SQLite name index plus content-addressed blobs.

use crate::{Fingerprint, Result, StorageError};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS named_data (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    fingerprint TEXT NOT NULL
)";

/// Deduplicated blob storage addressable by logical name.
///
/// The index maps each name to a content fingerprint and remembers
/// insertion order; blob bytes live under `blobs/<fingerprint>` exactly
/// once per distinct content. Re-storing a name with different content
/// repoints the name (last write wins) and leaves the previous blob
/// orphaned on disk; there is no reference counting.
pub struct Storage {
    conn: Mutex<Connection>,
    blob_dir: PathBuf,
}

impl Storage {
    /// Opens the store rooted at `root`, creating it if needed.
    ///
    /// Reopening an existing root sees all previously stored entries.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let blob_dir = root.join("blobs");
        fs::create_dir_all(&blob_dir)?;

        let conn = Connection::open(root.join("index.db"))?;
        conn.execute(SCHEMA, [])?;

        tracing::debug!(root = %root.display(), "opened named-data store");
        Ok(Self {
            conn: Mutex::new(conn),
            blob_dir,
        })
    }

    /// Stores `data` under `name`, returning the content fingerprint.
    ///
    /// Identical content is written to disk only once, no matter how
    /// many names reference it.
    pub fn store(&self, name: &str, data: &[u8]) -> Result<Fingerprint> {
        let fingerprint = Fingerprint::of(data);
        let blob_path = self.blob_path(&fingerprint);

        if !blob_path.exists() {
            // Write-then-rename keeps a half-written blob invisible.
            let staging = blob_path.with_extension("tmp");
            fs::write(&staging, data)?;
            fs::rename(&staging, &blob_path)?;
        }

        self.conn.lock().execute(
            "INSERT INTO named_data (name, fingerprint) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET fingerprint = excluded.fingerprint",
            params![name, fingerprint.hex()],
        )?;

        tracing::debug!(name, %fingerprint, "stored named data");
        Ok(fingerprint)
    }

    /// Loads every entry whose name is exactly `name` or extends it past
    /// a `/` boundary, in original insertion order.
    ///
    /// An empty result is not an error.
    pub fn load(&self, name: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let rows = self.matching_rows(name)?;
        rows.into_iter()
            .map(|(entry_name, fingerprint)| {
                let data = fs::read(self.blob_dir.join(&fingerprint))?;
                Ok((entry_name, data))
            })
            .collect()
    }

    /// Which of `required` have never been stored (exact names only).
    pub fn find_missing(&self, required: &HashSet<String>) -> Result<HashSet<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT 1 FROM named_data WHERE name = ?1")?;
        let mut missing = HashSet::new();
        for name in required {
            if !stmt.exists(params![name])? {
                missing.insert(name.clone());
            }
        }
        Ok(missing)
    }

    /// Copies the content stored under exactly `name` to `destination`,
    /// creating or overwriting it.
    pub fn copy_to_file(&self, name: &str, destination: impl AsRef<Path>) -> Result<()> {
        let fingerprint: Option<String> = self
            .conn
            .lock()
            .query_row(
                "SELECT fingerprint FROM named_data WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let fingerprint = fingerprint.ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        fs::copy(self.blob_dir.join(fingerprint), destination)?;
        Ok(())
    }

    /// Removes index entries with the same exact-or-prefix semantics as
    /// [`Storage::load`], returning the removed names in insertion order.
    ///
    /// Blobs stay behind; they are only unreachable once no name points
    /// at them.
    pub fn remove(&self, name: &str) -> Result<Vec<String>> {
        let removed: Vec<String> = self
            .matching_rows(name)?
            .into_iter()
            .map(|(entry_name, _)| entry_name)
            .collect();
        self.conn.lock().execute(
            "DELETE FROM named_data WHERE name = ?1 OR name LIKE ?2 ESCAPE '!'",
            params![name, prefix_pattern(name)],
        )?;
        tracing::debug!(name, count = removed.len(), "removed named data");
        Ok(removed)
    }

    fn matching_rows(&self, name: &str) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT name, fingerprint FROM named_data
             WHERE name = ?1 OR name LIKE ?2 ESCAPE '!'
             ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![name, prefix_pattern(name)], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn blob_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.blob_dir.join(fingerprint.hex())
    }
}

/// LIKE pattern matching names that extend `name` past a `/` boundary.
fn prefix_pattern(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        if matches!(ch, '%' | '_' | '!') {
            escaped.push('!');
        }
        escaped.push(ch);
    }
    escaped.push_str("/%");
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    fn blob_count(dir: &TempDir) -> usize {
        fs::read_dir(dir.path().join("blobs")).unwrap().count()
    }

    #[test]
    fn store_and_load_exact() {
        let (_dir, storage) = open_store();
        storage.store("models/alpha", b"weights").unwrap();

        let loaded = storage.load("models/alpha").unwrap();
        assert_eq!(loaded, vec![("models/alpha".to_string(), b"weights".to_vec())]);
    }

    #[test]
    fn identical_content_is_stored_once() {
        let (dir, storage) = open_store();
        storage.store("one", b"same bytes").unwrap();
        storage.store("two", b"same bytes").unwrap();

        assert_eq!(blob_count(&dir), 1);
        assert_eq!(storage.load("one").unwrap()[0].1, b"same bytes");
        assert_eq!(storage.load("two").unwrap()[0].1, b"same bytes");
    }

    #[test]
    fn load_unknown_name_is_empty_not_an_error() {
        let (_dir, storage) = open_store();
        assert!(storage.load("anything").unwrap().is_empty());

        storage.store("models/alpha", b"weights").unwrap();
        assert!(storage.load("zz").unwrap().is_empty());
    }

    #[test]
    fn prefix_load_respects_path_boundary() {
        let (_dir, storage) = open_store();
        storage.store("run/a", b"1").unwrap();
        storage.store("run/b", b"2").unwrap();
        storage.store("runway", b"3").unwrap();

        let loaded = storage.load("run").unwrap();
        assert_eq!(
            loaded,
            vec![
                ("run/a".to_string(), b"1".to_vec()),
                ("run/b".to_string(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn prefix_load_preserves_insertion_order() {
        let (_dir, storage) = open_store();
        let names = ["set/z", "set/a", "set/m"];
        for (i, name) in names.iter().enumerate() {
            storage.store(name, &[i as u8]).unwrap();
        }

        let loaded = storage.load("set").unwrap();
        let loaded_names: Vec<&str> = loaded.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(loaded_names, names);
    }

    #[test]
    fn wildcard_characters_in_names_are_literal() {
        let (_dir, storage) = open_store();
        storage.store("a%b/x", b"1").unwrap();
        storage.store("axxb/y", b"2").unwrap();

        let loaded = storage.load("a%b").unwrap();
        assert_eq!(loaded, vec![("a%b/x".to_string(), b"1".to_vec())]);
    }

    #[test]
    fn restore_same_name_last_write_wins() {
        let (_dir, storage) = open_store();
        storage.store("doc", b"first").unwrap();
        storage.store("doc", b"second").unwrap();

        let loaded = storage.load("doc").unwrap();
        assert_eq!(loaded, vec![("doc".to_string(), b"second".to_vec())]);
    }

    #[test]
    fn overwrite_keeps_original_insertion_slot() {
        let (_dir, storage) = open_store();
        storage.store("set/a", b"1").unwrap();
        storage.store("set/b", b"2").unwrap();
        storage.store("set/a", b"3").unwrap();

        let loaded = storage.load("set").unwrap();
        assert_eq!(
            loaded,
            vec![
                ("set/a".to_string(), b"3".to_vec()),
                ("set/b".to_string(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn find_missing_is_exact_set_difference() {
        let (_dir, storage) = open_store();
        storage.store("have", b"x").unwrap();
        storage.store("have/nested", b"y").unwrap();

        let required: HashSet<String> = ["have", "want", "have/nested", "other"]
            .into_iter()
            .map(String::from)
            .collect();
        let expected: HashSet<String> =
            ["want", "other"].into_iter().map(String::from).collect();
        assert_eq!(storage.find_missing(&required).unwrap(), expected);
    }

    #[test]
    fn copy_to_file_writes_content() {
        let (dir, storage) = open_store();
        storage.store("doc", b"copy me").unwrap();

        let dest = dir.path().join("copied.bin");
        storage.copy_to_file("doc", &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"copy me");
    }

    #[test]
    fn copy_to_file_unknown_name_fails() {
        let (dir, storage) = open_store();
        let dest = dir.path().join("copied.bin");
        let err = storage.copy_to_file("ghost", &dest).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(name) if name == "ghost"));
    }

    #[test]
    fn remove_mirrors_prefix_semantics() {
        let (_dir, storage) = open_store();
        storage.store("set/a", b"1").unwrap();
        storage.store("set/b", b"2").unwrap();
        storage.store("settled", b"3").unwrap();

        let removed = storage.remove("set").unwrap();
        assert_eq!(removed, vec!["set/a".to_string(), "set/b".to_string()]);
        assert!(storage.load("set").unwrap().is_empty());
        assert_eq!(storage.load("settled").unwrap().len(), 1);
    }
}
