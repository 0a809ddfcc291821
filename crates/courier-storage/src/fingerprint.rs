//! Content fingerprints.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest identifying one blob's content.
///
/// Names that carry the same fingerprint share the same bytes on disk;
/// the lowercase hex form doubles as the blob's file name and as the
/// index column value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; Self::LEN]);

impl Fingerprint {
    /// Digest width in bytes.
    pub const LEN: usize = 32;

    /// Fingerprints the given content.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// The lowercase hex form, as stored in the index.
    #[must_use]
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = hex::FromHexError;

    /// Parses the hex form read back from an index row.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut digest = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut digest)?;
        Ok(Self(digest))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.hex()[..12])
    }
}
