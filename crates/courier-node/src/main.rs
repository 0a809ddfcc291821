//! The `courier-node` binary: one process, one role.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use courier_node::{Broker, Client, Config, Datastore, Executor, Node, Role};
use courier_types::Eid;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "courier-node",
    version,
    about = "A delay-tolerant job and data coordination node"
)]
struct Args {
    /// Node endpoint identifier, e.g. dtn://alpha/
    #[arg(long)]
    id: String,

    /// Path to the bundle agent's socket.
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Optional configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// More -v, more detail (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    role: RoleCommand,
}

#[derive(Subcommand, Debug)]
enum RoleCommand {
    /// Mediate discovery and job placement.
    Broker,
    /// Hold named, content-addressed blobs.
    Datastore {
        /// Directory rooting the blob store.
        root: PathBuf,
    },
    /// Offer capacity for job payloads.
    Executor,
    /// Query the job board on behalf of a submitter.
    Client {
        /// Submitter endpoint identifier.
        submitter: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(socket) = args.socket {
        config.socket = socket;
    }

    let node_id = Eid::new(args.id);
    match args.role {
        RoleCommand::Broker => run(node_id, Broker::new(), config).await,
        RoleCommand::Datastore { root } => run(node_id, Datastore::open(root)?, config).await,
        RoleCommand::Executor => run(node_id, Executor, config).await,
        RoleCommand::Client { submitter } => {
            run(node_id, Client::new(Eid::new(submitter)), config).await
        }
    }
}

async fn run<R: Role>(node_id: Eid, role: R, config: Config) -> anyhow::Result<()> {
    let node = Node::connect(node_id, role, config).await?;
    tokio::select! {
        result = node.run() => result.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}
