use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use callhistory::cli::{clear, list, mark_read, unread};
use callhistory::config::Config;
use callhistory::db::Database;
use callhistory::logging;
use callhistory::model::{CallStatus, ConversationId};

#[derive(Parser)]
#[command(name = "callhistory")]
#[command(about = "Inspect and maintain the local call history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "callhistory.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List calls, newest first
    List {
        /// Only calls in this conversation (thread:<id> or link:<id>)
        #[arg(short, long)]
        conversation: Option<ConversationId>,

        /// Only calls with this status (e.g. group.ringingMissed)
        #[arg(short, long)]
        status: Option<CallStatus>,

        /// Maximum number of calls to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show unread calls and the unread missed-call count
    Unread,

    /// Mark unread calls as read
    MarkRead {
        /// Only calls that began at or before this timestamp (ms)
        #[arg(long)]
        before: Option<u64>,
    },

    /// Delete calls that began at or before a timestamp
    Clear {
        /// Timestamp in milliseconds
        #[arg(long)]
        before: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config).unwrap_or_default();

    logging::init(&config.logging.level)?;

    let path = config.database_path();
    let db = Database::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    match cli.command {
        Commands::List {
            conversation,
            status,
            limit,
        } => {
            list::run(&db, &config, conversation, status, limit)?;
        }
        Commands::Unread => {
            unread::run(&db, &config)?;
        }
        Commands::MarkRead { before } => {
            mark_read::run(&db, &config, before)?;
        }
        Commands::Clear { before } => {
            clear::run(&db, &config, before)?;
        }
    }

    Ok(())
}
