//! Offsync CLI
//!
//! Command-line tools for file-backed offline queues.
//!
//! # Commands
//!
//! - `inspect` - Display pending changes
//! - `verify` - Check that the stored queue is readable
//! - `clear` - Discard a stored queue

mod commands;

use clap::{Parser, Subcommand};
use offsync_engine::{EngineConfig, QueueStore};
use offsync_storage::FileStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offsync command-line queue tools.
#[derive(Parser)]
#[command(name = "offsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the queue store directory
    #[arg(global = true, short, long)]
    dir: Option<PathBuf>,

    /// Account whose queue to open
    #[arg(global = true, short, long)]
    account: Option<String>,

    /// Base queue key
    #[arg(global = true, short, long)]
    key: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display pending changes
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Inspect the dead-letter list instead of the queue
        #[arg(long)]
        dead_letter: bool,
    },

    /// Check that the stored queue and dead-letter list are readable
    Verify,

    /// Discard a stored queue
    Clear {
        /// Clear the dead-letter list instead of the queue
        #[arg(long)]
        dead_letter: bool,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::new();
        if let Some(key) = &self.key {
            config = config.with_queue_key(key.clone());
        }
        if let Some(account) = &self.account {
            config = config.with_account(account.clone());
        }
        config
    }

    fn open_store(&self, key: String) -> Result<QueueStore<FileStore>, Box<dyn std::error::Error>> {
        let dir = self.dir.as_deref().ok_or("Store directory required (--dir)")?;
        if !dir.is_dir() {
            return Err(format!("No queue store found at {:?}", dir).into());
        }
        Ok(QueueStore::new(FileStore::open(dir)?, key))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.config();
    match &cli.command {
        Commands::Inspect {
            format,
            dead_letter,
        } => {
            let key = if *dead_letter {
                config.dead_letter_key()
            } else {
                config.queue_key()
            };
            let store = cli.open_store(key)?;
            commands::inspect::run(&store, format)?;
        }
        Commands::Verify => {
            let queue = cli.open_store(config.queue_key())?;
            let dead_letters = cli.open_store(config.dead_letter_key())?;
            commands::verify::run(&[&queue, &dead_letters])?;
        }
        Commands::Clear { dead_letter } => {
            let key = if *dead_letter {
                config.dead_letter_key()
            } else {
                config.queue_key()
            };
            let store = cli.open_store(key)?;
            commands::clear::run(&store)?;
        }
        Commands::Version => {
            println!("offsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
