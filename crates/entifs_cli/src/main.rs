//! EntiFS CLI
//!
//! Command-line tools for EntiFS store directories.
//!
//! # Commands
//!
//! - `inspect` - Display kinds, entity counts and leftover staged files
//! - `get` - Print one entity
//! - `list` - Print the entities of a kind, ordered and paged
//! - `put` - Write an entity from JSON
//! - `remove` - Remove an entity
//! - `verify` - Check that every entity file holds a JSON object

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// EntiFS command-line store tools.
#[derive(Parser)]
#[command(name = "entifs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store base directory
    #[arg(global = true, short, long, default_value = entifs_core::DEFAULT_BASE_DIR)]
    path: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display kinds, entity counts and staged files
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print one entity by `kind:id` reference
    Get {
        /// Entity reference, e.g. `user:1`
        key: String,
    },

    /// Print the entities of a kind
    List {
        /// Entity kind
        kind: String,

        /// Field to order by
        #[arg(short, long)]
        order_by: Option<String>,

        /// Sort largest first
        #[arg(short, long)]
        desc: bool,

        /// Number of entities to skip
        #[arg(short, long)]
        start: Option<usize>,

        /// Maximum number of entities to print
        #[arg(short, long)]
        max: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write an entity from a JSON object
    Put {
        /// Entity kind
        kind: String,

        /// Fields as a JSON object
        json: String,

        /// Id to write; a fresh id is allocated if omitted
        #[arg(short, long)]
        id: Option<String>,
    },

    /// Remove an entity by `kind:id` reference
    Remove {
        /// Entity reference, e.g. `user:1`
        key: String,
    },

    /// Verify entity files and report staged leftovers
    Verify {
        /// Remove leftover staged files
        #[arg(short, long)]
        clean: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { format } => {
            commands::inspect::run(&cli.path, &format)?;
        }
        Commands::Get { key } => {
            commands::entity::get(&cli.path, &key)?;
        }
        Commands::List {
            kind,
            order_by,
            desc,
            start,
            max,
            format,
        } => {
            let query = commands::entity::ListQuery {
                order_by,
                desc,
                start,
                max,
            };
            commands::entity::list(&cli.path, &kind, query, &format)?;
        }
        Commands::Put { kind, json, id } => {
            commands::entity::put(&cli.path, &kind, &json, id.as_deref())?;
        }
        Commands::Remove { key } => {
            commands::entity::remove(&cli.path, &key)?;
        }
        Commands::Verify { clean } => {
            commands::verify::run(&cli.path, clean)?;
        }
        Commands::Version => {
            println!("EntiFS CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("EntiFS Core v{}", entifs_core::VERSION);
        }
    }

    Ok(())
}
