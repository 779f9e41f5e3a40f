use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use designhub_application::DesignHub;
use designhub_infrastructure::ConfigService;

mod commands;

#[derive(Parser)]
#[command(name = "designhub")]
#[command(about = "designhub - manage locally stored email template designs", long_about = None)]
struct Cli {
    /// Store directory (overrides `storage.data_dir` from the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved designs, newest first
    List {
        /// Only show designs whose name contains this text (case-insensitive)
        #[arg(long)]
        query: Option<String>,
    },
    /// Print a design record as JSON
    Show { name: String },
    /// Save a design document from a JSON file ("-" reads stdin)
    Save { name: String, file: PathBuf },
    /// Delete a design
    Delete { name: String },
    /// Rename a design
    Rename { old_name: String, new_name: String },
    /// Copy a design under a new name
    Duplicate {
        name: String,
        /// Name for the copy; defaults to "<name> (Copy)"
        #[arg(long = "as")]
        new_name: Option<String>,
    },
    /// Export all designs as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import designs from an exported JSON file
    Import { file: PathBuf },
    /// Show how much of the storage capacity is in use
    Usage,
    /// Delete every design and autosave slot
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "designhub=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let mut config = config_service.get_config();
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = Some(data_dir);
    }
    tracing::debug!(data_dir = ?config.storage.data_dir, "Configuration resolved");

    let hub = DesignHub::open(config).context("Failed to open design store")?;
    let designs = hub.designs();
    let designs = designs.as_ref();
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::List { query } => commands::designs::list(designs, query.as_deref(), &mut out).await?,
        Commands::Show { name } => commands::designs::show(designs, &name, &mut out).await?,
        Commands::Save { name, file } => {
            let input = commands::read_input(&file)?;
            commands::designs::save(designs, &name, &input, &mut out).await?
        }
        Commands::Delete { name } => commands::designs::delete(designs, &name, &mut out).await?,
        Commands::Rename { old_name, new_name } => {
            commands::designs::rename(designs, &old_name, &new_name, &mut out).await?
        }
        Commands::Duplicate { name, new_name } => {
            commands::designs::duplicate(designs, &name, new_name.as_deref(), &mut out).await?
        }
        Commands::Export { output } => match output {
            Some(path) => commands::transfer::export_to_file(designs, &path, &mut out).await?,
            None => commands::transfer::export(designs, &mut out).await?,
        },
        Commands::Import { file } => {
            let input = commands::read_input(&file)?;
            commands::transfer::import(designs, &input, &mut out).await?
        }
        Commands::Usage => commands::storage::usage(designs, &mut out).await?,
        Commands::Clear { yes } => commands::storage::clear(designs, yes, &mut out).await?,
    }

    Ok(())
}
