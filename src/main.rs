use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::{EnvFilter, fmt};

use pgshift::config::{self, ConnectionArgs};
use pgshift::constants::CONFIG_FILENAME;
use pgshift::db::connection::{connect_to_database, lazy_pool};
use pgshift::migrator::Migrator;

#[derive(Parser)]
#[command(author, version, about = "Plain-SQL migration runner for PostgreSQL", long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: String,

    #[command(flatten)]
    connection_args: ConnectionArgs,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new migration file
    Create {
        /// Slug appended to the generated timestamp prefix
        name: String,
    },

    /// Apply all pending migrations
    Up,

    /// Roll back the most recently applied migration
    Down,

    /// Roll back the last migration, then apply it again
    Redo,

    /// Print the state of every migration file
    Status,

    /// Print the most recently applied migration
    Dbversion,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);
    run(cli).await
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run(cli: Cli) -> Result<()> {
    let file_input = config::load_config(&cli.config_file)?;
    let config = config::ConfigBuilder::new()
        .with_file(file_input)
        .with_cli_args(cli.connection_args.clone().into())
        .resolve()?;

    // `create` only touches the filesystem, so it gets a pool that never
    // opens a connection.
    let pool = match &cli.command {
        Commands::Create { .. } => lazy_pool(&config.database_url)?,
        _ => connect_to_database(&config.database_url, "migration database").await?,
    };

    let migrator = Migrator::new(pool, &config.migrations_dir);

    match &cli.command {
        Commands::Create { name } => {
            let path = migrator.create(name)?;
            println!("Created new migration: {}", path.display());
            Ok(())
        }
        Commands::Up => migrator.up().await,
        Commands::Down => migrator.down().await,
        Commands::Redo => migrator.redo().await,
        Commands::Status => migrator.status().await,
        Commands::Dbversion => migrator.db_version().await,
    }
}
