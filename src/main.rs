use anyhow::Result;
use clap::{Parser, Subcommand};
use dmrest::db::{schema, Db};
use dmrest::rest::RestServer;
use dmrest::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dmrest")]
#[command(about = "Read-only JSON REST API over a typed topic graph")]
struct Args {
    /// Config file (defaults to $DMREST_CONFIG, then ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API (default)
    Serve,
    /// Check the store has every graph table and column, without writing
    Verify,
    /// Create the graph tables in a new or empty store
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.dmrest.log_level.as_str())
    ).init();

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await?,
        Command::Verify => run_verification(config).await?,
        Command::Init => run_init(config).await?,
    }

    Ok(())
}

/// Open the store read-only and make sure the read path can query it
async fn open_graph(config: &Config) -> Result<Db> {
    let db = Db::read_only(config.db_path());
    let report = db.with_connection(|conn| schema::require(conn)).await?;
    log::info!("Database {}: {}", config.db_path().display(), report.describe());
    Ok(db)
}

async fn run_server(config: Config) -> Result<()> {
    log::info!("Starting DMRest v{}", env!("CARGO_PKG_VERSION"));

    let db = open_graph(&config).await?;
    // A missing host url stops startup here rather than on the first request
    let server = RestServer::new(db, &config)?;
    server.run().await?;

    Ok(())
}

async fn run_verification(config: Config) -> Result<()> {
    log::info!("Verifying DMRest database v{}", env!("CARGO_PKG_VERSION"));

    let db = Db::read_only(config.db_path());
    let report = db.with_connection(|conn| schema::inspect(conn)).await?;
    for table in &report.missing_tables {
        log::error!("Missing table: {}", table);
    }
    for column in &report.missing_columns {
        log::error!("Missing column: {}", column);
    }
    if !report.is_ready() {
        anyhow::bail!("Topic graph schema incomplete: {}", report.describe());
    }

    match config.host_url() {
        Some(host) => log::info!("✓ Resource links use {}", host),
        None => log::warn!("No host url configured; serve will refuse to start"),
    }
    log::info!("✓ {}", report.describe());
    Ok(())
}

async fn run_init(config: Config) -> Result<()> {
    let db = Db::new(config.db_path());
    db.with_connection(|conn| schema::install(conn)).await?;
    log::info!("✓ Topic graph schema ready in {}", config.db_path().display());
    Ok(())
}
