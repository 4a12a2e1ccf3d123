//! Circuity CLI - Command line interface for circuit search

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use circuity_storage::RedbNodeStore;
use commands::{completions, edge, label, locate, node, search};
use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "circuity")]
#[command(author, version, about = "Find circuits through labeled, weighted node graphs")]
pub struct Cli {
    /// Data directory
    #[arg(short, long, env = "CIRCUITY_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file
    #[arg(short, long, env = "CIRCUITY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::default_config_path)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage nodes
    Node(node::NodeArgs),
    /// Manage edges
    Edge(edge::EdgeArgs),
    /// Manage the label registry
    Label(label::LabelArgs),
    /// Resolve the node a label points at from a start node
    Locate(locate::LocateArgs),
    /// Search for a circuit
    Search(search::SearchArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with storage backend
pub struct AppContext {
    pub config: Config,
    pub store: Arc<RedbNodeStore>,
}

impl AppContext {
    pub fn new(cli: &Cli, config: Config) -> anyhow::Result<Self> {
        let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir());
        std::fs::create_dir_all(&data_dir)?;

        let db_path = data_dir.join("circuity.redb");
        tracing::debug!("Using database at: {:?}", db_path);

        let store = RedbNodeStore::open(&db_path)?;

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting circuity CLI");

    // Commands that never touch the database
    match &cli.command {
        Commands::Config(args) => return commands::config::run(args, &cli),
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let config = Config::load(&cli.config_path())?;
    let ctx = AppContext::new(&cli, config)?;

    match &cli.command {
        Commands::Node(args) => node::run(args, &cli, &ctx).await?,
        Commands::Edge(args) => edge::run(args, &cli, &ctx).await?,
        Commands::Label(args) => label::run(args, &cli, &ctx).await?,
        Commands::Locate(args) => locate::run(args, &cli, &ctx).await?,
        Commands::Search(args) => search::run(args, &cli, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    Ok(())
}
