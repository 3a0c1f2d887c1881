//! Main entry point for bracket-rank
//!
//! Parses the command line, loads configuration, initializes logging and runs
//! one ranking workflow or the interactive menu.

use anyhow::Result;
use bracket_rank::config::{validate_config, AppConfig};
use bracket_rank::metrics::MetricsCollector;
use bracket_rank::rating::JsonFileStateStore;
use bracket_rank::roster::{load_tournament_list, AliasTable};
use bracket_rank::service::{InteractiveMenu, RankingService};
use bracket_rank::source::{ChallongeClient, Credentials, StaticTournamentSource, TournamentSource};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Bracket Rank - TrueSkill leaderboards from tournament brackets
#[derive(Parser)]
#[command(
    name = "bracket-rank",
    version,
    about = "Rank players from tournament brackets with TrueSkill",
    long_about = "Bracket Rank fetches completed brackets from a Challonge-style API, folds every \
                 decided match into a persisted TrueSkill rating per player, and writes \
                 scores.csv and wins.csv leaderboards."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Offline tournament data
    #[arg(
        long,
        value_name = "FILE",
        help = "Serve tournaments from a JSON fixture file instead of the API"
    )]
    fixtures: Option<PathBuf>,

    /// Print metrics on exit
    #[arg(long, help = "Print Prometheus metrics after the command finishes")]
    print_metrics: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Interactive menu (default)
    Menu,
    /// Import one tournament into the saved rankings
    Add {
        /// Tournament identifier, e.g. the bracket URL slug
        tournament: String,
    },
    /// Show one player's rating and record
    Player {
        /// Raw or canonical player name
        name: String,
    },
    /// Recompute all rankings from the known tournament list
    Rebuild,
    /// Rewrite the leaderboards from the saved state
    Report,
    /// Validate configuration and input files, then exit
    Validate,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    validate_config(&config)?;
    Ok(config)
}

/// Display startup information
fn display_startup_banner(config: &AppConfig) {
    info!("Bracket Rank v{}", bracket_rank::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   API: {}", config.challonge.base_url);
    info!("   State: {}", config.paths.state_file.display());
    info!("   Reports: {}", config.paths.stats_dir.display());
}

/// Check every input file the workflows depend on
fn validate_inputs(config: &AppConfig) -> Result<()> {
    let aliases = AliasTable::load(&config.paths.alias_file)?;
    info!("Alias table OK: {} aliases", aliases.len());

    match load_tournament_list(&config.paths.tournaments_file) {
        Ok(list) => info!("Tournament list OK: {} tournaments", list.len()),
        Err(e) => warn!("Tournament list unavailable: {}", e),
    }

    match Credentials::resolve(&config.challonge, &config.paths.credentials_file) {
        Ok(_) => info!("API credentials OK"),
        Err(e) => warn!("API credentials unavailable: {}", e),
    }

    Ok(())
}

/// Build the HTTP source; missing credentials only fail the first fetch
fn challonge_source(config: &AppConfig) -> Result<ChallongeClient> {
    let credentials = match Credentials::resolve(&config.challonge, &config.paths.credentials_file)
    {
        Ok(credentials) => Some(credentials),
        Err(e) => {
            warn!("No tournament API credentials found: {}", e);
            None
        }
    };

    ChallongeClient::new(
        config.challonge.base_url.clone(),
        credentials,
        config.request_timeout(),
    )
}

/// Run one command against the given source
async fn run_command<S: TournamentSource>(
    command: Command,
    config: &AppConfig,
    source: S,
    metrics: Arc<MetricsCollector>,
) -> Result<()> {
    let store = JsonFileStateStore::new(&config.paths.state_file);
    let service = RankingService::from_config(config, source, store, metrics)?;

    match command {
        Command::Menu => {
            let stdin = std::io::stdin();
            InteractiveMenu::new(&service)
                .run(stdin.lock(), std::io::stdout())
                .await?;
        }
        Command::Add { tournament } => {
            let outcome = service.add_tournament(&tournament).await?;
            println!(
                "Added {}: {} matches applied, {} players ranked.",
                outcome.summary.tournament, outcome.summary.edges_applied, outcome.total_players
            );
        }
        Command::Player { name } => {
            print!("{}", service.player_summary(&name)?);
        }
        Command::Rebuild => {
            let outcome = service.rebuild_all().await?;
            println!("Tournaments checked:");
            for summary in &outcome.tournaments {
                println!("* {}", summary.tournament);
            }
            println!("{} players ranked.", outcome.total_players);
        }
        Command::Report => {
            let report = service.refresh_reports()?;
            println!("{} players ranked.", report.rankings.len());
        }
        Command::Validate => {
            validate_inputs(config)?;
            info!("Configuration validation successful");
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    let command = args.command.clone().unwrap_or(Command::Menu);
    let metrics = Arc::new(MetricsCollector::new()?);

    let result = if let Some(fixtures) = &args.fixtures {
        info!("Serving tournaments from {}", fixtures.display());
        match StaticTournamentSource::from_json_file(fixtures) {
            Ok(source) => run_command(command, &config, source, metrics.clone()).await,
            Err(e) => Err(e),
        }
    } else {
        match challonge_source(&config) {
            Ok(source) => run_command(command, &config, source, metrics.clone()).await,
            Err(e) => Err(e),
        }
    };

    if args.print_metrics {
        match metrics.render_text() {
            Ok(text) => print!("{}", text),
            Err(e) => warn!("Failed to render metrics: {}", e),
        }
    }

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
