pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod stream;
pub mod sync;

use clap::Parser;
use cli::{
    Cli, Commands, cmd_info, cmd_list_episodes, cmd_list_films, cmd_list_seasons, cmd_list_series,
    cmd_stream_url, cmd_sync,
};
pub use config::Config;
pub use db::Store;
pub use sync::{SyncDriver, SyncReport, SyncSettings};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let (mut config, loaded_from) = match &cli.config {
        Some(path) => (Config::load_from_path(path)?, Some(path.clone())),
        None => Config::load()?,
    };

    init_tracing(&config, cli.debug);

    match &loaded_from {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    if config.apply_overrides(cli.base_url.as_deref(), cli.token.as_deref()) {
        config.save_to_path(&config_path)?;
    }

    let command = cli.command.unwrap_or(Commands::Sync {
        force: false,
        json: false,
    });

    match command {
        Commands::Sync { force, json } => cmd_sync(&config, force, json).await,
        Commands::Films { sort } => cmd_list_films(&config, sort).await,
        Commands::Series { sort } => cmd_list_series(&config, sort).await,
        Commands::Seasons { series_id } => cmd_list_seasons(&config, series_id).await,
        Commands::Episodes { season_id } => cmd_list_episodes(&config, season_id).await,
        Commands::Info { kind, id } => cmd_info(&config, kind, id).await,
        Commands::Url { kind, id } => cmd_stream_url(&config, kind, id).await,
        Commands::Init => {
            if Config::create_default_if_missing(&config_path)? {
                println!("Created {}", config_path.display());
            } else {
                println!("Config already exists at {}", config_path.display());
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &Config, debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if debug {
        "debug"
    } else {
        config.general.log_level.as_str()
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
