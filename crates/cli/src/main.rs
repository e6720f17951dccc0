mod config_commands;
mod links_commands;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    clap::{Parser, Subcommand},
    courier_config::CourierConfig,
    courier_store::ConfigStore,
    tokio_util::sync::CancellationToken,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "courier",
    about = "Courier: relays tagged requests between linked Telegram chats"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of courier.{toml,yaml,yml,json}).
    #[arg(long, global = true, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory holding the link store (overrides default data dir).
    #[arg(long, global = true, env = "COURIER_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default when no subcommand is provided).
    Run,
    /// Inspect or edit stored links offline.
    Links {
        #[command(subcommand)]
        action: links_commands::LinksAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load config from `--config` or the standard locations, with env
/// overrides applied.
fn load_config(config_path: Option<&Path>) -> anyhow::Result<CourierConfig> {
    let config = match config_path {
        Some(path) => courier_config::load_config(path)?,
        None => courier_config::discover_and_load()?,
    };
    config.validate()?;
    Ok(config)
}

fn store_path(config: &CourierConfig, data_dir: Option<&Path>) -> PathBuf {
    let data_dir = data_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(courier_config::data_dir);
    config.store.resolve(&data_dir)
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    config.telegram.require_token()?;

    let path = store_path(&config, cli.data_dir.as_deref());
    let store = Arc::new(ConfigStore::file(&path));
    // Creates the document on first start and surfaces a corrupt file early.
    let doc = store.snapshot().await?;
    info!(
        store = %path.display(),
        links = doc.links.len(),
        oversight = doc.qg.is_some(),
        "link store ready"
    );

    let cancel = CancellationToken::new();
    let poller = courier_telegram::start_polling(&config, store, cancel.clone()).await?;

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shutdown.cancel();
        }
    });

    poller.await??;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    courier_config::load_dotenv();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "courier starting");

    match &cli.command {
        None | Some(Commands::Run) => run(&cli).await,
        Some(Commands::Links { action }) => {
            let config = load_config(cli.config.as_deref())?;
            let store = ConfigStore::file(store_path(&config, cli.data_dir.as_deref()));
            links_commands::handle_links(&store, action).await
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref(), cli.data_dir.as_deref())
        },
    }
}
