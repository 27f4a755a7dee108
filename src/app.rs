use crate::api::client::ApiClient;
use crate::config::Settings;
use crate::error::{AppError, ConfigError};
use crate::storage::Store;
use crate::sync::SyncController;
use crate::ui;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;

#[derive(Debug, Parser)]
#[command(name = "debate-chat")]
#[command(version)]
#[command(about = "Chat with a debate-style conversation service from the terminal")]
pub struct Args {
    /// Base URL of the conversation service
    #[arg(long)]
    pub base_url: Option<String>,

    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite file holding the saved conversation and profile
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Write the resolved settings to the config file and exit
    #[arg(long)]
    pub init_config: bool,

    /// Log requests and state transitions
    #[arg(long, short)]
    pub verbose: bool,
}

/// Defaults, then file, then `DEBATE_*` environment, then flags.
pub fn load_settings(args: &Args) -> Result<(Settings, Option<PathBuf>), ConfigError> {
    load_settings_with(args, |k| std::env::var(k).ok())
}

/// `load_settings` with the environment read through `lookup`.
pub fn load_settings_with<F>(
    args: &Args,
    lookup: F,
) -> Result<(Settings, Option<PathBuf>), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = args.config.clone().or_else(Settings::default_path);
    let mut settings = match &path {
        Some(p) => Settings::load_from(p)?,
        None => Settings::default(),
    };
    settings.apply_env(lookup)?;
    if let Some(url) = &args.base_url {
        settings.base_url = url.clone();
    }
    Ok((settings.normalized()?, path))
}

pub fn open_store(args: &Args) -> Result<Store, AppError> {
    let store = match &args.db {
        Some(path) => Store::open(path)?,
        None => Store::open_default()?,
    };
    Ok(store)
}

pub async fn run(args: Args) -> Result<(), AppError> {
    let (settings, config_path) = load_settings(&args)?;

    if args.init_config {
        let path = config_path.ok_or_else(|| ConfigError::Write("no config directory".into()))?;
        settings.save_to(&path)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let store = open_store(&args)?;
    let limit = settings.history_limit;
    let client = ApiClient::new(settings)?;
    let controller = SyncController::new(client, store).with_history_limit(limit);

    controller.initialize().await;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    ui::repl::run(&controller, stdin, &mut stdout, ui::chat_view::DEFAULT_WIDTH).await?;
    Ok(())
}
