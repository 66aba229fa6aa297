use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use jellyhome_config::{ConfigSource, JellyhomeConfig};
use jellyhome_core::model::BaseItem;
use jellyhome_core::{
    FavoritesAggregator, FavoritesState, HomeAggregator, JellyfinClient, RemoteClient, Session,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Parser)]
#[command(
    name = "jellyhomectl",
    version,
    about = "Load a Jellyfin home screen from the terminal"
)]
struct Cli {
    /// Config file (TOML or JSON). Skips $JELLYHOME_CONFIG_PATH and file
    /// discovery; environment overrides still apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full home refresh and print every rail
    Home {
        /// List the items of each rail, not just the counts
        #[arg(long)]
        items: bool,
    },
    /// Refresh continue watching, next up and recently added
    Resume,
    /// List favourites grouped by kind
    Favorites,
    /// Mark an item played, then print the reconciled continue-watching list
    MarkPlayed {
        /// Server item id
        item: String,
        /// Mark unplayed instead
        #[arg(long)]
        unplayed: bool,
    },
    /// Print the effective configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let (config, source) = load_config(cli.config.as_deref())?;
    tracing::info!(%source, "configuration loaded");

    let validation = config.validate();
    let mut out = io::stdout().lock();

    if let Command::Config = cli.command {
        writeln!(out, "# source: {source}")?;
        match &validation {
            Ok(warnings) => {
                for warning in warnings {
                    writeln!(out, "# warning: {warning}")?;
                }
            }
            Err(err) => writeln!(out, "# invalid: {err}")?,
        }
        write!(out, "{}", config.redacted().to_toml_string()?)?;
        return Ok(());
    }

    for warning in validation.context("invalid configuration")? {
        tracing::warn!(%warning, "configuration warning");
    }

    match cli.command {
        Command::Config => {}
        Command::Home { items } => {
            let home = HomeAggregator::new(connect(&config).await?, config.home_settings());
            home.refresh().await?;
            let snapshot = home.snapshot();
            if let Some(cause) = snapshot.state.error() {
                bail!("home refresh failed: {cause}");
            }
            render::home(&mut out, &snapshot, items)?;
        }
        Command::Resume => {
            let home = HomeAggregator::new(connect(&config).await?, config.home_settings());
            if let Some(handle) = home.background_refresh() {
                handle.await?;
            }
            let snapshot = home.snapshot();
            if let Some(cause) = &snapshot.last_background_error {
                bail!("refresh failed: {cause}");
            }
            render::resume(&mut out, &snapshot)?;
        }
        Command::Favorites => {
            let favorites = FavoritesAggregator::with_limit(connect(&config).await?, config.favorites_limit());
            if let Some(handle) = favorites.load() {
                handle.await?;
            }
            let snapshot = favorites.snapshot();
            if let FavoritesState::Error(cause) = &snapshot.state {
                bail!("failed to load favourites: {cause}");
            }
            render::favorites(&mut out, &snapshot)?;
        }
        Command::MarkPlayed { item, unplayed } => {
            let home = HomeAggregator::new(connect(&config).await?, config.home_settings());
            home.set_is_played(!unplayed, &BaseItem::with_id(item)).await?;
            let snapshot = home.snapshot();
            if let Some(cause) = snapshot.state.error() {
                bail!("failed to update played state: {cause}");
            }
            if let Some(cause) = &snapshot.last_background_error {
                tracing::warn!(%cause, "played state saved but the refresh failed");
            }
            render::resume(&mut out, &snapshot)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<(JellyhomeConfig, ConfigSource)> {
    match path {
        Some(path) => {
            let mut config = JellyhomeConfig::load_from_file(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            Ok((config, ConfigSource::File(path.to_path_buf())))
        }
        None => JellyhomeConfig::load_from_env(),
    }
}

async fn connect(config: &JellyhomeConfig) -> Result<Session> {
    let client = JellyfinClient::with_timeout(
        &config.server.url,
        config.client_identity(),
        config.timeout(),
    )?;
    client.set_token(config.session.access_token.clone()).await;
    let client: Arc<dyn RemoteClient> = Arc::new(client);

    match config.user_id() {
        Some(user_id) => Ok(Session::new(user_id, client)),
        None => Session::for_current_user(client)
            .await
            .context("failed to resolve the user owning the access token"),
    }
}
