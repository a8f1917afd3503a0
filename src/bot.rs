use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LoggingConfig};
use crate::dispatch::DispatchEngine;
use crate::outbound::OutboundComposer;
use crate::platform::telegram::TelegramFeed;
use crate::platform::RemoteFeed;

/// Everything a bot needs, wired to one Telegram connection
pub struct BotKit {
    pub engine: DispatchEngine,
    pub composer: Arc<OutboundComposer>,
    /// Raw API access for calls the kit does not wrap
    pub bot: teloxide::Bot,
}

/// Build the dispatch engine and composer from a loaded config
pub fn create(config: &Config) -> Result<BotKit> {
    let feed = TelegramFeed::new(&config.telegram.bot_token, config.polling.wait_secs)?;
    let bot = feed.bot().clone();
    let feed: Arc<dyn RemoteFeed> = Arc::new(feed);

    Ok(BotKit {
        engine: DispatchEngine::new(feed.clone()).with_wait_secs(config.polling.wait_secs),
        composer: Arc::new(OutboundComposer::new(feed)),
        bot,
    })
}

/// Install the global tracing subscriber. RUST_LOG wins over the config filter.
///
/// Call once, before `create`. Fails if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.filter.as_str().into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to install tracing subscriber")
}

impl BotKit {
    /// Poll until the feed fails. Logging is the caller's job (`init_logging`).
    pub async fn start(mut self) -> Result<()> {
        info!("Bot is starting...");
        self.engine.run().await
    }
}
