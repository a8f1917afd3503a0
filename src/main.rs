use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use tgkit::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    tgkit::init_logging(&config.logging)?;
    info!("Configuration loaded from {}", config_path.display());
    info!("  Long poll wait: {}s", config.polling.wait_secs);

    let kit = tgkit::create(&config)?;

    // Echo every message back, attachments included
    let composer = Arc::clone(&kit.composer);
    kit.engine
        .on_message(move |event| {
            let composer = Arc::clone(&composer);
            async move {
                info!(
                    "Message {} in chat {} with {} attachment(s)",
                    event.anchor.message_id,
                    event.chat_id(),
                    event.attachments.len()
                );
                let text = event.effective_text().unwrap_or_default();
                composer
                    .send(event.chat_id(), text, &event.attachments, None)
                    .await
            }
        })
        .await;

    kit.engine
        .on_callback(|query| async move {
            info!(
                "Callback {} from user {}: {:?}",
                query.id, query.from_user_id, query.data
            );
            Ok(())
        })
        .await;

    kit.start().await
}
