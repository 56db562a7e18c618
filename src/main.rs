mod config;
mod fetch;
mod llm;
mod pipeline;
mod platform;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::fetch::HttpFetcher;
use crate::llm::LlmClient;
use crate::pipeline::ReactionPipeline;
use crate::platform::discord::{self, DiscordReactions};

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{level},emojibot={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            error!("Failed to load config from {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_filter());

    info!("Configuration loaded from {}", config_path.display());
    info!("  Model: {}", config.model);
    if config.check_tone_appropriateness {
        info!("  Tone model: {}", config.tone_model());
    }
    info!("  Extraction: {}", config.extraction_mode);
    info!("  Whitelisted channels: {}", config.whitelisted_channels.len());

    if config.whitelisted_channels.is_empty() {
        warn!("No whitelisted channels configured - bot won't react to any messages");
    }

    let config = Arc::new(config);

    // Long-lived handles shared by every message task.
    let llm_http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build LLM HTTP client")?;
    let fetch_http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build attachment HTTP client")?;

    let pipeline = Arc::new(ReactionPipeline::new(
        config.clone(),
        Arc::new(LlmClient::new(
            llm_http,
            &config.base_url,
            &config.openai_api_key,
        )),
        Arc::new(HttpFetcher::new(fetch_http)),
        Arc::new(DiscordReactions::new(&config.bot_token)),
    ));

    info!("Bot is starting...");
    discord::run(config, pipeline).await?;

    info!("Bot stopped");
    Ok(())
}
