use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tweetcord::config::Config;
use tweetcord::notify::DiscordWebhook;
use tweetcord::rules::RuleManager;
use tweetcord::stream::StreamSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting tweetcord");
    let config = Config::from_env().context("incomplete configuration")?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("tweetcord/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    RuleManager::new(client.clone(), &config)
        .reconcile()
        .await
        .context("stream rule reconciliation failed")?;

    let sink = DiscordWebhook::new(client.clone(), &config.webhook_id, &config.webhook_token);
    StreamSession::new(client, &config)
        .run(&sink)
        .await
        .context("stream session ended")?;

    Ok(())
}
