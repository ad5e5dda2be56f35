use crate::error::DispatchError;
use crate::record::PostEvent;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

const DISCORD_WEBHOOK_BASE: &str = "https://discord.com/api/webhooks";

/// Fixed presentation pieces of every notification. These never vary with
/// the tweet being relayed.
const HEADER_TEXT: &str = "New tweet posted!";
const MENTION_TEXT: &str = "@here";
const SENDER_NAME: &str = "Tweet Relay";
const ACCENT_COLOR: u32 = 0x0099FF;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookMessage {
    pub content: String,
    pub username: String,
    pub avatar_url: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    /// RFC 3339, rendered by Discord as a local time.
    pub timestamp: String,
    pub author: EmbedAuthor,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

/// Build the webhook message for one tweet. Pure mapping, no I/O.
pub fn format_notification(event: &PostEvent) -> WebhookMessage {
    let permalink = event.permalink();
    WebhookMessage {
        content: format!("{} {}", HEADER_TEXT, MENTION_TEXT),
        username: SENDER_NAME.to_string(),
        avatar_url: event.author_avatar_url.clone(),
        embeds: vec![Embed {
            title: permalink.clone(),
            description: event.text.clone(),
            color: ACCENT_COLOR,
            timestamp: Utc::now().to_rfc3339(),
            author: EmbedAuthor {
                name: format!("{}(@{})", event.author_name, event.author_handle),
                url: permalink,
                icon_url: event.author_avatar_url.clone(),
            },
        }],
    }
}

/// Seam between the stream session and the chat platform.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn dispatch(&self, message: &WebhookMessage) -> Result<(), DispatchError>;
}

/// Posts messages to a Discord webhook.
pub struct DiscordWebhook {
    url: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(client: reqwest::Client, webhook_id: &str, webhook_token: &str) -> Self {
        Self {
            url: format!("{}/{}/{}", DISCORD_WEBHOOK_BASE, webhook_id, webhook_token),
            client,
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhook {
    async fn dispatch(&self, message: &WebhookMessage) -> Result<(), DispatchError> {
        let response = self.client.post(&self.url).json(message).send().await?;

        if !response.status().is_success() {
            return Err(DispatchError::Status(response.status()));
        }
        Ok(())
    }
}
