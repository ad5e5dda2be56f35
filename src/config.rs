use anyhow::{bail, Result};
use std::env;

/// Process-wide settings, read once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the Twitter v2 API.
    pub bearer_token: String,
    /// Discord webhook id (the numeric path segment).
    pub webhook_id: String,
    /// Discord webhook token (the secret path segment).
    pub webhook_token: String,
    /// Account handle whose tweets are relayed, without the leading `@`.
    pub username: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            bearer_token: require(&get, "bearertoken")?,
            webhook_id: require(&get, "webhookid")?,
            webhook_token: require(&get, "webhooktoken")?,
            username: require(&get, "twitterusername")?,
        })
    }
}

fn require(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    match get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => bail!("environment variable {} is empty", key),
        None => bail!("environment variable {} is not set", key),
    }
}
