use crate::config::Config;
use crate::error::RemoteError;
use crate::notify::{format_notification, NotificationSink};
use crate::record;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const STREAM_URL: &str = "https://api.twitter.com/2/tweets/search/stream\
    ?user.fields=description,created_at,profile_image_url\
    &tweet.fields=entities&expansions=author_id";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Owns the long-lived connection to the filtered-stream endpoint and feeds
/// every complete record through parse -> format -> dispatch.
pub struct StreamSession {
    url: String,
    bearer_token: String,
    reconnect_delay: Duration,
    client: reqwest::Client,
}

impl StreamSession {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self::with_endpoint(client, config, STREAM_URL, RECONNECT_DELAY)
    }

    pub fn with_endpoint(
        client: reqwest::Client,
        config: &Config,
        url: &str,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            url: url.to_string(),
            bearer_token: config.bearer_token.clone(),
            reconnect_delay,
            client,
        }
    }

    /// Stream until the process is killed. The upstream service closes idle
    /// connections periodically; each drop gets one reconnect attempt with
    /// the same authorization and query after a short fixed delay. An error
    /// establishing a connection (initial or reconnect) propagates.
    pub async fn run(&self, sink: &dyn NotificationSink) -> Result<(), RemoteError> {
        let mut first = true;
        loop {
            if !first {
                tokio::time::sleep(self.reconnect_delay).await;
                info!("reconnecting to stream");
            }
            first = false;

            self.stream_once(sink).await?;
            warn!("stream connection dropped");
        }
    }

    /// One connection's lifetime. Returns `Ok(())` when the transport drops
    /// or the body ends; only connection establishment can error.
    async fn stream_once(&self, sink: &dyn NotificationSink) -> Result<(), RemoteError> {
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status {
                endpoint: "stream",
                status: response.status(),
            });
        }
        info!("connected to filtered stream");

        let mut body = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!(error = %err, "stream transport error");
                    return Ok(());
                }
            };

            // Chunk boundaries are arbitrary; records are newline-delimited.
            buffer.extend_from_slice(&chunk);
            for line in drain_lines(&mut buffer) {
                handle_record(&line, sink).await;
            }
        }

        Ok(())
    }
}

/// Run one record through the pipeline. Parse and dispatch failures are
/// logged and swallowed here: a single bad record must never end the session.
async fn handle_record(raw: &[u8], sink: &dyn NotificationSink) {
    match record::parse(raw) {
        Ok(Some(event)) => {
            debug!(id = %event.post_id, author = %event.author_handle, "tweet received");
            let message = format_notification(&event);
            if let Err(err) = sink.dispatch(&message).await {
                error!(kind = "dispatch", error = %err, "failed to deliver notification");
            }
        }
        Ok(None) => trace!("keep-alive"),
        Err(err) => {
            error!(kind = "parse", error = %err, "dropping malformed stream record");
        }
    }
}

/// Pull every complete line out of `buffer`, leaving any trailing partial
/// record in place for the next chunk. Strips the `\n` and an optional `\r`.
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let mut line: Vec<u8> = buffer.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        lines.push(line);
    }
    lines
}
