//! Push notifications through an ntfy server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::Notifier;
use crate::format::plain_digest;
use crate::structure::CanonicalMessage;
use crate::{Result, ThreadwatchError};

/// Public ntfy instance.
pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";

/// ntfy "high" priority.
const PRIORITY: u8 = 4;

/// JSON publish payload, see <https://docs.ntfy.sh/publish/#publish-as-json>.
#[derive(Debug, Serialize)]
struct Publish<'a> {
    topic: &'a str,
    title: &'a str,
    message: &'a str,
    priority: u8,
}

/// Publishes plain-text digests to one ntfy topic.
#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    client: Client,
    server: String,
    topic: String,
}

impl NtfyNotifier {
    pub fn new(server: &str, topic: &str, timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(ThreadwatchError::HttpError)?;

        Ok(Self { client, server: server.trim_end_matches('/').to_string(), topic: topic.to_string() })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, title: &str, message: &str) -> Result<()> {
        let payload = Publish { topic: &self.topic, title, message, priority: PRIORITY };
        let response = self.client.post(&self.server).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThreadwatchError::NotifyError(format!("ntfy answered {status}")));
        }

        debug!(topic = %self.topic, "published to ntfy");
        Ok(())
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn deliver(&self, thread_title: &str, messages: &[CanonicalMessage]) -> Result<()> {
        let title = format!("New messages in {thread_title}");
        self.publish(&title, &plain_digest(thread_title, messages)).await
    }

    async fn alert(&self, subject: &str, diagnostic: &str) -> Result<()> {
        self.publish(subject, &format!("❌ {diagnostic}")).await
    }
}
