//! Notification dispatch.
//!
//! The monitor hands every batch of new messages, and every per-thread
//! problem, to a [`Notifier`]. Channels are independent: a [`NotifierSet`]
//! fans out to all of them and a failing channel is logged, never
//! propagated.

pub mod ntfy;
pub mod outbox;

pub use ntfy::NtfyNotifier;
pub use outbox::OutboxNotifier;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::Result;
use crate::format::plain_text;
use crate::structure::CanonicalMessage;

/// A delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in logs.
    fn name(&self) -> &str;

    /// Sends a batch of new messages from one thread, in order.
    async fn deliver(&self, thread_title: &str, messages: &[CanonicalMessage]) -> Result<()>;

    /// Reports a problem that prevented a thread (or the whole run) from
    /// being checked.
    async fn alert(&self, subject: &str, diagnostic: &str) -> Result<()>;
}

/// Writes deliveries and alerts to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, thread_title: &str, messages: &[CanonicalMessage]) -> Result<()> {
        info!(thread = thread_title, count = messages.len(), "new messages");
        for message in messages {
            debug!(thread = thread_title, "{}", plain_text(message));
        }
        Ok(())
    }

    async fn alert(&self, subject: &str, diagnostic: &str) -> Result<()> {
        warn!(subject, "{diagnostic}");
        Ok(())
    }
}

/// Fans out to every configured channel.
#[derive(Default)]
pub struct NotifierSet {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel.
    pub fn with(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifiers.push(Box::new(notifier));
        self
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for NotifierSet {
    fn name(&self) -> &str {
        "all"
    }

    async fn deliver(&self, thread_title: &str, messages: &[CanonicalMessage]) -> Result<()> {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.deliver(thread_title, messages).await {
                warn!(channel = notifier.name(), thread = thread_title, error = %e, "delivery failed");
            }
        }
        Ok(())
    }

    async fn alert(&self, subject: &str, diagnostic: &str) -> Result<()> {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.alert(subject, diagnostic).await {
                warn!(channel = notifier.name(), subject, error = %e, "alert failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThreadwatchError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recording(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, thread_title: &str, messages: &[CanonicalMessage]) -> Result<()> {
            self.0.lock().unwrap().push(format!("{thread_title}:{}", messages.len()));
            Ok(())
        }

        async fn alert(&self, subject: &str, _diagnostic: &str) -> Result<()> {
            self.0.lock().unwrap().push(format!("alert:{subject}"));
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Notifier for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn deliver(&self, _: &str, _: &[CanonicalMessage]) -> Result<()> {
            Err(ThreadwatchError::NotifyError("down".to_string()))
        }

        async fn alert(&self, _: &str, _: &str) -> Result<()> {
            Err(ThreadwatchError::NotifyError("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_set_survives_failing_channel() {
        let recording = Recording::default();
        let set = NotifierSet::new().with(Broken).with(recording.clone()).with(LogNotifier);

        assert_eq!(set.len(), 3);
        assert!(set.deliver("Updates", &[]).await.is_ok());
        assert!(set.alert("Updates", "unreachable").await.is_ok());
        assert_eq!(*recording.0.lock().unwrap(), vec!["Updates:0".to_string(), "alert:Updates".to_string()]);
    }
}
