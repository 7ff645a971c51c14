//! One polling run over every configured thread.
//!
//! Threads are processed one after another. A thread that cannot be checked
//! produces an alert and a [`ThreadOutcome::Failed`]; the run moves on to the
//! next thread.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::Result;
use crate::extract::extract_messages;
use crate::fetch::{DEFAULT_PROBE_PAGE, PageSource, fetch_recent_pages};
use crate::layout::{CompiledLayout, SiteLayout};
use crate::notify::Notifier;
use crate::store::{MAX_STORED_MESSAGES, SeenMessageStore};
use crate::structure::CanonicalMessage;
use crate::threads::ThreadTarget;

/// Subject of the alert sent when there is nothing to monitor.
pub const CONFIG_ALERT_SUBJECT: &str = "Thread configuration";

/// Diagnostic of the alert sent when there is nothing to monitor.
pub const CONFIG_ALERT_TEXT: &str = "thread list is empty or invalid";

/// Configuration for a polling run.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How many of the most recent pages to scan per thread.
    pub pages_to_scan: u32,
    /// Retention cap of the seen-message store.
    pub max_stored_messages: usize,
    /// Page number requested to discover the last page.
    pub probe_page: u32,
    /// Report new messages without recording them.
    pub dry_run: bool,
    pub layout: SiteLayout,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            pages_to_scan: 3,
            max_stored_messages: MAX_STORED_MESSAGES,
            probe_page: DEFAULT_PROBE_PAGE,
            dry_run: false,
            layout: SiteLayout::default(),
        }
    }
}

impl MonitorConfig {
    /// Creates a new builder for MonitorConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use threadwatch_core::MonitorConfig;
    ///
    /// let config = MonitorConfig::builder().pages_to_scan(5).dry_run(true).build();
    /// assert_eq!(config.pages_to_scan, 5);
    /// ```
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }
}

/// Builder for [`MonitorConfig`].
#[derive(Debug, Clone)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: MonitorConfig::default() }
    }

    /// Sets the number of pages scanned per thread (at least 1).
    pub fn pages_to_scan(mut self, value: u32) -> Self {
        self.config.pages_to_scan = value.max(1);
        self
    }

    /// Sets the retention cap of the seen-message store.
    pub fn max_stored_messages(mut self, value: usize) -> Self {
        self.config.max_stored_messages = value;
        self
    }

    /// Sets the probe page number.
    pub fn probe_page(mut self, value: u32) -> Self {
        self.config.probe_page = value;
        self
    }

    /// Sets dry-run mode.
    pub fn dry_run(mut self, value: bool) -> Self {
        self.config.dry_run = value;
        self
    }

    /// Sets the forum layout.
    pub fn layout(mut self, value: SiteLayout) -> Self {
        self.config.layout = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> MonitorConfig {
        self.config
    }
}

impl Default for MonitorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to one thread during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadOutcome {
    /// New messages were found and handed to the notifier.
    Delivered { new: usize },
    /// Every message on the scanned pages was already known.
    Unchanged { scanned: usize },
    /// The thread could not be checked.
    Failed { reason: String },
}

impl fmt::Display for ThreadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered { new } => write!(f, "{new} new message(s)"),
            Self::Unchanged { scanned } => write!(f, "no new messages ({scanned} scanned)"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcomes of a run, in thread order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub threads: Vec<(String, ThreadOutcome)>,
}

impl RunSummary {
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Total number of new messages delivered.
    pub fn delivered(&self) -> usize {
        self.threads
            .iter()
            .map(|(_, outcome)| match outcome {
                ThreadOutcome::Delivered { new } => *new,
                _ => 0,
            })
            .sum()
    }

    /// Number of threads that could not be checked.
    pub fn failed(&self) -> usize {
        self.threads.iter().filter(|(_, outcome)| matches!(outcome, ThreadOutcome::Failed { .. })).count()
    }
}

/// Runs the fetch, extract, dedup and dispatch pipeline.
pub struct Monitor<'a> {
    source: &'a dyn PageSource,
    notifier: &'a dyn Notifier,
    store: SeenMessageStore,
    config: MonitorConfig,
    layout: CompiledLayout,
}

impl<'a> Monitor<'a> {
    /// Creates a monitor persisting seen ids at `store_path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ThreadwatchError::HtmlParseError`] if a layout
    /// selector does not compile.
    pub fn new<P: AsRef<Path>>(
        source: &'a dyn PageSource, notifier: &'a dyn Notifier, store_path: P, config: MonitorConfig,
    ) -> Result<Self> {
        let layout = config.layout.compile()?;
        let store = SeenMessageStore::with_capacity(store_path, config.max_stored_messages);
        Ok(Self { source, notifier, store, config, layout })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn store(&self) -> &SeenMessageStore {
        &self.store
    }

    /// Checks every target in order.
    ///
    /// An empty target list raises a configuration alert and yields an
    /// empty summary.
    pub async fn run(&self, targets: &[ThreadTarget]) -> RunSummary {
        let mut summary = RunSummary::default();

        if targets.is_empty() {
            warn!("no threads to monitor");
            self.send_alert(CONFIG_ALERT_SUBJECT, CONFIG_ALERT_TEXT).await;
            return summary;
        }

        for target in targets {
            let outcome = self.process_thread(target).await;
            summary.threads.push((target.title.clone(), outcome));
        }

        summary
    }

    /// Checks one thread and dispatches whatever is new.
    pub async fn process_thread(&self, target: &ThreadTarget) -> ThreadOutcome {
        let candidates = match self.poll_thread(target).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(thread = %target.title, error = %e, "cannot check thread");
                self.send_alert(&target.title, &format!("Failed to check thread {}: {e}", target.title))
                    .await;
                return ThreadOutcome::Failed { reason: e.to_string() };
            }
        };

        let scanned = candidates.len();
        let fresh = self.store.filter_new(candidates);

        if fresh.is_empty() {
            info!(thread = %target.title, scanned, "no new messages");
            return ThreadOutcome::Unchanged { scanned };
        }

        if self.config.dry_run {
            info!(thread = %target.title, new = fresh.len(), "dry run, not recording");
        } else if let Err(e) = self.store.record(&fresh) {
            warn!(thread = %target.title, error = %e, "cannot update seen-message store");
        }

        if let Err(e) = self.notifier.deliver(&target.title, &fresh).await {
            warn!(thread = %target.title, channel = self.notifier.name(), error = %e, "delivery failed");
        }

        info!(thread = %target.title, new = fresh.len(), scanned, "delivered new messages");
        ThreadOutcome::Delivered { new: fresh.len() }
    }

    /// Fetches the recent pages of a thread and renders every message on
    /// them, oldest page first.
    ///
    /// # Errors
    ///
    /// Fails when the last page cannot be resolved or any page fetch fails.
    pub async fn poll_thread(&self, target: &ThreadTarget) -> Result<Vec<CanonicalMessage>> {
        let last_page = self.source.last_page(&target.url, self.config.probe_page).await?;
        info!(thread = %target.title, last_page, "checking thread");

        let pages = fetch_recent_pages(self.source, &target.url, last_page, self.config.pages_to_scan).await?;

        let mut messages = Vec::new();
        for (_, body) in &pages {
            messages.extend(extract_messages(body, &self.layout, &target.style)?);
        }
        Ok(messages)
    }

    async fn send_alert(&self, subject: &str, diagnostic: &str) {
        if let Err(e) = self.notifier.alert(subject, diagnostic).await {
            warn!(subject, channel = self.notifier.name(), error = %e, "alert failed");
        }
    }
}
