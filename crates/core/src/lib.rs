//! # threadwatch-core
//!
//! Incremental monitoring of XenForo-style forum threads.
//!
//! A run fetches the most recent pages of every configured thread, turns each
//! post into a [`CanonicalMessage`], drops the ones whose content hash is
//! already in the [`SeenMessageStore`], and hands the rest to a [`Notifier`].
//!
//! ## Quick Start
//!
//! ```rust
//! use threadwatch_core::{SiteLayout, ThreadStyle, extract_messages};
//!
//! let html = r#"<html><body>
//!     <article class="message-body js-selectToQuote">
//!         <div class="bbWrapper">Chapter 12 is out</div>
//!     </article>
//! </body></html>"#;
//!
//! let layout = SiteLayout::default().compile().unwrap();
//! let messages = extract_messages(html, &layout, &ThreadStyle::default()).unwrap();
//! assert_eq!(messages.len(), 1);
//! assert!(messages[0].html().contains("Chapter 12 is out"));
//! ```
//!
//! ## Polling
//!
//! ```rust,no_run
//! use threadwatch_core::{FetchConfig, HttpPageSource, LogNotifier, Monitor, MonitorConfig, ThreadListParser};
//!
//! # async fn run() -> threadwatch_core::Result<()> {
//! let targets = ThreadListParser::parse_file("threads.txt")?;
//! let source = HttpPageSource::new(&FetchConfig::default())?;
//! let notifier = LogNotifier;
//!
//! let monitor = Monitor::new(&source, &notifier, "last.txt", MonitorConfig::default())?;
//! let summary = monitor.run(&targets).await;
//! println!("{} new message(s)", summary.delivered());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod layout;
pub mod monitor;
pub mod notify;
pub mod parse;
pub mod store;
pub mod structure;
pub mod threads;

pub use error::{Result, ThreadwatchError};
pub use extract::{MessageCandidate, Rejection, extract_candidates, extract_messages};
pub use fetch::{DEFAULT_PROBE_PAGE, FetchConfig, HttpPageSource, PageSource, fetch_recent_pages, page_url};
pub use format::{Digest, compose_alert, compose_digest, plain_digest, plain_text};
pub use layout::{CompiledLayout, SiteLayout};
pub use monitor::{Monitor, MonitorConfig, MonitorConfigBuilder, RunSummary, ThreadOutcome};
pub use notify::{LogNotifier, Notifier, NotifierSet, NtfyNotifier, OutboxNotifier};
pub use parse::{Document, Element};
pub use store::{MAX_STORED_MESSAGES, MessageId, SeenMessageStore};
pub use structure::{CanonicalMessage, MessageKind, StyledBlock, structure_message};
pub use threads::{ThreadListParser, ThreadStyle, ThreadTarget};
