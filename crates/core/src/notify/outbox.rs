//! HTML digests dropped into a directory for an external mailer.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::info;

use super::Notifier;
use crate::{Result, ThreadwatchError};
use crate::format::{Digest, compose_alert, compose_digest};
use crate::structure::{CanonicalMessage, escape_html};

const MAX_SLUG_CHARS: usize = 60;

/// Writes one `.html` file per delivery or alert.
///
/// Each file starts with a `<!-- subject: ... -->` line followed by the
/// digest markup.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, label: &str, digest: &Digest) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stamp = timestamp(OffsetDateTime::now_utc())?;
        let path = self.dir.join(format!("{stamp}-{}.html", slug(label)));
        let content = format!("<!-- subject: {} -->\n{}\n", escape_html(&digest.subject), digest.html);
        fs::write(&path, content)?;

        info!(path = %path.display(), "wrote digest to outbox");
        Ok(path)
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn deliver(&self, thread_title: &str, messages: &[CanonicalMessage]) -> Result<()> {
        self.write(thread_title, &compose_digest(thread_title, messages)).map(|_| ())
    }

    async fn alert(&self, subject: &str, diagnostic: &str) -> Result<()> {
        self.write(subject, &compose_alert(subject, diagnostic)).map(|_| ())
    }
}

/// UTC timestamp that sorts lexically, down to nanoseconds.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second].[subsecond digits:9]");

fn timestamp(at: OffsetDateTime) -> Result<String> {
    at.format(TIMESTAMP_FORMAT)
        .map_err(|e| ThreadwatchError::NotifyError(format!("cannot format outbox timestamp: {e}")))
}

/// File-name-safe form of a thread title.
fn slug(title: &str) -> String {
    let mut slug = String::new();
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    if slug.is_empty() { "thread".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{MessageKind, StyledBlock};
    use crate::threads::ThreadStyle;
    use tempfile::TempDir;
    use time::macros::datetime;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Release Updates: v2!"), "release-updates-v2");
        assert_eq!(slug("עדכונים שוטפים"), "עדכונים-שוטפים");
        assert_eq!(slug("///"), "thread");
    }

    #[test]
    fn test_timestamp_sorts_lexically() {
        let at = datetime!(2026-10-19 08:05:03 UTC).replace_nanosecond(42).unwrap();
        assert_eq!(timestamp(at).unwrap(), "20261019T080503.000000042");

        let later = datetime!(2026-10-19 10:00:00 UTC);
        assert!(timestamp(at).unwrap() < timestamp(later).unwrap());
    }

    #[tokio::test]
    async fn test_deliver_writes_digest() {
        let tmp = TempDir::new().unwrap();
        let outbox = OutboxNotifier::new(tmp.path().join("outbox"));
        let message = CanonicalMessage::from_blocks(
            MessageKind::Standalone,
            vec![StyledBlock::Body { text: "hello".to_string() }],
            &ThreadStyle::default(),
        )
        .unwrap();

        outbox.deliver("Updates", &[message]).await.unwrap();

        let files: Vec<_> = fs::read_dir(outbox.dir()).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(files.len(), 1);

        let name = files[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("-updates.html"));

        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.starts_with("<!-- subject: 📬 New messages in thread Updates -->"));
        assert!(content.contains("hello"));
    }

    #[tokio::test]
    async fn test_alert_writes_file() {
        let tmp = TempDir::new().unwrap();
        let outbox = OutboxNotifier::new(tmp.path());

        outbox.alert("Thread configuration", "thread list is empty").await.unwrap();

        let count = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(count, 1);
    }
}
