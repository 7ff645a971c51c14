//! Seen-message store.
//!
//! Persists the ids of messages that were already delivered, one hex id per
//! line, oldest first. The file is rewritten whole on every update (via a
//! sibling temp file and a rename), so an interrupted run leaves the previous
//! complete state behind.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::Result;
use crate::structure::CanonicalMessage;

/// Default number of ids retained.
pub const MAX_STORED_MESSAGES: usize = 5000;

/// Content-hash identity of a [`CanonicalMessage`]: lowercase hex SHA-256 of
/// its rendered markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Hashes the rendered markup of `message`.
    pub fn of(message: &CanonicalMessage) -> Self {
        Self::of_text(message.html())
    }

    /// Hashes arbitrary rendered text.
    pub fn of_text(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounded, persisted history of delivered message ids.
#[derive(Debug, Clone)]
pub struct SeenMessageStore {
    path: PathBuf,
    max_entries: usize,
}

impl SeenMessageStore {
    /// A store backed by `path`, keeping at most [`MAX_STORED_MESSAGES`] ids.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_capacity(path, MAX_STORED_MESSAGES)
    }

    /// A store backed by `path`, keeping at most `max_entries` ids.
    pub fn with_capacity<P: AsRef<Path>>(path: P, max_entries: usize) -> Self {
        Self { path: path.as_ref().to_path_buf(), max_entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Reads the persisted ids, oldest first.
    ///
    /// A missing file is an empty history. Any other read failure is logged
    /// and also treated as an empty history.
    pub fn load(&self) -> Vec<MessageId> {
        match fs::read_to_string(&self.path) {
            Ok(content) => parse_ids(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no seen-message store yet");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read seen-message store, assuming empty history");
                Vec::new()
            }
        }
    }

    /// Keeps the candidates whose id is not in the persisted history.
    ///
    /// Novelty is judged against the history as it was before this batch, so
    /// identical messages appearing twice in the same poll are both returned.
    pub fn filter_new(&self, candidates: Vec<CanonicalMessage>) -> Vec<CanonicalMessage> {
        let seen: HashSet<MessageId> = self.load().into_iter().collect();
        retain_unseen(&seen, candidates)
    }

    /// Appends the ids of `messages` and rewrites the store.
    ///
    /// Returns the number of ids actually added.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ThreadwatchError::StoreError`] if the file cannot be
    /// written; the previous file is left untouched in that case.
    pub fn record(&self, messages: &[CanonicalMessage]) -> Result<usize> {
        let existing = self.load();
        let incoming: Vec<MessageId> = messages.iter().map(MessageId::of).collect();

        let known: HashSet<&MessageId> = existing.iter().collect();
        let added = incoming
            .iter()
            .filter(|id| !known.contains(id))
            .collect::<HashSet<_>>()
            .len();

        let ids = merge_ids(existing, incoming, self.max_entries);

        self.write(&ids)?;
        debug!(added, stored = ids.len(), "recorded message ids");
        Ok(added)
    }

    fn write(&self, ids: &[MessageId]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut content = String::with_capacity(ids.len() * 65);
        for id in ids {
            content.push_str(id.as_str());
            content.push('\n');
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Parses one id per line, skipping blanks.
fn parse_ids(content: &str) -> Vec<MessageId> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| MessageId(line.to_string()))
        .collect()
}

/// Order-preserving novelty filter against a snapshot of seen ids.
pub fn retain_unseen(seen: &HashSet<MessageId>, candidates: Vec<CanonicalMessage>) -> Vec<CanonicalMessage> {
    candidates
        .into_iter()
        .filter(|message| !seen.contains(&MessageId::of(message)))
        .collect()
}

/// Drops repeated ids (first occurrence wins), appends ids not yet present,
/// then keeps only the newest `max_entries`.
pub fn merge_ids(
    existing: Vec<MessageId>, incoming: impl IntoIterator<Item = MessageId>, max_entries: usize,
) -> Vec<MessageId> {
    let mut present = HashSet::new();
    let mut ids: Vec<MessageId> = existing.into_iter().filter(|id| present.insert(id.clone())).collect();

    for id in incoming {
        if present.insert(id.clone()) {
            ids.push(id);
        }
    }

    let start = ids.len().saturating_sub(max_entries);
    ids.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{MessageKind, StyledBlock};
    use crate::threads::ThreadStyle;
    use tempfile::TempDir;

    fn message(text: &str) -> CanonicalMessage {
        CanonicalMessage::from_blocks(
            MessageKind::Standalone,
            vec![StyledBlock::Body { text: text.to_string() }],
            &ThreadStyle::default(),
        )
        .unwrap()
    }

    fn id(n: usize) -> MessageId {
        MessageId::of_text(&n.to_string())
    }

    #[test]
    fn test_message_id_is_stable_and_content_sensitive() {
        let a = MessageId::of_text("hello");
        assert_eq!(a, MessageId::of_text("hello"));
        assert_ne!(a, MessageId::of_text("hellO"));
        assert_eq!(a.as_str(), "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_missing_store_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SeenMessageStore::new(tmp.path().join("last.txt"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_unreadable_store_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SeenMessageStore::new(tmp.path());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_filter_then_record() {
        let tmp = TempDir::new().unwrap();
        let store = SeenMessageStore::new(tmp.path().join("last.txt"));
        let (old, new) = (message("old"), message("new"));

        store.record(std::slice::from_ref(&old)).unwrap();
        let fresh = store.filter_new(vec![old.clone(), new.clone()]);
        assert_eq!(fresh, vec![new.clone()]);

        store.record(&fresh).unwrap();
        assert_eq!(store.load(), vec![MessageId::of(&old), MessageId::of(&new)]);
        assert!(store.filter_new(vec![old, new]).is_empty());
    }

    #[test]
    fn test_intra_batch_duplicates_both_pass_filter() {
        let tmp = TempDir::new().unwrap();
        let store = SeenMessageStore::new(tmp.path().join("last.txt"));
        let dup = message("same");

        let fresh = store.filter_new(vec![dup.clone(), dup.clone()]);
        assert_eq!(fresh.len(), 2);

        assert_eq!(store.record(&fresh).unwrap(), 1);
        assert_eq!(store.load(), vec![MessageId::of(&dup)]);
    }

    #[test]
    fn test_record_is_bounded_oldest_first() {
        let tmp = TempDir::new().unwrap();
        let store = SeenMessageStore::with_capacity(tmp.path().join("last.txt"), 3);
        let messages: Vec<_> = (0..5).map(|n| message(&n.to_string())).collect();

        store.record(&messages).unwrap();
        let ids = store.load();

        assert_eq!(ids.len(), 3);
        assert_eq!(ids, messages[2..].iter().map(MessageId::of).collect::<Vec<_>>());
    }

    #[test]
    fn test_record_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = SeenMessageStore::new(tmp.path().join("state").join("last.txt"));

        store.record(&[message("x")]).unwrap();
        assert_eq!(store.load().len(), 1);
        assert!(!tmp.path().join("state").join("last.txt.tmp").exists());
    }

    #[test]
    fn test_merge_ids_skips_present_and_truncates() {
        let merged = merge_ids(vec![id(1), id(2)], vec![id(2), id(3), id(3), id(4)], 3);
        assert_eq!(merged, vec![id(2), id(3), id(4)]);
    }

    #[test]
    fn test_merge_ids_collapses_existing_duplicates() {
        let merged = merge_ids(vec![id(1), id(2), id(1)], vec![id(3)], 10);
        assert_eq!(merged, vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn test_record_repairs_duplicated_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("last.txt");
        let a = MessageId::of_text("a");
        fs::write(&path, format!("{a}\n{a}\n")).unwrap();

        let store = SeenMessageStore::new(&path);
        assert_eq!(store.record(&[]).unwrap(), 0);
        assert_eq!(store.load(), vec![a]);
    }

    #[test]
    fn test_merge_ids_default_capacity() {
        let existing: Vec<_> = (0..MAX_STORED_MESSAGES).map(id).collect();
        let merged = merge_ids(existing, vec![id(MAX_STORED_MESSAGES)], MAX_STORED_MESSAGES);

        assert_eq!(merged.len(), MAX_STORED_MESSAGES);
        assert_eq!(merged[0], id(1));
        assert_eq!(merged.last(), Some(&id(MAX_STORED_MESSAGES)));
    }
}
