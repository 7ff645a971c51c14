//! Thread list configuration.
//!
//! The job reads its targets from a line-oriented file:
//!
//! ```text
//! # title | url | plain background | reply background | spoiler background
//! Release updates | https://forum.example/threads/updates.123 | #eafaf1 | #e6f4ff | #fdedec
//! ```
//!
//! Malformed lines are skipped without complaint; an empty result is the
//! caller's signal that the configuration is unusable.

use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::{Result, ThreadwatchError};

/// Number of `|`-separated fields a thread line must carry.
const FIELD_COUNT: usize = 5;

/// Background colours used when rendering a thread's messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadStyle {
    /// Standalone posts and reply bodies.
    pub message: String,
    /// Quoted sections.
    pub reply: String,
    /// Spoiler sections.
    pub spoiler: String,
}

impl Default for ThreadStyle {
    fn default() -> Self {
        Self { message: "#eafaf1".to_string(), reply: "#e6f4ff".to_string(), spoiler: "#fdedec".to_string() }
    }
}

/// A monitored thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadTarget {
    /// Display title, used in notifications.
    pub title: String,
    /// Thread URL without a page suffix.
    pub url: String,
    pub style: ThreadStyle,
}

impl ThreadTarget {
    /// Parses one configuration line, or `None` if it is not a thread line.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || !line.contains('|') {
            return None;
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() < FIELD_COUNT {
            return None;
        }

        let (title, url) = (fields[0], fields[1]);
        if title.is_empty() || url.is_empty() {
            return None;
        }

        Some(Self {
            title: title.to_string(),
            url: url.to_string(),
            style: ThreadStyle {
                message: fields[2].to_string(),
                reply: fields[3].to_string(),
                spoiler: fields[4].to_string(),
            },
        })
    }
}

/// Thread list parser
#[derive(Debug)]
pub struct ThreadListParser;

impl ThreadListParser {
    /// Parse a thread list file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<ThreadTarget>> {
        let file = std::fs::File::open(&path).map_err(|e| {
            ThreadwatchError::ConfigError(format!("Cannot open thread list {}: {}", path.as_ref().display(), e))
        })?;

        let reader = BufReader::new(file);
        Self::parse_reader(reader)
    }

    /// Parse a thread list from a reader
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<ThreadTarget>> {
        let mut targets = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| ThreadwatchError::ConfigError(format!("Read error at line {}: {}", index + 1, e)))?;

            match ThreadTarget::parse_line(&line) {
                Some(target) => targets.push(target),
                None => debug!(line = index + 1, "skipping thread list line"),
            }
        }

        Ok(targets)
    }

    /// Parse a thread list from a string
    pub fn parse_string(content: &str) -> Vec<ThreadTarget> {
        content.lines().filter_map(ThreadTarget::parse_line).collect()
    }
}
