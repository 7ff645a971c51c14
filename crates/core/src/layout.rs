//! Forum page layout: where posts live in the markup and what marks noise.
//!
//! [`SiteLayout`] holds the selectors as plain strings so it can be built
//! from flags or tests; [`CompiledLayout`] is the parsed form the extractor
//! and structurer run against.

use scraper::Selector;

use crate::Result;
use crate::parse::compile_selector;

/// Title of the pinned rules post of the monitored updates threads.
pub const DEFAULT_RULES_MARKER: &str = "כללים למשתתפים באשכול עדכונים זה";

/// Selectors and marker strings for a XenForo-style thread page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    /// Container of one post's rendered BB code.
    pub body: String,
    /// Required immediate parent of `body`.
    pub body_parent: String,
    /// Signature block appended under posts.
    pub signature: String,
    /// Literal text identifying the moderator rules post.
    pub rules_marker: String,
    /// Class used by structured chapter index posts.
    pub chapter_marker: String,
    /// Embedded quote of an earlier post.
    pub quote: String,
    /// Attribute on `quote` naming the quoted author.
    pub quote_author_attr: String,
    /// "Click to expand" control that accompanies a real quote.
    pub expand_control: String,
    /// Collapsible spoiler section.
    pub spoiler: String,
    /// Title element inside a spoiler.
    pub block_title: String,
    /// Content element inside a quote or spoiler.
    pub block_content: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            body: "div.bbWrapper".to_string(),
            body_parent: "article.message-body.js-selectToQuote".to_string(),
            signature: "aside.message-signature".to_string(),
            rules_marker: DEFAULT_RULES_MARKER.to_string(),
            chapter_marker: ".perek".to_string(),
            quote: "blockquote.bbCodeBlock--quote".to_string(),
            quote_author_attr: "data-quote".to_string(),
            expand_control: "div.bbCodeBlock-expandLink".to_string(),
            spoiler: "div.bbCodeBlock.bbCodeBlock--spoiler".to_string(),
            block_title: ".bbCodeBlock-title".to_string(),
            block_content: ".bbCodeBlock-content".to_string(),
        }
    }
}

impl SiteLayout {
    /// Parses every selector once.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ThreadwatchError::HtmlParseError`] naming the first
    /// invalid selector.
    pub fn compile(&self) -> Result<CompiledLayout> {
        Ok(CompiledLayout {
            body: compile_selector(&self.body)?,
            body_parent: compile_selector(&self.body_parent)?,
            signature: compile_selector(&self.signature)?,
            rules_marker: self.rules_marker.clone(),
            chapter_marker: compile_selector(&self.chapter_marker)?,
            quote: compile_selector(&self.quote)?,
            quote_author_attr: self.quote_author_attr.clone(),
            expand_control: compile_selector(&self.expand_control)?,
            spoiler: compile_selector(&self.spoiler)?,
            block_title: compile_selector(&self.block_title)?,
            block_content: compile_selector(&self.block_content)?,
        })
    }
}

/// A [`SiteLayout`] with its selectors parsed.
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    pub body: Selector,
    pub body_parent: Selector,
    pub signature: Selector,
    pub rules_marker: String,
    pub chapter_marker: Selector,
    pub quote: Selector,
    pub quote_author_attr: String,
    pub expand_control: Selector,
    pub spoiler: Selector,
    pub block_title: Selector,
    pub block_content: Selector,
}
