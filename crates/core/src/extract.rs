//! Message block extraction.
//!
//! Scans a parsed thread page for post bodies and drops the ones that are
//! not real messages: signatures, the pinned rules post and chapter index
//! posts. What survives is handed to [`crate::structure`] for rendering.

use tracing::debug;

use crate::Result;
use crate::layout::CompiledLayout;
use crate::parse::{Document, Element};
use crate::structure::{CanonicalMessage, structure_message};
use crate::threads::ThreadStyle;

/// One post body that passed every exclusion filter.
#[derive(Debug, Clone, Copy)]
pub struct MessageCandidate<'a> {
    /// The post body container.
    pub element: Element<'a>,
}

/// Why a body container was not turned into a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The container's parent is not the message-body marker.
    OutsideMessageBody,
    /// The container is inside, or contains, a signature block.
    Signature,
    /// The container's text carries the rules-post marker.
    RulesPost,
    /// The container holds chapter index markup.
    ChapterIndex,
}

/// Applies the exclusion filters, in order, to one body container.
///
/// Returns `None` when the container is a real message.
pub fn rejection(element: &Element<'_>, layout: &CompiledLayout) -> Option<Rejection> {
    let under_body = element
        .parent_element()
        .is_some_and(|parent| parent.matches(&layout.body_parent));
    if !under_body {
        return Some(Rejection::OutsideMessageBody);
    }

    if element.contains(&layout.signature) || element.has_ancestor(&layout.signature) {
        return Some(Rejection::Signature);
    }

    if !layout.rules_marker.is_empty() && element.text().replace('\n', " ").contains(&layout.rules_marker) {
        return Some(Rejection::RulesPost);
    }

    if element.contains(&layout.chapter_marker) {
        return Some(Rejection::ChapterIndex);
    }

    None
}

/// Finds the message candidates of a page, in document order.
pub fn extract_candidates<'a>(doc: &'a Document, layout: &CompiledLayout) -> Vec<MessageCandidate<'a>> {
    let containers = doc.select_with(&layout.body);
    let total = containers.len();

    let candidates: Vec<MessageCandidate<'a>> = containers
        .into_iter()
        .filter(|element| match rejection(element, layout) {
            Some(reason) => {
                debug!(?reason, "skipping body container");
                false
            }
            None => true,
        })
        .map(|element| MessageCandidate { element })
        .collect();

    debug!(total, kept = candidates.len(), "extracted message candidates");
    candidates
}

/// Parses one raw page and renders every candidate on it.
///
/// Candidates that render to nothing are dropped; order follows the page.
pub fn extract_messages(html: &str, layout: &CompiledLayout, style: &ThreadStyle) -> Result<Vec<CanonicalMessage>> {
    let doc = Document::parse(html)?;

    Ok(extract_candidates(&doc, layout)
        .iter()
        .filter_map(|candidate| structure_message(candidate, layout, style))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DEFAULT_RULES_MARKER, SiteLayout};

    fn layout() -> CompiledLayout {
        SiteLayout::default().compile().unwrap()
    }

    fn post(inner: &str) -> String {
        format!(r#"<article class="message-body js-selectToQuote"><div class="bbWrapper">{inner}</div></article>"#)
    }

    fn page(posts: &[String]) -> String {
        format!("<html><body>{}</body></html>", posts.concat())
    }

    fn kept_texts(html: &str) -> Vec<String> {
        let doc = Document::parse(html).unwrap();
        let layout = layout();
        extract_candidates(&doc, &layout).iter().map(|c| c.element.text()).collect()
    }

    #[test]
    fn test_plain_posts_in_document_order() {
        let html = page(&[post("first"), post("second"), post("third")]);
        assert_eq!(kept_texts(&html), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_requires_message_body_parent() {
        let html = page(&[
            r#"<div class="message-body"><div class="bbWrapper">wrong parent</div></div>"#.to_string(),
            r#"<article class="message-body js-selectToQuote"><section><div class="bbWrapper">nested</div></section></article>"#.to_string(),
            post("kept"),
        ]);
        assert_eq!(kept_texts(&html), vec!["kept"]);
    }

    #[test]
    fn test_signature_inside_or_around_is_rejected() {
        let html = page(&[
            post(r#"text <aside class="message-signature">sig</aside>"#),
            r#"<aside class="message-signature"><article class="message-body js-selectToQuote"><div class="bbWrapper">in sig</div></article></aside>"#.to_string(),
            post("kept"),
        ]);
        assert_eq!(kept_texts(&html), vec!["kept"]);
    }

    #[test]
    fn test_rules_post_is_rejected() {
        let html = page(&[post(&format!("<b>{DEFAULT_RULES_MARKER}</b> 1. be nice")), post("kept")]);
        assert_eq!(kept_texts(&html), vec!["kept"]);
    }

    #[test]
    fn test_rules_marker_split_across_lines() {
        let (head, tail) = DEFAULT_RULES_MARKER.split_once(' ').unwrap();
        let html = page(&[
            post(&format!("{head}<br>{tail}")),
            post(&format!("<div>{head}</div><div>{tail}</div>")),
            post("kept"),
        ]);
        assert_eq!(kept_texts(&html), vec!["kept"]);
    }

    #[test]
    fn test_chapter_index_is_rejected() {
        let html = page(&[post(r#"<span class="perek">Chapter 1</span>"#), post("kept")]);
        assert_eq!(kept_texts(&html), vec!["kept"]);
    }

    #[test]
    fn test_rejection_reasons() {
        let html = page(&[post(r#"<div class="perek">x</div>"#)]);
        let doc = Document::parse(&html).unwrap();
        let layout = layout();
        let body = doc.select_with(&layout.body)[0];

        assert_eq!(rejection(&body, &layout), Some(Rejection::ChapterIndex));
    }

    #[test]
    fn test_extract_messages_drops_empty_renders() {
        let html = page(&[post(""), post("hello")]);
        let messages = extract_messages(&html, &layout(), &ThreadStyle::default()).unwrap();

        assert_eq!(messages.len(), 1);
        assert!(messages[0].html().contains("hello"));
    }
}
