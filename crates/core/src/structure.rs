//! Message structuring.
//!
//! Turns a [`MessageCandidate`] into a [`CanonicalMessage`]: the styled
//! markup that is hashed for deduplication and sent to the notifiers.
//!
//! A candidate that carries both a quote block and its expand control is a
//! quote-and-reply; anything else is a standalone post. Spoilers are always
//! rendered separately, after the main content, one block each.

use std::fmt;

use crate::extract::MessageCandidate;
use crate::layout::CompiledLayout;
use crate::parse::Element;
use crate::threads::ThreadStyle;

/// Title used for spoilers that do not carry one.
pub const DEFAULT_SPOILER_TITLE: &str = "Spoiler";

/// How a candidate was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Standalone,
    QuoteReply,
}

/// One rendered section of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyledBlock {
    /// The quoted earlier post.
    Quote { author: String, text: String },
    /// The author's own text under a quote.
    Reply { text: String },
    /// The whole text of a standalone post.
    Body { text: String },
    /// A spoiler section.
    Spoiler { title: String, text: String },
}

impl StyledBlock {
    /// Renders the block as an inline-styled `<div>`.
    pub fn render(&self, style: &ThreadStyle) -> String {
        match self {
            StyledBlock::Quote { author, text } => format!(
                "<div style='border: 1px solid #99d6ff; border-radius: 10px; padding: 10px; margin-bottom: 10px; background: {};'>\
                 🌟 <b>Quote from</b> {}:<br><i>{}</i></div>",
                escape_html(&style.reply),
                escape_html(author),
                text_to_markup(text)
            ),
            StyledBlock::Reply { text } => format!(
                "<div style='border: 1px solid #a9dfbf; border-radius: 10px; padding: 10px; background: {};'>\
                 🗨️ <b>Reply:</b><br>{}</div>",
                escape_html(&style.message),
                text_to_markup(text)
            ),
            StyledBlock::Body { text } => format!(
                "<div style='border: 1px solid #a9dfbf; border-radius: 10px; padding: 10px; background: {};'>{}</div>",
                escape_html(&style.message),
                text_to_markup(text)
            ),
            StyledBlock::Spoiler { title, text } => format!(
                "<div style='margin-top: 10px; background: {}; border: 1px solid #f5b7b1; padding: 10px; border-radius: 10px;'>\
                 🤐 <b>{}:</b><br><span style='color: #333;'>{}</span></div>",
                escape_html(&style.spoiler),
                escape_html(title),
                text_to_markup(text)
            ),
        }
    }
}

/// The rendered form of one post.
///
/// Two messages are the same message iff their rendered markup is
/// byte-identical; `kind` and `blocks` are carried along for callers but do
/// not take part in equality.
#[derive(Debug, Clone)]
pub struct CanonicalMessage {
    kind: MessageKind,
    blocks: Vec<StyledBlock>,
    html: String,
}

impl CanonicalMessage {
    /// Renders `blocks` with `style`; `None` when there is nothing to render.
    pub fn from_blocks(kind: MessageKind, blocks: Vec<StyledBlock>, style: &ThreadStyle) -> Option<Self> {
        if blocks.is_empty() {
            return None;
        }

        let html = blocks.iter().map(|block| block.render(style)).collect();
        Some(Self { kind, blocks, html })
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn blocks(&self) -> &[StyledBlock] {
        &self.blocks
    }

    /// The rendered markup; the unit of identity.
    pub fn html(&self) -> &str {
        &self.html
    }
}

impl PartialEq for CanonicalMessage {
    fn eq(&self, other: &Self) -> bool {
        self.html == other.html
    }
}

impl Eq for CanonicalMessage {}

impl fmt::Display for CanonicalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

/// Classifies and renders one candidate.
pub fn structure_message(
    candidate: &MessageCandidate<'_>, layout: &CompiledLayout, style: &ThreadStyle,
) -> Option<CanonicalMessage> {
    let element = &candidate.element;
    let spoilers = element.select_all(&layout.spoiler);
    let mut blocks = Vec::new();

    let quote = element.select_first(&layout.quote);
    let expand = element.select_first(&layout.expand_control);

    let kind = match (quote, expand) {
        (Some(quote), Some(expand)) => {
            let author = quote.attr(&layout.quote_author_attr).unwrap_or_default().to_string();
            let quoted = quote
                .select_first(&layout.block_content)
                .map(|content| content.text())
                .unwrap_or_default();
            blocks.push(StyledBlock::Quote { author, text: quoted });

            let mut excluded = vec![quote, expand];
            excluded.extend(spoilers.iter().copied());

            let reply = element.text_excluding(&excluded);
            if !reply.is_empty() {
                blocks.push(StyledBlock::Reply { text: reply });
            }
            MessageKind::QuoteReply
        }
        _ => {
            let text = element.text_excluding(&spoilers);
            if !text.is_empty() {
                blocks.push(StyledBlock::Body { text });
            }
            MessageKind::Standalone
        }
    };

    blocks.extend(spoilers.iter().filter_map(|spoiler| spoiler_block(spoiler, layout)));

    CanonicalMessage::from_blocks(kind, blocks, style)
}

fn spoiler_block(spoiler: &Element<'_>, layout: &CompiledLayout) -> Option<StyledBlock> {
    let title = spoiler
        .select_first(&layout.block_title)
        .map(|title| title.text())
        .unwrap_or_else(|| DEFAULT_SPOILER_TITLE.to_string());
    let text = spoiler
        .select_first(&layout.block_content)
        .map(|content| content.text())
        .unwrap_or_default();

    if text.is_empty() { None } else { Some(StyledBlock::Spoiler { title, text }) }
}

/// Escapes text for inclusion in element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn text_to_markup(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}
