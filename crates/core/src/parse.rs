//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing a
//! forum page and walking it structurally: selector queries, parent and
//! ancestor checks, and text extraction that can leave whole subtrees out.
//!
//! # Example
//!
//! ```rust
//! use threadwatch_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <article class="message-body"><div class="bbWrapper">Hello<br>world</div></article>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let bodies = doc.select("div.bbWrapper").unwrap();
//! assert_eq!(bodies[0].text(), "Hello\nworld");
//! ```

use scraper::{ElementRef, Html, Node, Selector};

use crate::{Result, ThreadwatchError};

/// Elements whose boundaries start a new line in extracted text.
const BLOCK_ELEMENTS: [&str; 24] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// Elements whose content never counts as text.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Compiles a CSS selector, mapping failures to [`ThreadwatchError::HtmlParseError`].
pub fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ThreadwatchError::HtmlParseError(format!("Invalid selector {selector:?}: {e}")))
}

/// Represents a parsed HTML document.
///
/// A Document wraps one fetched forum page and provides methods for querying
/// elements using CSS selectors.
///
/// # Example
///
/// ```rust
/// use threadwatch_core::parse::Document;
///
/// let html = "<html><head><title>Thread</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Thread".to_string()));
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// html5ever recovers from malformed markup, so this never fails on
    /// content; the `Result` keeps the signature uniform with the rest of
    /// the pipeline.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Selects elements using a CSS selector string.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadwatchError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile_selector(selector)?;
        Ok(self.select_with(&sel))
    }

    /// Selects elements using a precompiled selector, in document order.
    pub fn select_with(&self, selector: &Selector) -> Vec<Element<'_>> {
        self.html.select(selector).map(Element::new).collect()
    }

    /// Gets the title of the document.
    ///
    /// Returns the content of the `<title>` element if present.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    }
}

/// A wrapper around scraper's ElementRef with the structural predicates the
/// extractor and structurer need.
///
/// # Example
///
/// ```rust
/// use threadwatch_core::parse::Document;
///
/// let html = r#"<blockquote data-quote="Alice">Hi</blockquote>"#;
/// let doc = Document::parse(html).unwrap();
/// let quote = &doc.select("blockquote").unwrap()[0];
///
/// assert_eq!(quote.text(), "Hi");
/// assert_eq!(quote.attr("data-quote"), Some("Alice"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Gets the value of an attribute.
    ///
    /// Returns `None` if the attribute is not present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Whether this element itself matches `selector`.
    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.element)
    }

    /// The immediate parent, if it is an element.
    pub fn parent_element(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::new)
    }

    /// Whether any ancestor (excluding this element) matches `selector`.
    pub fn has_ancestor(&self, selector: &Selector) -> bool {
        self.element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| selector.matches(&ancestor))
    }

    /// First descendant matching `selector`, in document order.
    pub fn select_first(&self, selector: &Selector) -> Option<Element<'a>> {
        self.element.select(selector).next().map(Element::new)
    }

    /// All descendants matching `selector`, in document order.
    pub fn select_all(&self, selector: &Selector) -> Vec<Element<'a>> {
        self.element.select(selector).map(Element::new).collect()
    }

    /// Whether any descendant matches `selector`.
    pub fn contains(&self, selector: &Selector) -> bool {
        self.select_first(selector).is_some()
    }

    /// Normalized text content of this element.
    ///
    /// `<br>` and block boundaries become line breaks, other whitespace runs
    /// collapse to a single space, blank lines are dropped.
    pub fn text(&self) -> String {
        self.text_excluding(&[])
    }

    /// Normalized text content, leaving out the subtrees of `excluded`.
    ///
    /// This is how the structurer "removes" quotes and spoilers without
    /// mutating the parsed document.
    pub fn text_excluding(&self, excluded: &[Element<'_>]) -> String {
        let mut raw = String::new();
        collect_text(self.element, excluded, &mut raw);
        normalize_text(&raw)
    }
}

fn collect_text(element: ElementRef<'_>, skip: &[Element<'_>], out: &mut String) {
    for child in element.children() {
        if skip.iter().any(|excluded| excluded.element.id() == child.id()) {
            continue;
        }

        match child.value() {
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
            }
            Node::Element(el) => {
                let name = el.name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }

                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, skip, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapses whitespace within each line and drops blank lines.
pub fn normalize_text(raw: &str) -> String {
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
