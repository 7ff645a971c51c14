//! Digest formatting for notification channels.
//!
//! Messages are already rendered markup; this module wraps a batch of them
//! into an HTML digest (the e-mail body) or flattens them to plain text for
//! channels that cannot show markup.

use crate::structure::{CanonicalMessage, StyledBlock, escape_html};

/// A ready-to-send notification body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub html: String,
}

/// Subject line for a batch of new messages in `thread_title`.
pub fn digest_subject(thread_title: &str) -> String {
    format!("📬 New messages in thread {thread_title}")
}

/// HTML digest of a batch of new messages, one framed block per message.
pub fn compose_digest(thread_title: &str, messages: &[CanonicalMessage]) -> Digest {
    let mut html = String::from("<html><body style='font-family: Arial; direction: rtl;'>");

    for message in messages {
        html.push_str("<div style='border: 1px solid #ccc; border-radius: 10px; padding: 10px; margin-bottom: 15px;'>");
        html.push_str(message.html());
        html.push_str("</div>");
    }

    html.push_str("</body></html>");
    Digest { subject: digest_subject(thread_title), html }
}

/// HTML body for a problem report (bad configuration, unreachable thread).
pub fn compose_alert(subject: &str, diagnostic: &str) -> Digest {
    let html = format!(
        "<html><body style='font-family: Arial; direction: rtl;'>\
         <div style='color: red; font-weight: bold;'>❌ {}</div></body></html>",
        escape_html(diagnostic)
    );
    Digest { subject: subject.to_string(), html }
}

/// Plain-text form of one message, block by block.
pub fn plain_text(message: &CanonicalMessage) -> String {
    message
        .blocks()
        .iter()
        .map(|block| match block {
            StyledBlock::Quote { author, text } => format!("Quote from {author}:\n{text}"),
            StyledBlock::Reply { text } => format!("Reply:\n{text}"),
            StyledBlock::Body { text } => text.clone(),
            StyledBlock::Spoiler { title, text } => format!("{title}:\n{text}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text bullet list of a batch, headed by the thread title.
pub fn plain_digest(thread_title: &str, messages: &[CanonicalMessage]) -> String {
    let mut body = format!("📬 New messages in thread: {thread_title}\n\n");

    for message in messages {
        body.push_str("• ");
        body.push_str(&plain_text(message));
        body.push_str("\n\n");
    }

    body.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::MessageKind;
    use crate::threads::ThreadStyle;

    fn quote_reply() -> CanonicalMessage {
        CanonicalMessage::from_blocks(
            MessageKind::QuoteReply,
            vec![
                StyledBlock::Quote { author: "Alice".to_string(), text: "Hi".to_string() },
                StyledBlock::Reply { text: "Thanks!".to_string() },
                StyledBlock::Spoiler { title: "S1".to_string(), text: "secret".to_string() },
            ],
            &ThreadStyle::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_compose_digest() {
        let message = quote_reply();
        let digest = compose_digest("Updates", std::slice::from_ref(&message));

        assert_eq!(digest.subject, "📬 New messages in thread Updates");
        assert!(digest.html.starts_with("<html><body"));
        assert!(digest.html.contains(message.html()));
        assert!(digest.html.ends_with("</body></html>"));
    }

    #[test]
    fn test_compose_alert_escapes() {
        let digest = compose_alert("Thread configuration", "bad <file>");
        assert_eq!(digest.subject, "Thread configuration");
        assert!(digest.html.contains("bad &lt;file&gt;"));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text(&quote_reply()), "Quote from Alice:\nHi\nReply:\nThanks!\nS1:\nsecret");
    }

    #[test]
    fn test_plain_digest() {
        let body = plain_digest("Updates", &[quote_reply()]);

        assert!(body.starts_with("📬 New messages in thread: Updates\n\n• Quote from Alice:"));
        assert!(!body.contains('<'));
        assert!(body.ends_with("secret"));
    }
}
