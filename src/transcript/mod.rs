//! WhatsApp text transcript parser.
//!
//! The format is line-oriented. A line that matches the
//! [header rule](header::match_header) starts a new message; every other
//! line continues the previous message, with line breaks kept. Lines before
//! the first header have nothing to attach to and are dropped (reported as
//! [`ImportWarning::MalformedHeaderLine`]).
//!
//! # Example
//!
//! ```rust
//! use chatvault::transcript::parse_transcript;
//!
//! let text = "1/2/23, 9:00 AM - Alice: Hello\n\
//!             1/2/23, 9:01 AM - Bob: Hi\n\
//!             second line";
//! let messages = parse_transcript(text);
//!
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[1].content, "Hi\nsecond line");
//! ```

pub mod header;

use log::debug;

use crate::Message;
use crate::config::TranscriptConfig;
use crate::error::ImportWarning;

pub use header::{DateOrder, detect_date_order, match_header, parse_timestamp};

/// Result of parsing one transcript.
#[derive(Debug, Clone, Default)]
pub struct ParsedTranscript {
    /// Messages in source order.
    pub messages: Vec<Message>,
    /// Date order used to fill `sent_at`, if one could be detected.
    pub date_order: Option<DateOrder>,
    /// Lines that were dropped.
    pub warnings: Vec<ImportWarning>,
}

/// Parser for WhatsApp text exports.
///
/// # Example
///
/// ```rust
/// use chatvault::transcript::TranscriptParser;
///
/// let parser = TranscriptParser::new();
/// let parsed = parser.parse_detailed("preamble\n[1/2/23, 9:00:00 AM] Alice: Hi");
/// assert_eq!(parsed.messages.len(), 1);
/// assert_eq!(parsed.warnings.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranscriptParser {
    config: TranscriptConfig,
}

impl TranscriptParser {
    /// Creates a new parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with custom configuration.
    pub fn with_config(config: TranscriptConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &TranscriptConfig {
        &self.config
    }

    /// Parses a transcript into messages. Never fails; an empty or
    /// header-less document yields no messages.
    pub fn parse(&self, text: &str) -> Vec<Message> {
        self.parse_detailed(text).messages
    }

    /// Parses a transcript and reports dropped lines and the detected date order.
    pub fn parse_detailed(&self, text: &str) -> ParsedTranscript {
        let text = if self.config.strip_bom {
            text.strip_prefix('\u{FEFF}').unwrap_or(text)
        } else {
            text
        };

        let limit = match self.config.max_lines {
            0 => usize::MAX,
            n => n,
        };

        let mut messages: Vec<Message> = Vec::new();
        let mut warnings = Vec::new();

        for (index, line) in text.lines().take(limit).enumerate() {
            if let Some(header) = match_header(line) {
                messages.push(Message::new(header.author, header.timestamp, header.content));
            } else if let Some(last) = messages.last_mut() {
                // Continuation of previous message (multiline)
                last.content.push('\n');
                last.content.push_str(line);
            } else if !line.trim().is_empty() {
                debug!("dropping line {} before first message header", index + 1);
                warnings.push(ImportWarning::MalformedHeaderLine { line: index + 1 });
            }
        }

        let date_order = detect_date_order(messages.iter().map(|m| m.timestamp.as_str()));
        if let Some(order) = date_order {
            for msg in &mut messages {
                msg.sent_at = parse_timestamp(&msg.timestamp, order);
            }
        }

        ParsedTranscript {
            messages,
            date_order,
            warnings,
        }
    }
}

/// Parses a transcript with the default configuration.
pub fn parse_transcript(text: &str) -> Vec<Message> {
    TranscriptParser::new().parse(text)
}

/// Writes messages back in the Android header layout, one
/// `"{timestamp} - {author}: {content}"` record per message, each ending in
/// a newline.
///
/// For messages produced by the parser, parsing the output again yields the
/// same messages.
///
/// # Example
///
/// ```rust
/// use chatvault::Message;
/// use chatvault::transcript::{parse_transcript, to_transcript};
///
/// let messages = parse_transcript("[1/2/23, 9:00:00 AM] Alice: Hi\nthere");
/// let text = to_transcript(&messages);
/// assert_eq!(text, "1/2/23, 9:00:00 AM - Alice: Hi\nthere\n");
/// assert_eq!(parse_transcript(&text), messages);
/// ```
pub fn to_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(&msg.timestamp);
        out.push_str(" - ");
        out.push_str(&msg.author);
        out.push_str(": ");
        out.push_str(&msg.content);
        out.push('\n');
    }
    out
}
