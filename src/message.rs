//! Message type produced by the transcript parser.
//!
//! This module provides [`Message`], one line/event of a chat, together with
//! the optional [`Media`] attachment the resolver fills in.
//!
//! # Overview
//!
//! A message consists of:
//! - **Identity**: `author`, `timestamp` (raw, as exported) and `content`
//! - **Derived**: `sent_at` (timestamp parsed opportunistically) and `media`
//!
//! Two messages are the same message iff author, content and raw timestamp
//! are byte-for-byte equal. See [`Message::key`].
//!
//! # Examples
//!
//! ```
//! use chatvault::Message;
//!
//! let msg = Message::new("Alice", "1/2/23, 9:00 AM", "Hello");
//! assert_eq!(msg.author(), "Alice");
//! assert_eq!(msg.timestamp(), "1/2/23, 9:00 AM");
//! assert!(msg.media().is_none());
//! ```

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single chat message.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `author` | `String` | Display name exactly as written in the export |
/// | `timestamp` | `String` | Timestamp text exactly as written in the export |
/// | `content` | `String` | Body, continuation lines joined with `\n` |
/// | `sent_at` | `Option<NaiveDateTime>` | Parsed timestamp, when recognizable |
/// | `media` | `Option<Media>` | Resolved attachment |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Display name of the author as written in the export.
    pub author: String,

    /// Original timestamp string. Its format varies by locale and is never
    /// normalized.
    pub timestamp: String,

    /// Message body with attachment markers and system text intact.
    pub content: String,

    /// Timestamp parsed for grouping and display. Not part of identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sent_at: Option<NaiveDateTime>,

    /// Attachment metadata, when the message references one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub media: Option<Media>,
}

/// Identity tuple of a message, borrowed from it.
///
/// Used as the dedup key by the merge engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey<'a> {
    pub author: &'a str,
    pub content: &'a str,
    pub timestamp: &'a str,
}

impl Message {
    /// Creates a message without media or parsed timestamp.
    pub fn new(
        author: impl Into<String>,
        timestamp: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            timestamp: timestamp.into(),
            content: content.into(),
            sent_at: None,
            media: None,
        }
    }

    /// Builder method to set the parsed timestamp.
    #[must_use]
    pub fn with_sent_at(mut self, sent_at: NaiveDateTime) -> Self {
        self.sent_at = Some(sent_at);
        self
    }

    /// Builder method to attach media.
    #[must_use]
    pub fn with_media(mut self, media: Media) -> Self {
        self.media = Some(media);
        self
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sent_at(&self) -> Option<NaiveDateTime> {
        self.sent_at
    }

    pub fn media(&self) -> Option<&Media> {
        self.media.as_ref()
    }

    /// Returns the identity tuple `(author, content, timestamp)`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chatvault::Message;
    ///
    /// let a = Message::new("Alice", "1/2/23, 9:00 AM", "Hi");
    /// let b = Message::new("Alice", "1/2/23, 9:00 AM", "Hi");
    /// assert_eq!(a.key(), b.key());
    /// ```
    pub fn key(&self) -> MessageKey<'_> {
        MessageKey {
            author: &self.author,
            content: &self.content,
            timestamp: &self.timestamp,
        }
    }

    /// Returns `true` if both messages have the same identity tuple.
    ///
    /// Unlike `==`, this ignores `sent_at` and `media`.
    pub fn is_same(&self, other: &Message) -> bool {
        self.key() == other.key()
    }
}

/// Media category, decided by file extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Pdf,
    File,
}

impl MediaKind {
    /// Classifies a file name by its extension (case-insensitive).
    ///
    /// | Extensions | Kind |
    /// |------------|------|
    /// | png, jpg, jpeg, gif, webp | Image |
    /// | mp4, webm, mov, m4v | Video |
    /// | mp3, wav, ogg, m4a | Audio |
    /// | pdf | Pdf |
    /// | anything else | File |
    ///
    /// # Example
    ///
    /// ```rust
    /// use chatvault::message::MediaKind;
    ///
    /// assert_eq!(MediaKind::from_file_name("IMG-001.JPG"), MediaKind::Image);
    /// assert_eq!(MediaKind::from_file_name("notes.docx"), MediaKind::File);
    /// ```
    pub fn from_file_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" => MediaKind::Image,
            "mp4" | "webm" | "mov" | "m4v" => MediaKind::Video,
            "mp3" | "wav" | "ogg" | "m4a" => MediaKind::Audio,
            "pdf" => MediaKind::Pdf,
            _ => MediaKind::File,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Pdf => "pdf",
            MediaKind::File => "file",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attachment metadata of a message.
///
/// `url` is `None` when the referenced file is absent from the archive, so
/// the UI can show "expected but missing" instead of nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub name: String,
    pub url: Option<String>,
}

impl Media {
    /// Creates media metadata for a file found in the archive.
    pub fn resolved(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: MediaKind::from_file_name(&name),
            name,
            url: Some(url.into()),
        }
    }

    /// Creates media metadata for a referenced file that is not available.
    pub fn missing(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: MediaKind::from_file_name(&name),
            name,
            url: None,
        }
    }

    /// Placeholder for the export's generic "attachment omitted" marker.
    pub fn omitted() -> Self {
        Self {
            kind: MediaKind::File,
            name: "attachment".to_string(),
            url: None,
        }
    }

    /// Returns `true` if a fetchable reference is available.
    pub fn is_available(&self) -> bool {
        self.url.is_some()
    }
}
