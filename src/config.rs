//! Configuration types for parsing and importing.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies.
//!
//! - [`TranscriptConfig`] - transcript parser settings
//! - [`ImportConfig`] - import pipeline settings (current user, media handling)
//!
//! # Example
//!
//! ```rust
//! use chatvault::config::{ImportConfig, MediaMode};
//!
//! let config = ImportConfig::new()
//!     .with_current_user("Me")
//!     .with_media_mode(MediaMode::Reference);
//! assert_eq!(config.current_user.as_deref(), Some("Me"));
//! ```

use serde::{Deserialize, Serialize};

use crate::chat::PARTICIPANT_DISPLAY_LIMIT;

/// Configuration for the transcript parser.
///
/// # Example
///
/// ```rust
/// use chatvault::config::TranscriptConfig;
///
/// let config = TranscriptConfig::new().with_max_lines(10_000);
/// assert_eq!(config.max_lines, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Stop after this many lines; 0 means unlimited (default: 0)
    pub max_lines: usize,

    /// Strip a leading byte-order mark (default: true)
    pub strip_bom: bool,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            max_lines: 0,
            strip_bom: true,
        }
    }
}

impl TranscriptConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the line limit (0 = unlimited).
    #[must_use]
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Sets whether a leading BOM is removed.
    #[must_use]
    pub fn with_strip_bom(mut self, strip: bool) -> Self {
        self.strip_bom = strip;
        self
    }
}

/// How resolved attachments are exposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// Load bytes into a [`MediaStore`](crate::media::MediaStore) and expose
    /// `blob:<uuid>` URLs (default)
    #[default]
    Embed,

    /// Do not load bytes; expose `zip:<archive>!<entry>` handles into the archive
    Reference,
}

/// Configuration for archive import.
///
/// # Example
///
/// ```rust
/// use chatvault::config::ImportConfig;
///
/// let config = ImportConfig::new()
///     .with_current_user("Alice")
///     .with_participant_display_limit(3);
/// assert_eq!(config.participant_display_limit, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Display name of the current user, excluded when naming new chats
    /// (default: none)
    pub current_user: Option<String>,

    /// Participants shown in summaries (default: 5)
    pub participant_display_limit: usize,

    /// Attachment handling (default: embed)
    pub media: MediaMode,

    /// Parser settings
    pub transcript: TranscriptConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            current_user: None,
            participant_display_limit: PARTICIPANT_DISPLAY_LIMIT,
            media: MediaMode::default(),
            transcript: TranscriptConfig::default(),
        }
    }
}

impl ImportConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current user's display name. Blank names are ignored.
    #[must_use]
    pub fn with_current_user(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.current_user = if name.trim().is_empty() { None } else { Some(name) };
        self
    }

    /// Sets how many participants summaries show.
    #[must_use]
    pub fn with_participant_display_limit(mut self, limit: usize) -> Self {
        self.participant_display_limit = limit;
        self
    }

    /// Sets the attachment handling mode.
    #[must_use]
    pub fn with_media_mode(mut self, mode: MediaMode) -> Self {
        self.media = mode;
        self
    }

    /// Sets the parser configuration.
    #[must_use]
    pub fn with_transcript(mut self, transcript: TranscriptConfig) -> Self {
        self.transcript = transcript;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_config_defaults() {
        let config = TranscriptConfig::default();
        assert_eq!(config.max_lines, 0);
        assert!(config.strip_bom);
    }

    #[test]
    fn test_import_config_defaults() {
        let config = ImportConfig::default();
        assert!(config.current_user.is_none());
        assert_eq!(config.participant_display_limit, 5);
        assert_eq!(config.media, MediaMode::Embed);
    }

    #[test]
    fn test_blank_current_user_is_ignored() {
        let config = ImportConfig::new().with_current_user("   ");
        assert!(config.current_user.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let config = ImportConfig::new()
            .with_current_user("Me")
            .with_media_mode(MediaMode::Reference)
            .with_transcript(TranscriptConfig::new().with_strip_bom(false));
        assert_eq!(config.current_user.as_deref(), Some("Me"));
        assert_eq!(config.media, MediaMode::Reference);
        assert!(!config.transcript.strip_bom);
    }

    #[test]
    fn test_config_serde_with_missing_fields() {
        let config: ImportConfig = serde_json::from_str(r#"{"current_user":"Me"}"#).unwrap();
        assert_eq!(config.current_user.as_deref(), Some("Me"));
        assert_eq!(config.participant_display_limit, 5);

        let mode: MediaMode = serde_json::from_str(r#""reference""#).unwrap();
        assert_eq!(mode, MediaMode::Reference);
    }
}
