//! Unified error types for chatvault.
//!
//! This module provides a single [`ChatvaultError`] enum for every fatal
//! failure in the library, plus [`ImportWarning`] for the conditions the
//! import pipeline recovers from locally.
//!
//! # Error Handling Philosophy
//!
//! - **Fatal** problems (no transcript in the archive, corrupt ZIP, unknown
//!   chat id) are returned as `Err(ChatvaultError)`
//! - **Recoverable** problems (orphan lines, missing attachments, lost merge
//!   anchor) never abort an import; they are collected as [`ImportWarning`]s
//! - A broken entry inside an otherwise readable archive only fails that
//!   entry, see [`TranscriptFailure`](crate::import::TranscriptFailure)

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A specialized [`Result`] type for chatvault operations.
///
/// # Example
///
/// ```rust
/// use chatvault::error::Result;
/// use chatvault::Message;
///
/// fn my_function() -> Result<Vec<Message>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatvaultError>;

/// The error type for all chatvault operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatvaultError {
    /// An I/O error occurred.
    ///
    /// Typically raised when reading an archive from disk or saving the
    /// library file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive could not be opened or one of its entries could not be read.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// JSON parsing/serialization error (library file).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entry content is not valid UTF-8.
    #[error("UTF-8 encoding error in {context}: {source}")]
    Utf8 {
        /// Description of where the error occurred
        context: String,
        /// The underlying UTF-8 error
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The archive contains no recognizable chat transcript.
    ///
    /// Fatal for the whole import. No state change happens.
    #[error("No chat transcript found in archive ({entries} entries scanned)")]
    NoTranscriptFound {
        /// Number of archive entries that were inspected
        entries: usize,
    },

    /// A chat id is not present in the library.
    #[error("Chat not found: {id}")]
    ChatNotFound {
        /// The id that was looked up
        id: String,
    },

    /// Invalid date in a message query.
    ///
    /// Date filters expect YYYY-MM-DD format.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// A message query has out-of-range parameters.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description of what's wrong
        message: String,
    },

    /// A background import task panicked or was cancelled by the runtime.
    #[error("Import task failed: {0}")]
    Task(String),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatvaultError {
    /// Creates a UTF-8 error for an archive entry.
    pub fn utf8(context: impl Into<String>, source: std::string::FromUtf8Error) -> Self {
        ChatvaultError::Utf8 {
            context: context.into(),
            source,
        }
    }

    /// Creates a no-transcript error.
    pub fn no_transcript(entries: usize) -> Self {
        ChatvaultError::NoTranscriptFound { entries }
    }

    /// Creates a chat-not-found error.
    pub fn chat_not_found(id: impl Into<String>) -> Self {
        ChatvaultError::ChatNotFound { id: id.into() }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        ChatvaultError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        ChatvaultError::InvalidQuery {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatvaultError::Io(_))
    }

    /// Returns `true` if the archive itself could not be read.
    pub fn is_archive(&self) -> bool {
        matches!(self, ChatvaultError::Archive(_))
    }

    /// Returns `true` if the archive held no transcript.
    pub fn is_no_transcript(&self) -> bool {
        matches!(self, ChatvaultError::NoTranscriptFound { .. })
    }

    /// Returns `true` if a chat lookup failed.
    pub fn is_chat_not_found(&self) -> bool {
        matches!(self, ChatvaultError::ChatNotFound { .. })
    }

    /// Returns `true` if this is a date-related error.
    pub fn is_invalid_date(&self) -> bool {
        matches!(self, ChatvaultError::InvalidDate { .. })
    }
}

// ============================================================================
// Recovered conditions
// ============================================================================

/// A condition the import pipeline recovered from without failing.
///
/// Warnings are attached to the report of the transcript they occurred in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportWarning {
    /// A non-header line appeared before the first message and was dropped.
    MalformedHeaderLine {
        /// 1-based line number in the transcript
        line: usize,
    },

    /// A message references a file that is not in the archive.
    AttachmentMissing {
        /// Best-guess file name taken from the message
        name: String,
    },

    /// The previous last message of a chat was not found in the new
    /// transcript; new messages were computed by set difference instead.
    MergeAnchorNotFound {
        /// Name of the chat being updated
        chat: String,
    },
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportWarning::MalformedHeaderLine { line } => {
                write!(f, "line {line} has no message header and was dropped")
            }
            ImportWarning::AttachmentMissing { name } => {
                write!(f, "attachment '{name}' is not in the archive")
            }
            ImportWarning::MergeAnchorNotFound { chat } => {
                write!(f, "'{chat}': last stored message not found, deduplicated by content")
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
