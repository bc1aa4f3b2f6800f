//! # Chatvault
//!
//! A Rust library for importing WhatsApp chat exports (ZIP archives) into a
//! deduplicated chat library that grows incrementally with every export.
//!
//! ## Overview
//!
//! An export archive holds one or more text transcripts plus the media
//! files they mention. Importing one:
//!
//! - parses each transcript into [`Message`]s (iOS bracketed and Android
//!   dashed header layouts, multi-line bodies)
//! - resolves attachment references against the archive's files
//! - matches each transcript to a known [`Chat`](chat::Chat) by its set of
//!   participants and appends only messages not seen before
//! - gives new chats a readable, unique name
//!
//! Re-importing the same archive is a no-op; importing a later export of
//! the same conversation only adds the new tail.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatvault::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let library = ChatLibrary::load("chatvault.json")?;
//!     let config = ImportConfig::new().with_current_user("Me");
//!
//!     let result = import_file("WhatsApp Chat - Alice.zip", &library, &config)?;
//!     for warning in result.stats.warnings() {
//!         eprintln!("warning: {warning}");
//!     }
//!
//!     result.library.save("chatvault.json")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Parsing Only
//!
//! ```rust
//! use chatvault::transcript::parse_transcript;
//!
//! let messages = parse_transcript("[1/2/23, 9:00:00 AM] Alice: Hi\n[1/2/23, 9:01:00 AM] Bob: Yo");
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[1].author, "Bob");
//! ```
//!
//! ## Module Structure
//!
//! - [`transcript`] - Transcript parser ([`TranscriptParser`](transcript::TranscriptParser))
//! - [`media`] - Attachment resolution and the blob store
//! - [`core`] - Identity, merge, naming, the [`ChatLibrary`](core::ChatLibrary) and message queries
//! - [`import`] - The archive import pipeline ([`import_archive`](import::import_archive))
//! - [`config`] - Import and parser configuration
//! - [`error`] - Error and warning types ([`ChatvaultError`], [`Result`])
//! - [`prelude`] - Convenient re-exports

pub mod chat;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod import;
pub mod media;
pub mod message;
pub mod transcript;

// Re-export the main types at the crate root for convenience
pub use error::{ChatvaultError, Result};
pub use message::Message;

/// Convenient re-exports for common usage.
///
/// Import everything you need with a single line:
///
/// ```rust
/// use chatvault::prelude::*;
/// ```
pub mod prelude {
    // Data model
    pub use crate::Message;
    pub use crate::chat::{Chat, ChatId};
    pub use crate::message::{Media, MediaKind};

    // Error types
    pub use crate::error::{ChatvaultError, ImportWarning, Result};

    // Configuration
    pub use crate::config::{ImportConfig, MediaMode, TranscriptConfig};

    // Parsing
    pub use crate::transcript::{TranscriptParser, parse_transcript, to_transcript};

    // Library and queries
    pub use crate::core::filter::{MessagePage, MessageQuery};
    pub use crate::core::library::{ChatLibrary, ChatSummary};

    // Import
    pub use crate::import::{
        ImportResult, ImportStats, ImportStatus, import_archive, import_file, import_reader,
    };
    pub use crate::media::MediaStore;
}
