//! Import pipeline for ZIP chat exports.
//!
//! [`import_archive`] runs one archive end to end:
//!
//! 1. list entries, splitting transcripts from media files
//! 2. for each transcript, in archive order: parse, resolve attachments,
//!    merge into the known chats
//! 3. build the next [`ChatLibrary`] from all changes
//!
//! The function is pure with respect to its inputs: the given library is
//! never mutated and a new one is returned in [`ImportResult`]. A transcript
//! that cannot be read is recorded in [`ImportStats::failures`] and the
//! remaining transcripts are still imported.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatvault::prelude::*;
//!
//! # fn main() -> chatvault::Result<()> {
//! let library = ChatLibrary::load("chatvault.json")?;
//! let config = ImportConfig::new().with_current_user("Me");
//!
//! let result = import_file("WhatsApp Chat.zip", &library, &config)?;
//! println!(
//!     "added {}, updated {}, skipped {}",
//!     result.stats.added, result.stats.updated, result.stats.skipped
//! );
//! result.library.save("chatvault.json")?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
#[cfg(feature = "async")]
pub mod async_import;

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::chat::{Chat, ChatId};
use crate::config::{ImportConfig, MediaMode};
use crate::core::library::{ChatChanges, ChatLibrary};
use crate::core::merge::{MergeOutcome, MergeStrategy, merge_chat};
use crate::core::naming::source_base_name;
use crate::error::{ChatvaultError, ImportWarning, Result};
use crate::media::{MediaIndex, MediaStore, ReferenceLoader, resolve_attachments};
use crate::transcript::TranscriptParser;

pub use archive::{ArchiveListing, ChatArchive, EmbedLoader};
#[cfg(feature = "async")]
pub use async_import::{import_archive_async, import_file_async};

/// What happened to one transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TranscriptOutcome {
    Added { chat_id: ChatId, name: String },
    Updated { chat_id: ChatId, name: String, added: usize },
    Skipped { chat_id: ChatId, name: String },
    /// The transcript contained no messages; nothing was created.
    Empty,
}

/// Per-transcript report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptReport {
    pub entry: String,
    #[serde(flatten)]
    pub outcome: TranscriptOutcome,
    /// Messages parsed from the transcript.
    pub messages: usize,
    pub warnings: Vec<ImportWarning>,
}

/// A transcript that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFailure {
    pub entry: String,
    pub error: String,
}

/// Overall result of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// At least one chat was added or updated.
    Changed,
    /// Everything was already known.
    Unchanged,
    /// Some transcripts failed, others were imported.
    PartiallyFailed,
    /// Every transcript failed.
    Failed,
}

/// Counters and reports for one import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    /// Chats created.
    pub added: usize,
    /// Existing chats that received messages.
    pub updated: usize,
    /// Parsed messages that were already stored.
    pub skipped: usize,
    /// Messages appended across all chats, new chats included.
    pub messages_added: usize,
    /// Media files found in the archive.
    pub media_files: usize,
    pub transcripts: Vec<TranscriptReport>,
    pub failures: Vec<TranscriptFailure>,
}

impl ImportStats {
    pub fn status(&self) -> ImportStatus {
        match (self.failures.is_empty(), self.transcripts.is_empty()) {
            (false, true) => ImportStatus::Failed,
            (false, false) => ImportStatus::PartiallyFailed,
            (true, _) if self.added + self.updated > 0 => ImportStatus::Changed,
            (true, _) => ImportStatus::Unchanged,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.added + self.updated > 0
    }

    /// All warnings of all transcripts.
    pub fn warnings(&self) -> impl Iterator<Item = &ImportWarning> {
        self.transcripts.iter().flat_map(|t| t.warnings.iter())
    }

    /// `staged` marks chats already added or updated earlier in the same
    /// import; growing them again does not count as another update.
    fn record(
        &mut self,
        entry: &str,
        parsed: usize,
        outcome: &MergeOutcome,
        staged: bool,
        warnings: Vec<ImportWarning>,
    ) {
        self.skipped += outcome.skipped();
        self.messages_added += outcome.added_message_count();

        let chat_id = outcome.chat_id().clone();
        let name = outcome.chat_name().to_string();
        let outcome = match outcome {
            MergeOutcome::Added { .. } => {
                self.added += 1;
                TranscriptOutcome::Added { chat_id, name }
            }
            MergeOutcome::Updated { added, .. } => {
                if !staged {
                    self.updated += 1;
                }
                TranscriptOutcome::Updated {
                    chat_id,
                    name,
                    added: *added,
                }
            }
            MergeOutcome::Skipped { .. } => TranscriptOutcome::Skipped { chat_id, name },
        };

        self.transcripts.push(TranscriptReport {
            entry: entry.to_string(),
            outcome,
            messages: parsed,
            warnings,
        });
    }
}

/// Output of an import.
#[derive(Debug, Clone)]
pub struct ImportResult {
    /// The next library state.
    pub library: ChatLibrary,
    pub stats: ImportStats,
    /// Attachment bytes behind `blob:` URLs. Empty in reference mode.
    pub media: MediaStore,
}

/// Chats changed so far in this import, layered over the input library.
#[derive(Default)]
struct Staging {
    added: Vec<Chat>,
    updated: Vec<Chat>,
}

impl Staging {
    /// Current version of every chat: staged new chats first, then the
    /// library with staged updates applied.
    fn known<'a>(&'a self, library: &'a ChatLibrary) -> Vec<&'a Chat> {
        let mut known: Vec<&Chat> = self.added.iter().collect();
        for chat in library.chats() {
            let current = self.updated.iter().find(|u| u.id == chat.id).unwrap_or(chat);
            known.push(current);
        }
        known
    }

    fn apply(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Added { chat } => self.added.push(chat),
            MergeOutcome::Updated { chat, .. } => {
                if let Some(slot) = self.added.iter_mut().find(|c| c.id == chat.id) {
                    *slot = chat;
                } else if let Some(slot) = self.updated.iter_mut().find(|c| c.id == chat.id) {
                    *slot = chat;
                } else {
                    self.updated.push(chat);
                }
            }
            MergeOutcome::Skipped { .. } => {}
        }
    }

    /// Whether the chat was already added or updated in this import.
    fn contains(&self, id: &ChatId) -> bool {
        self.added.iter().chain(&self.updated).any(|c| &c.id == id)
    }

    fn into_changes(self) -> ChatChanges {
        ChatChanges {
            added: self.added,
            updated: self.updated,
        }
    }
}

/// Imports an archive held in memory.
///
/// Reference-mode URLs are `zip:<entry>`, relative to these bytes.
pub fn import_archive(bytes: &[u8], library: &ChatLibrary, config: &ImportConfig) -> Result<ImportResult> {
    import_reader(Cursor::new(bytes), library, config)
}

/// Imports an archive from disk.
///
/// Reference-mode URLs are `zip:<absolute archive path>!<entry>`, so they
/// stay resolvable after the import.
pub fn import_file(path: impl AsRef<Path>, library: &ChatLibrary, config: &ImportConfig) -> Result<ImportResult> {
    let path = path.as_ref().canonicalize()?;
    let file = File::open(&path)?;
    import_source(BufReader::new(file), Some(&path), library, config)
}

/// Imports an archive from any seekable reader.
///
/// # Errors
///
/// [`ChatvaultError::Archive`] if the ZIP directory is unreadable and
/// [`ChatvaultError::NoTranscriptFound`] if no entry is a transcript. In both
/// cases nothing is imported.
pub fn import_reader<R: Read + Seek>(reader: R, library: &ChatLibrary, config: &ImportConfig) -> Result<ImportResult> {
    import_source(reader, None, library, config)
}

/// Shared import driver. `source` is the archive's location on disk, used
/// to qualify reference-mode URLs.
pub(crate) fn import_source<R: Read + Seek>(
    reader: R,
    source: Option<&Path>,
    library: &ChatLibrary,
    config: &ImportConfig,
) -> Result<ImportResult> {
    let mut archive = ChatArchive::new(reader)?;
    let listing = archive.listing();

    if listing.transcripts.is_empty() {
        warn!("archive has no chat transcript ({} entries)", listing.total);
        return Err(ChatvaultError::no_transcript(listing.total));
    }

    info!(
        "importing {} transcript(s), {} media file(s)",
        listing.transcripts.len(),
        listing.media.len()
    );

    let index = MediaIndex::from_entries(listing.media.iter().map(String::as_str));
    let parser = TranscriptParser::with_config(config.transcript.clone());
    let current_user = config.current_user.as_deref();

    let mut media = MediaStore::new();
    let mut references = match source {
        Some(path) => ReferenceLoader::for_archive(path.display().to_string()),
        None => ReferenceLoader::new(),
    };
    let mut staging = Staging::default();
    let mut stats = ImportStats {
        media_files: listing.media.len(),
        ..ImportStats::default()
    };

    for entry in &listing.transcripts {
        let text = match archive.read_text(entry) {
            Ok(text) => text,
            Err(e) => {
                warn!("skipping transcript {entry}: {e}");
                stats.failures.push(TranscriptFailure {
                    entry: entry.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let parsed = parser.parse_detailed(&text);
        let mut messages = parsed.messages;
        let mut warnings = parsed.warnings;
        let parsed_count = messages.len();

        if messages.is_empty() {
            debug!("{entry}: no messages");
            stats.transcripts.push(TranscriptReport {
                entry: entry.clone(),
                outcome: TranscriptOutcome::Empty,
                messages: 0,
                warnings,
            });
            continue;
        }

        let media_warnings = match config.media {
            MediaMode::Embed => {
                let mut loader = EmbedLoader::new(&mut archive, &mut media);
                resolve_attachments(&mut messages, &index, &mut loader)
            }
            MediaMode::Reference => resolve_attachments(&mut messages, &index, &mut references),
        };
        warnings.extend(media_warnings);

        let known = staging.known(library);
        let outcome = merge_chat(messages, source_base_name(entry), &known, current_user);

        if outcome.strategy() == Some(MergeStrategy::SetDifference) && had_messages(&known, &outcome) {
            warn!("'{}': merge anchor not found, deduplicating by content", outcome.chat_name());
            warnings.push(ImportWarning::MergeAnchorNotFound {
                chat: outcome.chat_name().to_string(),
            });
        }

        debug!(
            "{entry}: {} parsed, {} added, {} skipped",
            parsed_count,
            outcome.added_message_count(),
            outcome.skipped()
        );
        let staged = staging.contains(outcome.chat_id());
        stats.record(entry, parsed_count, &outcome, staged, warnings);
        staging.apply(outcome);
    }

    let changes = staging.into_changes();
    let library = if changes.is_empty() {
        library.clone()
    } else {
        library.with_changes(changes)
    };

    // Blobs loaded for messages the merge dropped as duplicates are not
    // referenced anywhere.
    let loaded = media.len();
    let referenced = library.media_urls();
    media.retain(|url| referenced.contains(url));
    if media.len() < loaded {
        debug!("dropped {} unreferenced attachment blob(s)", loaded - media.len());
    }

    info!(
        "import finished: {} added, {} updated, {} duplicate message(s) skipped, {} failed",
        stats.added,
        stats.updated,
        stats.skipped,
        stats.failures.len()
    );

    Ok(ImportResult { library, stats, media })
}

/// Whether the chat an outcome refers to had stored messages before the merge.
fn had_messages(known: &[&Chat], outcome: &MergeOutcome) -> bool {
    known
        .iter()
        .find(|c| &c.id == outcome.chat_id())
        .is_some_and(|c| !c.messages.is_empty())
}
