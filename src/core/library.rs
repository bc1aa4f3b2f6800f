//! The set of known chats.
//!
//! [`ChatLibrary`] is a plain value: an import never mutates the library it
//! was given but returns a new one built with
//! [`with_changes`](ChatLibrary::with_changes). Callers decide when to
//! replace their copy, so a failed or abandoned import leaves nothing half
//! applied.
//!
//! # Persistence
//!
//! Libraries serialize to JSON:
//!
//! ```json
//! {
//!   "chats": [
//!     {"id": "…", "name": "Alice", "participants": ["Alice", "Me"], "messages": [...]}
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chat::{Chat, ChatId, PARTICIPANT_DISPLAY_LIMIT};
use crate::core::filter::{MessagePage, MessageQuery, apply_query};
use crate::error::{ChatvaultError, Result};

/// Chats produced or changed by one import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatChanges {
    /// Newly created chats, in discovery order.
    pub added: Vec<Chat>,
    /// Full replacement versions of existing chats.
    pub updated: Vec<Chat>,
}

impl ChatChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

/// Lightweight listing entry for a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: ChatId,
    pub name: String,
    /// Display participants, capped.
    pub participants: Vec<String>,
    pub message_count: usize,
}

/// Ordered collection of chats. Newest additions come first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatLibrary {
    #[serde(default)]
    chats: Vec<Chat>,
}

impl ChatLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chats(chats: Vec<Chat>) -> Self {
        Self { chats }
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn get(&self, id: &ChatId) -> Option<&Chat> {
        self.chats.iter().find(|c| &c.id == id)
    }

    /// Id of the chat listed first, used as the default selection.
    pub fn first_id(&self) -> Option<&ChatId> {
        self.chats.first().map(|c| &c.id)
    }

    /// Every media URL referenced by a message in the library.
    pub fn media_urls(&self) -> HashSet<&str> {
        self.chats
            .iter()
            .flat_map(|c| &c.messages)
            .filter_map(|m| m.media.as_ref()?.url.as_deref())
            .collect()
    }

    /// Builds the next library: updated chats are replaced in place, new
    /// chats are placed before all existing ones.
    ///
    /// Updates whose id is unknown are ignored.
    #[must_use]
    pub fn with_changes(&self, changes: ChatChanges) -> Self {
        let mut replacements: HashMap<ChatId, Chat> = changes
            .updated
            .into_iter()
            .map(|chat| (chat.id.clone(), chat))
            .collect();

        let mut chats = changes.added;
        chats.reserve(self.chats.len());
        for chat in &self.chats {
            chats.push(replacements.remove(&chat.id).unwrap_or_else(|| chat.clone()));
        }
        Self { chats }
    }

    /// Summaries of all chats in library order.
    pub fn summaries(&self) -> Vec<ChatSummary> {
        self.summaries_limited(PARTICIPANT_DISPLAY_LIMIT)
    }

    /// Summaries with at most `participant_limit` participants each.
    pub fn summaries_limited(&self, participant_limit: usize) -> Vec<ChatSummary> {
        self.chats
            .iter()
            .map(|chat| ChatSummary {
                id: chat.id.clone(),
                name: chat.name.clone(),
                participants: chat.display_participants_limited(participant_limit).to_vec(),
                message_count: chat.messages.len(),
            })
            .collect()
    }

    /// Queries the messages of one chat.
    ///
    /// # Errors
    ///
    /// [`ChatvaultError::ChatNotFound`] for an unknown id, or
    /// [`ChatvaultError::InvalidQuery`] for bad pagination.
    pub fn messages_page(&self, id: &ChatId, query: &MessageQuery) -> Result<MessagePage> {
        let chat = self
            .get(id)
            .ok_or_else(|| ChatvaultError::chat_not_found(id.as_str()))?;
        apply_query(&chat.messages, query)
    }

    /// Removes one chat and returns it.
    ///
    /// # Errors
    ///
    /// [`ChatvaultError::ChatNotFound`] if the id is unknown.
    pub fn remove(&mut self, id: &ChatId) -> Result<Chat> {
        let index = self
            .chats
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| ChatvaultError::chat_not_found(id.as_str()))?;
        Ok(self.chats.remove(index))
    }

    /// Removes every chat whose id is listed; unknown ids are ignored.
    ///
    /// Returns the number of chats removed.
    pub fn remove_many(&mut self, ids: &[ChatId]) -> usize {
        let doomed: HashSet<&ChatId> = ids.iter().collect();
        let before = self.chats.len();
        self.chats.retain(|c| !doomed.contains(&c.id));
        before - self.chats.len()
    }

    /// Removes all chats and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let n = self.chats.len();
        self.chats.clear();
        n
    }

    /// Rewrites media URLs using `links` (old URL to new location), e.g.
    /// after [`MediaStore::persist`](crate::media::MediaStore::persist).
    ///
    /// Returns the number of messages changed.
    pub fn relink_media(&mut self, links: &HashMap<String, PathBuf>) -> usize {
        let mut changed = 0;
        for msg in self.chats.iter_mut().flat_map(|c| c.messages.iter_mut()) {
            let Some(media) = msg.media.as_mut() else {
                continue;
            };
            let Some(path) = media.url.as_ref().and_then(|url| links.get(url)) else {
                continue;
            };
            media.url = Some(path.display().to_string());
            changed += 1;
        }
        changed
    }

    /// Serializes the library as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a library file. A missing file is an empty library.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Writes the library file, replacing any previous content.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
