//! Chat identity and incremental merge.
//!
//! A freshly parsed transcript belongs to an existing chat iff both have the
//! same [participant key](crate::chat::participant_key). New messages are
//! found in two steps:
//!
//! 1. **Anchor**: locate the stored chat's last message in the parsed list;
//!    everything after it is new. Exports are cumulative, so this is the
//!    usual case.
//! 2. **Set difference**: if the anchor is missing (history trimmed or
//!    edited upstream), every parsed message whose identity is not already
//!    stored is new, in parse order.
//!
//! Known limitations: the set-difference branch appends new
//! messages after the stored ones, so interleaved old/new messages are not
//! re-sorted chronologically; and two distinct groups with identical
//! participant sets are treated as one chat.

use std::collections::HashSet;

use log::debug;

use crate::Message;
use crate::chat::{Chat, ChatId, participant_key, participants_of};
use crate::core::naming::{display_name, unique_name};
use crate::message::MessageKey;

/// How the new messages of an update were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    Anchor,
    SetDifference,
}

/// Messages of a parse that are not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessages {
    pub messages: Vec<Message>,
    /// Parsed messages that were already stored.
    pub duplicates: usize,
    pub strategy: MergeStrategy,
}

/// Position of the stored chat's last message inside `parsed`.
///
/// When the anchor occurs more than once, the occurrence at the stored
/// chat's own position wins (the cumulative-export case), otherwise the
/// first one.
pub fn anchor_index(existing: &[Message], parsed: &[Message]) -> Option<usize> {
    let anchor = existing.last()?;
    let own_position = existing.len() - 1;
    match parsed.get(own_position) {
        Some(m) if m.is_same(anchor) => Some(own_position),
        _ => parsed.iter().position(|m| m.is_same(anchor)),
    }
}

/// Parsed messages whose identity is not among the stored ones, in parse
/// order.
///
/// # Example
///
/// ```rust
/// use chatvault::Message;
/// use chatvault::core::merge::set_difference;
///
/// let m = |c: &str| Message::new("Alice", "1/2/23, 9:00 AM", c);
/// let fresh = set_difference(&[m("1"), m("3")], vec![m("1"), m("2"), m("3"), m("4")]);
/// assert_eq!(fresh, vec![m("2"), m("4")]);
/// ```
pub fn set_difference(existing: &[Message], parsed: Vec<Message>) -> Vec<Message> {
    let stored: HashSet<MessageKey<'_>> = existing.iter().map(Message::key).collect();
    parsed
        .into_iter()
        .filter(|m| !stored.contains(&m.key()))
        .collect()
}

/// Computes which parsed messages are new relative to `existing`: the tail
/// after the [anchor](anchor_index) when there is one, the
/// [set difference](set_difference) otherwise.
///
/// # Example
///
/// ```rust
/// use chatvault::Message;
/// use chatvault::core::merge::{MergeStrategy, new_messages};
///
/// let m = |c: &str| Message::new("Alice", "1/2/23, 9:00 AM", c);
/// let existing = vec![m("1"), m("2")];
/// let found = new_messages(&existing, vec![m("1"), m("2"), m("3")]);
///
/// assert_eq!(found.messages, vec![m("3")]);
/// assert_eq!(found.strategy, MergeStrategy::Anchor);
/// ```
pub fn new_messages(existing: &[Message], parsed: Vec<Message>) -> NewMessages {
    let total = parsed.len();

    let (messages, strategy) = match anchor_index(existing, &parsed) {
        Some(index) => (
            parsed.into_iter().skip(index + 1).collect::<Vec<_>>(),
            MergeStrategy::Anchor,
        ),
        None => (set_difference(existing, parsed), MergeStrategy::SetDifference),
    };

    NewMessages {
        duplicates: total - messages.len(),
        messages,
        strategy,
    }
}

/// Finds the known chat with the same participant key.
pub fn find_existing<'a>(key: &str, known: &[&'a Chat]) -> Option<&'a Chat> {
    known.iter().copied().find(|chat| chat.participant_key() == key)
}

/// Result of merging one parsed transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// No chat had these participants; a new chat was created.
    Added { chat: Chat },
    /// An existing chat received new messages.
    Updated {
        chat: Chat,
        added: usize,
        skipped: usize,
        strategy: MergeStrategy,
    },
    /// Every parsed message was already stored; nothing changes.
    Skipped {
        chat_id: ChatId,
        name: String,
        skipped: usize,
        strategy: MergeStrategy,
    },
}

impl MergeOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, MergeOutcome::Added { .. })
    }

    /// The resulting chat; `None` when nothing changed.
    pub fn chat(&self) -> Option<&Chat> {
        match self {
            MergeOutcome::Added { chat } | MergeOutcome::Updated { chat, .. } => Some(chat),
            MergeOutcome::Skipped { .. } => None,
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        match self {
            MergeOutcome::Added { chat } | MergeOutcome::Updated { chat, .. } => &chat.id,
            MergeOutcome::Skipped { chat_id, .. } => chat_id,
        }
    }

    pub fn chat_name(&self) -> &str {
        match self {
            MergeOutcome::Added { chat } | MergeOutcome::Updated { chat, .. } => &chat.name,
            MergeOutcome::Skipped { name, .. } => name,
        }
    }

    pub fn added_message_count(&self) -> usize {
        match self {
            MergeOutcome::Added { chat } => chat.messages.len(),
            MergeOutcome::Updated { added, .. } => *added,
            MergeOutcome::Skipped { .. } => 0,
        }
    }

    /// Parsed messages that were duplicates of stored ones.
    pub fn skipped(&self) -> usize {
        match self {
            MergeOutcome::Added { .. } => 0,
            MergeOutcome::Updated { skipped, .. } | MergeOutcome::Skipped { skipped, .. } => {
                *skipped
            }
        }
    }

    pub fn strategy(&self) -> Option<MergeStrategy> {
        match self {
            MergeOutcome::Added { .. } => None,
            MergeOutcome::Updated { strategy, .. } | MergeOutcome::Skipped { strategy, .. } => {
                Some(*strategy)
            }
        }
    }
}

/// Merges a parsed transcript into the known chats.
///
/// `known` must hold the current version of every chat, including chats
/// created earlier in the same import, so names stay unique and repeated
/// transcripts dedupe against each other.
pub fn merge_chat(
    parsed: Vec<Message>,
    source_name: &str,
    known: &[&Chat],
    current_user: Option<&str>,
) -> MergeOutcome {
    let key = participant_key(&parsed);

    if let Some(existing) = find_existing(&key, known) {
        let found = new_messages(&existing.messages, parsed);
        debug!(
            "'{}': {} new, {} duplicate ({:?})",
            existing.name,
            found.messages.len(),
            found.duplicates,
            found.strategy
        );

        if found.messages.is_empty() {
            return MergeOutcome::Skipped {
                chat_id: existing.id.clone(),
                name: existing.name.clone(),
                skipped: found.duplicates,
                strategy: found.strategy,
            };
        }

        let added = found.messages.len();
        let mut chat = existing.clone();
        chat.append(found.messages);
        return MergeOutcome::Updated {
            chat,
            added,
            skipped: found.duplicates,
            strategy: found.strategy,
        };
    }

    let participants = participants_of(&parsed);
    let base = display_name(source_name, &participants, current_user);
    let name = unique_name(&base, |candidate| known.iter().any(|c| c.name == candidate));
    debug!("new chat '{name}' with {} messages", parsed.len());

    MergeOutcome::Added {
        chat: Chat::new(name, parsed),
    }
}
