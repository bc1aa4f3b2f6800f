//! Chat (conversation thread) type.
//!
//! A [`Chat`] is identified by its [participant key](participant_key), not by
//! its id or the file name it was imported from: exports are usually named
//! `_chat.txt`, which says nothing about the conversation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Message;

/// Default number of participants shown in summaries.
pub const PARTICIPANT_DISPLAY_LIMIT: usize = 5;

/// Separator between names in a participant key.
const PARTICIPANT_KEY_SEPARATOR: &str = "|";

/// Opaque chat identifier, stable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChatId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ChatId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One conversation thread.
///
/// `participants` holds every distinct author, sorted. Use
/// [`display_participants`](Chat::display_participants) for the short list
/// shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub name: String,
    pub participants: Vec<String>,
    pub messages: Vec<Message>,
}

impl Chat {
    /// Creates a chat with a fresh id; participants are derived from the messages.
    pub fn new(name: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: ChatId::generate(),
            name: name.into(),
            participants: participants_of(&messages),
            messages,
        }
    }

    /// Builder method to use a specific id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ChatId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &ChatId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns at most `limit` participants, in sorted order.
    pub fn display_participants_limited(&self, limit: usize) -> &[String] {
        &self.participants[..self.participants.len().min(limit)]
    }

    /// Returns the participants shown in summaries.
    pub fn display_participants(&self) -> &[String] {
        self.display_participants_limited(PARTICIPANT_DISPLAY_LIMIT)
    }

    /// Identity fingerprint of this chat.
    pub fn participant_key(&self) -> String {
        join_key(self.participants.iter().map(String::as_str).collect())
    }

    /// Appends messages and recomputes participants as the union of the old
    /// and new authors.
    pub fn append(&mut self, messages: Vec<Message>) {
        let mut set: BTreeSet<String> = self.participants.drain(..).collect();
        set.extend(messages.iter().map(|m| m.author.clone()));
        self.participants = set.into_iter().collect();
        self.messages.extend(messages);
    }
}

/// Sorted, de-duplicated authors of `messages`.
pub fn participants_of(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .map(|m| m.author.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Computes the participant key: sorted unique authors joined by `|`.
///
/// Order-independent and case-sensitive.
///
/// # Example
///
/// ```rust
/// use chatvault::Message;
/// use chatvault::chat::participant_key;
///
/// let messages = vec![
///     Message::new("Bob", "t1", "hi"),
///     Message::new("Alice", "t2", "hello"),
///     Message::new("Bob", "t3", "bye"),
/// ];
/// assert_eq!(participant_key(&messages), "Alice|Bob");
/// ```
pub fn participant_key(messages: &[Message]) -> String {
    join_key(
        messages
            .iter()
            .map(|m| m.author.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    )
}

fn join_key(mut names: Vec<&str>) -> String {
    names.sort_unstable();
    names.dedup();
    names.join(PARTICIPANT_KEY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(author: &str, content: &str) -> Message {
        Message::new(author, "1/2/23, 9:00 AM", content)
    }

    #[test]
    fn test_chat_new_derives_participants() {
        let chat = Chat::new("x", vec![msg("Bob", "a"), msg("Alice", "b"), msg("Bob", "c")]);
        assert_eq!(chat.participants, vec!["Alice", "Bob"]);
        assert_eq!(chat.participant_key(), "Alice|Bob");
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ChatId::generate(), ChatId::generate());
    }

    #[test]
    fn test_participant_key_is_order_independent() {
        let a = participant_key(&[msg("Alice", "1"), msg("Bob", "2")]);
        let b = participant_key(&[msg("Bob", "1"), msg("Alice", "2")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_participant_key_is_case_sensitive() {
        let a = participant_key(&[msg("alice", "1")]);
        let b = participant_key(&[msg("Alice", "1")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_participant_key_from_unsorted_field() {
        let mut chat = Chat::new("x", vec![]);
        chat.participants = vec!["Bob".into(), "Alice".into(), "Bob".into()];
        assert_eq!(chat.participant_key(), "Alice|Bob");
    }

    #[test]
    fn test_display_participants_capped() {
        let messages: Vec<Message> = ["A", "B", "C", "D", "E", "F", "G"]
            .iter()
            .map(|a| msg(a, "hi"))
            .collect();
        let chat = Chat::new("group", messages);
        assert_eq!(chat.participants.len(), 7);
        assert_eq!(chat.display_participants(), &["A", "B", "C", "D", "E"]);
        assert_eq!(chat.display_participants_limited(2), &["A", "B"]);
    }

    #[test]
    fn test_append_unions_participants() {
        let mut chat = Chat::new("x", vec![msg("Alice", "1")]);
        chat.append(vec![msg("Carol", "2"), msg("Alice", "3")]);
        assert_eq!(chat.messages.len(), 3);
        assert_eq!(chat.participants, vec!["Alice", "Carol"]);
    }

    #[test]
    fn test_chat_id_serializes_transparently() {
        let chat = Chat::new("x", vec![]).with_id("42");
        let json = serde_json::to_string(&chat).unwrap();
        assert!(json.contains(r#""id":"42""#));
    }
}
