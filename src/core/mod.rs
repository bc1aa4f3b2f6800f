//! Chat identity, merging and the chat library.
//!
//! This module contains:
//! - [`naming`] - Display names for new chats
//! - [`merge`] - Participant-key identity and incremental merge
//! - [`library`] - The collection of known chats and its persistence
//! - [`filter`] - Message search and pagination

pub mod filter;
pub mod library;
pub mod merge;
pub mod naming;

pub use filter::{MessagePage, MessageQuery, apply_query};
pub use library::{ChatChanges, ChatLibrary, ChatSummary};
pub use merge::{MergeOutcome, MergeStrategy, merge_chat, new_messages, set_difference};
