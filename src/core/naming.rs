//! Display names for newly discovered chats.
//!
//! Exports are usually called `_chat.txt`, so a generic file name is
//! replaced by a name built from the participants other than the current
//! user. Names are then made unique with a ` (n)` suffix.

use crate::media::base_name;

/// File base names that carry no information about the conversation.
pub const GENERIC_NAMES: [&str; 3] = ["_chat", "chat", "Chat"];

/// How many other participants a synthesized group name lists.
const NAME_PARTICIPANT_LIMIT: usize = 3;

/// Returns `true` for placeholder names like `_chat`.
pub fn is_generic_name(name: &str) -> bool {
    GENERIC_NAMES.contains(&name)
}

/// Strips directories and a `.txt` extension from a transcript entry path.
///
/// ```rust
/// use chatvault::core::naming::source_base_name;
///
/// assert_eq!(source_base_name("export/_chat.txt"), "_chat");
/// assert_eq!(source_base_name("WhatsApp Chat with Bob.TXT"), "WhatsApp Chat with Bob");
/// ```
pub fn source_base_name(entry: &str) -> &str {
    let base = base_name(entry);
    let cut = base.len().saturating_sub(4);
    match base.get(cut..) {
        Some(ext) if cut > 0 && ext.eq_ignore_ascii_case(".txt") => &base[..cut],
        _ => base,
    }
}

/// Builds a name from participants, excluding the current user.
///
/// One other participant gives their name; several give the first three
/// joined by `, `, followed by `...` when more were left out. With no other
/// participant the first participant is used. Returns `None` only when there
/// are no participants at all.
///
/// ```rust
/// use chatvault::core::naming::participants_name;
///
/// let people = vec!["Alice".to_string(), "Me".to_string()];
/// assert_eq!(participants_name(&people, Some("Me")).as_deref(), Some("Alice"));
/// ```
pub fn participants_name(participants: &[String], current_user: Option<&str>) -> Option<String> {
    let others: Vec<&str> = participants
        .iter()
        .map(String::as_str)
        .filter(|p| Some(*p) != current_user)
        .collect();

    match others.as_slice() {
        [] => participants.first().cloned(),
        [one] => Some((*one).to_string()),
        many => {
            let shown = many[..many.len().min(NAME_PARTICIPANT_LIMIT)].join(", ");
            if many.len() > NAME_PARTICIPANT_LIMIT {
                Some(format!("{shown}..."))
            } else {
                Some(shown)
            }
        }
    }
}

/// Chooses the display name of a new chat before uniqueness is enforced.
pub fn display_name(source_name: &str, participants: &[String], current_user: Option<&str>) -> String {
    if is_generic_name(source_name) {
        if let Some(name) = participants_name(participants, current_user) {
            return name;
        }
    }
    source_name.to_string()
}

/// Appends ` (1)`, ` (2)`, ... until `is_taken` accepts the name.
///
/// ```rust
/// use chatvault::core::naming::unique_name;
///
/// let taken = ["Alice", "Alice (1)"];
/// assert_eq!(unique_name("Alice", |n| taken.contains(&n)), "Alice (2)");
/// assert_eq!(unique_name("Bob", |n| taken.contains(&n)), "Bob");
/// ```
pub fn unique_name(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
