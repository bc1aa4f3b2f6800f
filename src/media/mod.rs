//! Attachment resolution.
//!
//! Matches the file names a message mentions against the files of the
//! archive and fills [`Message::media`].
//!
//! Candidate order for one message:
//! 1. the `<attached: NAME>` wrapper, its full inner text first, then any
//!    media file names inside it
//! 2. media file names anywhere in the content, first-seen order
//!
//! The first candidate found in the [`MediaIndex`] (exact base name, then
//! lower-cased) wins. Candidates that resolve nowhere still produce media
//! metadata with `url: None`; a bare `<attachment omitted>` marker produces
//! a generic placeholder.

pub mod store;

use std::collections::HashMap;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::Message;
use crate::error::{ImportWarning, Result};
use crate::message::Media;

pub use store::{MediaBlob, MediaStore, content_type_for};

static ATTACHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*attached:\s*([^>]+?)\s*>").expect("attached pattern is valid")
});

static MEDIA_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([^\s<>]+?\.(?:png|jpe?g|gif|webp|mp4|webm|mov|m4v|mp3|wav|ogg|m4a|pdf))")
        .expect("file name pattern is valid")
});

static OMITTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(?:attachment|media)\s+omitted\s*>").expect("omitted pattern is valid")
});

/// Returns the last path segment of an archive path.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lookup table from file base name to archive entry path.
///
/// Every entry is registered under its exact base name and its lower-cased
/// base name; a later entry with the same name replaces an earlier one.
#[derive(Debug, Clone, Default)]
pub struct MediaIndex {
    by_name: HashMap<String, String>,
}

impl MediaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from archive entry paths.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    pub fn insert(&mut self, entry: &str) {
        let base = base_name(entry);
        self.by_name.insert(base.to_string(), entry.to_string());
        self.by_name.insert(base.to_lowercase(), entry.to_string());
    }

    /// Finds the archive entry for a candidate file name.
    pub fn lookup(&self, candidate: &str) -> Option<&str> {
        let base = base_name(candidate);
        self.by_name
            .get(base)
            .or_else(|| self.by_name.get(&base.to_lowercase()))
            .map(String::as_str)
    }

}

/// Extracts attachment file name candidates from message content, in
/// priority order and without duplicates.
///
/// # Example
///
/// ```rust
/// use chatvault::media::attachment_candidates;
///
/// let names = attachment_candidates("<attached: 0001-PHOTO.jpg> and old.png");
/// assert_eq!(names, vec!["0001-PHOTO.jpg", "old.png"]);
/// ```
pub fn attachment_candidates(content: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !name.is_empty() && !candidates.iter().any(|c| c == name) {
            candidates.push(name.to_string());
        }
    };

    if let Some(inner) = ATTACHED.captures(content).and_then(|c| c.get(1)) {
        push(inner.as_str().trim());
        for m in MEDIA_FILE_NAME.find_iter(inner.as_str()) {
            push(m.as_str());
        }
    }

    for m in MEDIA_FILE_NAME.find_iter(content) {
        push(m.as_str());
    }

    candidates
}

/// Returns `true` if the content carries the export's omission marker.
pub fn is_omitted(content: &str) -> bool {
    OMITTED.is_match(content)
}

/// Turns a matched archive entry into a fetchable URL.
///
/// Implemented by the importer for embedded blobs and for plain archive
/// references.
pub trait MediaLoader {
    /// Produces the URL for `entry`, whose base name is `name`.
    fn load(&mut self, entry: &str, name: &str) -> Result<String>;
}

/// Exposes entries as archive handles without reading them.
///
/// Handles are `zip:<archive>!<entry>` when the archive's location is known
/// and `zip:<entry>` otherwise.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLoader {
    archive: Option<String>,
}

impl ReferenceLoader {
    /// Handles relative to the archive the caller holds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles qualified with the archive's path.
    pub fn for_archive(archive: impl Into<String>) -> Self {
        Self {
            archive: Some(archive.into()),
        }
    }
}

impl MediaLoader for ReferenceLoader {
    fn load(&mut self, entry: &str, _name: &str) -> Result<String> {
        Ok(match &self.archive {
            Some(archive) => format!("zip:{archive}!{entry}"),
            None => format!("zip:{entry}"),
        })
    }
}

/// Resolves the media of a single message.
pub fn resolve_media(
    content: &str,
    index: &MediaIndex,
    loader: &mut dyn MediaLoader,
    warnings: &mut Vec<ImportWarning>,
) -> Option<Media> {
    let candidates = attachment_candidates(content);

    let found = candidates
        .iter()
        .find_map(|candidate| index.lookup(candidate));

    if let Some(entry) = found {
        let name = base_name(entry);
        match loader.load(entry, name) {
            Ok(url) => return Some(Media::resolved(name, url)),
            Err(e) => {
                warn!("could not read attachment {entry}: {e}");
                warnings.push(ImportWarning::AttachmentMissing {
                    name: name.to_string(),
                });
                return Some(Media::missing(name));
            }
        }
    }

    if let Some(first) = candidates.first() {
        let name = base_name(first);
        warnings.push(ImportWarning::AttachmentMissing {
            name: name.to_string(),
        });
        return Some(Media::missing(name));
    }

    if is_omitted(content) {
        return Some(Media::omitted());
    }

    None
}

/// Fills `media` on every message that references an attachment.
///
/// Returns one [`ImportWarning::AttachmentMissing`] per unresolved reference.
pub fn resolve_attachments(
    messages: &mut [Message],
    index: &MediaIndex,
    loader: &mut dyn MediaLoader,
) -> Vec<ImportWarning> {
    let mut warnings = Vec::new();
    for msg in messages.iter_mut() {
        if let Some(media) = resolve_media(&msg.content, index, loader, &mut warnings) {
            msg.media = Some(media);
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatvaultError;
    use crate::message::MediaKind;

    fn msg(content: &str) -> Message {
        Message::new("Bob", "1/2/23, 9:01 AM", content)
    }

    struct FailingLoader;

    impl MediaLoader for FailingLoader {
        fn load(&mut self, entry: &str, _name: &str) -> Result<String> {
            Err(ChatvaultError::invalid_query(format!("unreadable {entry}")))
        }
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("a/b/c.jpg"), "c.jpg");
        assert_eq!(base_name("c.jpg"), "c.jpg");
        assert_eq!(base_name("dir\\c.jpg"), "c.jpg");
    }

    #[test]
    fn test_candidates_wrapper_first() {
        let c = attachment_candidates("see x.png <attached: photo.jpg>");
        assert_eq!(c, vec!["photo.jpg", "x.png"]);
    }

    #[test]
    fn test_candidates_wrapper_whitespace_and_case() {
        let c = attachment_candidates("< ATTACHED:   My Doc.docx >");
        assert_eq!(c, vec!["My Doc.docx"]);
    }

    #[test]
    fn test_candidates_android_style() {
        let c = attachment_candidates("IMG-20230102-WA0001.jpg (file attached)");
        assert_eq!(c, vec!["IMG-20230102-WA0001.jpg"]);
    }

    #[test]
    fn test_candidates_none() {
        assert!(attachment_candidates("just text").is_empty());
        assert!(attachment_candidates("<attachment omitted>").is_empty());
    }

    #[test]
    fn test_index_lookup_exact_then_lowercase() {
        let index = MediaIndex::from_entries(["chat/Photo.JPG", "clip.mp4"]);
        assert_eq!(index.lookup("Photo.JPG"), Some("chat/Photo.JPG"));
        assert_eq!(index.lookup("photo.jpg"), Some("chat/Photo.JPG"));
        assert_eq!(index.lookup("some/dir/clip.mp4"), Some("clip.mp4"));
        assert_eq!(index.lookup("missing.png"), None);
    }

    #[test]
    fn test_resolve_found() {
        let index = MediaIndex::from_entries(["photo.jpg"]);
        let mut messages = vec![msg("<attached: photo.jpg>")];
        let warnings = resolve_attachments(&mut messages, &index, &mut ReferenceLoader::new());

        assert!(warnings.is_empty());
        let media = messages[0].media.as_ref().unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.name, "photo.jpg");
        assert_eq!(media.url.as_deref(), Some("zip:photo.jpg"));
    }

    #[test]
    fn test_resolve_missing() {
        let index = MediaIndex::new();
        let mut messages = vec![msg("<attached: photo.jpg>")];
        let warnings = resolve_attachments(&mut messages, &index, &mut ReferenceLoader::new());

        let media = messages[0].media.as_ref().unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.name, "photo.jpg");
        assert!(media.url.is_none());
        assert_eq!(
            warnings,
            vec![ImportWarning::AttachmentMissing {
                name: "photo.jpg".into()
            }]
        );
    }

    #[test]
    fn test_resolve_later_candidate_wins_when_first_missing() {
        let index = MediaIndex::from_entries(["b.png"]);
        let mut messages = vec![msg("a.png then b.png")];
        resolve_attachments(&mut messages, &index, &mut ReferenceLoader::new());
        assert_eq!(messages[0].media.as_ref().unwrap().name, "b.png");
    }

    #[test]
    fn test_resolve_omitted_placeholder() {
        let index = MediaIndex::new();
        let mut messages = vec![msg("<attachment omitted>"), msg("<Media omitted>")];
        let warnings = resolve_attachments(&mut messages, &index, &mut ReferenceLoader::new());
        assert!(warnings.is_empty());
        for m in &messages {
            assert_eq!(m.media, Some(Media::omitted()));
        }
    }

    #[test]
    fn test_resolve_plain_text_has_no_media() {
        let index = MediaIndex::from_entries(["photo.jpg"]);
        let mut messages = vec![msg("hello there")];
        resolve_attachments(&mut messages, &index, &mut ReferenceLoader::new());
        assert!(messages[0].media.is_none());
    }

    #[test]
    fn test_resolve_unreadable_entry_is_missing() {
        let index = MediaIndex::from_entries(["photo.jpg"]);
        let mut messages = vec![msg("<attached: photo.jpg>")];
        let warnings = resolve_attachments(&mut messages, &index, &mut FailingLoader);
        assert!(messages[0].media.as_ref().unwrap().url.is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_reference_loader_qualifies_archive() {
        let index = MediaIndex::from_entries(["media/photo.jpg"]);
        let mut messages = vec![msg("<attached: photo.jpg>")];
        let mut loader = ReferenceLoader::for_archive("/exports/alice.zip");
        resolve_attachments(&mut messages, &index, &mut loader);
        assert_eq!(
            messages[0].media.as_ref().unwrap().url.as_deref(),
            Some("zip:/exports/alice.zip!media/photo.jpg")
        );
    }
}
