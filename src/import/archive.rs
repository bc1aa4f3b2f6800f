//! Read access to a chat export archive.

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::error::{ChatvaultError, Result};
use crate::media::{MediaLoader, MediaStore, base_name};

/// Resource-fork folder added by macOS archivers.
const MACOS_METADATA_DIR: &str = "__MACOSX/";

/// Returns `true` for entries that are never part of an export.
pub fn is_ignored_entry(name: &str) -> bool {
    name.ends_with('/') || name.starts_with(MACOS_METADATA_DIR) || name.contains("/__MACOSX/")
}

/// Returns `true` if the entry is a chat transcript: any `.txt` file, or a
/// file whose base name is exactly `_chat`. Case-insensitive.
///
/// ```rust
/// use chatvault::import::archive::is_transcript_entry;
///
/// assert!(is_transcript_entry("_chat.txt"));
/// assert!(is_transcript_entry("Export/WhatsApp Chat with Bob.TXT"));
/// assert!(is_transcript_entry("export/_chat"));
/// assert!(!is_transcript_entry("IMG-0001.jpg"));
/// ```
pub fn is_transcript_entry(name: &str) -> bool {
    let base = base_name(name);
    base.eq_ignore_ascii_case("_chat")
        || base
            .get(base.len().saturating_sub(4)..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".txt"))
}

/// Entry names of an archive, split by role, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveListing {
    pub transcripts: Vec<String>,
    pub media: Vec<String>,
    /// Every entry, ignored ones included.
    pub total: usize,
}

/// A ZIP chat export.
pub struct ChatArchive<R> {
    zip: ZipArchive<R>,
}

impl<R: Read + Seek> ChatArchive<R> {
    /// Opens an archive. Fails if the central directory cannot be read.
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            zip: ZipArchive::new(reader)?,
        })
    }

    /// Classifies all entries.
    pub fn listing(&self) -> ArchiveListing {
        let mut listing = ArchiveListing::default();
        for name in self.zip.file_names() {
            listing.total += 1;
            if is_ignored_entry(name) {
                continue;
            }
            if is_transcript_entry(name) {
                listing.transcripts.push(name.to_string());
            } else {
                listing.media.push(name.to_string());
            }
        }
        listing
    }

    /// Reads an entry fully.
    pub fn read_bytes(&mut self, entry: &str) -> Result<Vec<u8>> {
        let mut file = self.zip.by_name(entry)?;
        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads an entry as UTF-8 text.
    pub fn read_text(&mut self, entry: &str) -> Result<String> {
        let bytes = self.read_bytes(entry)?;
        String::from_utf8(bytes).map_err(|e| ChatvaultError::utf8(entry, e))
    }
}

/// Loads attachment bytes into a [`MediaStore`] and hands out `blob:` URLs.
pub struct EmbedLoader<'a, R> {
    archive: &'a mut ChatArchive<R>,
    store: &'a mut MediaStore,
}

impl<'a, R: Read + Seek> EmbedLoader<'a, R> {
    pub fn new(archive: &'a mut ChatArchive<R>, store: &'a mut MediaStore) -> Self {
        Self { archive, store }
    }
}

impl<R: Read + Seek> MediaLoader for EmbedLoader<'_, R> {
    fn load(&mut self, entry: &str, name: &str) -> Result<String> {
        if let Some(url) = self.store.url_for_entry(entry) {
            return Ok(url.to_string());
        }
        let bytes = self.archive.read_bytes(entry)?;
        Ok(self.store.insert(entry, name, bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    use super::*;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_transcript_detection() {
        assert!(is_transcript_entry("_chat.txt"));
        assert!(is_transcript_entry("notes.Txt"));
        assert!(is_transcript_entry("_CHAT"));
        assert!(!is_transcript_entry("my_chat"));
        assert!(!is_transcript_entry("photo.jpg"));
    }

    #[test]
    fn test_ignored_entries() {
        assert!(is_ignored_entry("media/"));
        assert!(is_ignored_entry("__MACOSX/._chat.txt"));
        assert!(is_ignored_entry("export/__MACOSX/._photo.jpg"));
        assert!(!is_ignored_entry("export/photo.jpg"));
    }

    #[test]
    fn test_listing() {
        let bytes = build_zip(&[
            ("export/", b""),
            ("export/_chat.txt", b"x"),
            ("export/photo.jpg", b"jpg"),
            ("__MACOSX/export/._photo.jpg", b""),
        ]);
        let archive = ChatArchive::new(Cursor::new(bytes)).unwrap();
        let listing = archive.listing();
        assert_eq!(listing.transcripts, vec!["export/_chat.txt"]);
        assert_eq!(listing.media, vec!["export/photo.jpg"]);
        assert_eq!(listing.total, 4);
    }

    #[test]
    fn test_read_text_rejects_invalid_utf8() {
        let bytes = build_zip(&[("_chat.txt", &[0xff, 0xfe, 0x00])]);
        let mut archive = ChatArchive::new(Cursor::new(bytes)).unwrap();
        let err = archive.read_text("_chat.txt").unwrap_err();
        assert!(matches!(err, ChatvaultError::Utf8 { .. }));
    }

    #[test]
    fn test_not_a_zip() {
        let result = ChatArchive::new(Cursor::new(b"definitely not a zip".to_vec()));
        assert!(matches!(result, Err(ChatvaultError::Archive(_))));
    }

    #[test]
    fn test_embed_loader_reuses_url() {
        let bytes = build_zip(&[("photo.jpg", b"jpg")]);
        let mut archive = ChatArchive::new(Cursor::new(bytes)).unwrap();
        let mut store = MediaStore::new();
        let mut loader = EmbedLoader::new(&mut archive, &mut store);

        let a = loader.load("photo.jpg", "photo.jpg").unwrap();
        let b = loader.load("photo.jpg", "photo.jpg").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&a).unwrap().bytes, b"jpg");
    }
}
