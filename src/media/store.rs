//! In-memory store for attachment bytes.
//!
//! Resolved attachments get a `blob:<uuid>` URL that maps to a
//! [`MediaBlob`] here. The store is handed to the caller together with the
//! import result; its lifetime (and any cleanup) is the caller's business.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;

const BLOB_SCHEME: &str = "blob:";

/// Bytes of one attachment plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Returns the content type for a file name.
///
/// `.pdf` is always `application/pdf`: exports sometimes mislabel PDF bytes.
pub fn content_type_for(name: &str) -> String {
    if Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    {
        return "application/pdf".to_string();
    }
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Blob storage keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    blobs: HashMap<String, MediaBlob>,
    by_entry: HashMap<String, String>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the bytes of an archive entry and returns its URL.
    ///
    /// Storing the same entry twice returns the first URL.
    pub fn insert(&mut self, entry: &str, name: &str, bytes: Vec<u8>) -> String {
        if let Some(url) = self.by_entry.get(entry) {
            return url.clone();
        }

        let url = format!("{BLOB_SCHEME}{}", Uuid::new_v4());
        self.blobs.insert(
            url.clone(),
            MediaBlob {
                name: name.to_string(),
                content_type: content_type_for(name),
                bytes,
            },
        );
        self.by_entry.insert(entry.to_string(), url.clone());
        url
    }

    /// Returns the URL already assigned to an archive entry.
    pub fn url_for_entry(&self, entry: &str) -> Option<&str> {
        self.by_entry.get(entry).map(String::as_str)
    }

    pub fn get(&self, url: &str) -> Option<&MediaBlob> {
        self.blobs.get(url)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MediaBlob)> {
        self.blobs.iter().map(|(url, blob)| (url.as_str(), blob))
    }

    /// Keeps only the blobs whose URL satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.blobs.retain(|url, _| keep(url));
        let blobs = &self.blobs;
        self.by_entry.retain(|_, url| blobs.contains_key(url));
    }

    /// Moves all blobs from `other` into this store.
    pub fn extend(&mut self, other: MediaStore) {
        self.blobs.extend(other.blobs);
        self.by_entry.extend(other.by_entry);
    }

    /// Writes every blob into `dir` and returns the URL to path mapping.
    ///
    /// Files are named `<blob id>_<name>` so equal names from different
    /// archives do not overwrite each other.
    pub fn persist(&self, dir: &Path) -> Result<HashMap<String, PathBuf>> {
        fs::create_dir_all(dir)?;

        let mut written = HashMap::with_capacity(self.blobs.len());
        for (url, blob) in &self.blobs {
            let id = url.strip_prefix(BLOB_SCHEME).unwrap_or(url);
            let path = dir.join(format!("{id}_{}", sanitize_file_name(&blob.name)));
            fs::write(&path, &blob.bytes)?;
            written.insert(url.clone(), path);
        }
        Ok(written)
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_pdf_forced() {
        assert_eq!(content_type_for("doc.pdf"), "application/pdf");
        assert_eq!(content_type_for("DOC.PDF"), "application/pdf");
    }

    #[test]
    fn test_content_type_guessed() {
        assert_eq!(content_type_for("photo.jpg"), "image/jpeg");
        assert_eq!(content_type_for("clip.mp4"), "video/mp4");
        assert_eq!(content_type_for("unknown.zzzq"), "application/octet-stream");
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = MediaStore::new();
        let url = store.insert("media/photo.jpg", "photo.jpg", vec![1, 2, 3]);
        assert!(url.starts_with("blob:"));
        let blob = store.get(&url).unwrap();
        assert_eq!(blob.bytes, vec![1, 2, 3]);
        assert_eq!(blob.content_type, "image/jpeg");
        assert_eq!(store.url_for_entry("media/photo.jpg"), Some(url.as_str()));
    }

    #[test]
    fn test_insert_same_entry_once() {
        let mut store = MediaStore::new();
        let a = store.insert("photo.jpg", "photo.jpg", vec![1]);
        let b = store.insert("photo.jpg", "photo.jpg", vec![2]);
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&a).unwrap().bytes, vec![1]);
    }

    #[test]
    fn test_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MediaStore::new();
        let url = store.insert("a/doc.pdf", "doc.pdf", b"%PDF".to_vec());

        let written = store.persist(dir.path()).unwrap();
        let path = &written[&url];
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with("_doc.pdf"));
        assert_eq!(fs::read(path).unwrap(), b"%PDF");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a/b:c.jpg"), "a_b_c.jpg");
    }

    #[test]
    fn test_retain_drops_entry_mapping() {
        let mut store = MediaStore::new();
        let keep = store.insert("a.jpg", "a.jpg", vec![1]);
        store.insert("b.jpg", "b.jpg", vec![2]);

        store.retain(|url| url == keep);
        assert_eq!(store.len(), 1);
        assert!(store.get(&keep).is_some());
        assert_eq!(store.url_for_entry("a.jpg"), Some(keep.as_str()));
        assert!(store.url_for_entry("b.jpg").is_none());
    }
}
