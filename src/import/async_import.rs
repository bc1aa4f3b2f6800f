//! Async import for use with tokio.
//!
//! ZIP decoding and parsing are CPU-bound, so the whole import runs on the
//! blocking pool. Inputs are moved into the task; dropping the returned
//! future leaves the caller's library untouched, since the new state is only
//! delivered through the result.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatvault::prelude::*;
//! use chatvault::import::import_file_async;
//!
//! # async fn example() -> chatvault::Result<()> {
//! let library = ChatLibrary::load("chatvault.json")?;
//! let result = import_file_async("export.zip", library, ImportConfig::new()).await?;
//! result.library.save("chatvault.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! This module requires the `async` feature to be enabled:
//!
//! ```toml
//! [dependencies]
//! chatvault = { version = "0.1", features = ["async"] }
//! ```

use std::io::Cursor;
use std::path::Path;

use tokio::fs;

use super::{ImportResult, import_archive, import_source};
use crate::config::ImportConfig;
use crate::core::library::ChatLibrary;
use crate::error::{ChatvaultError, Result};

/// Imports an in-memory archive on the blocking pool.
pub async fn import_archive_async(
    bytes: Vec<u8>,
    library: ChatLibrary,
    config: ImportConfig,
) -> Result<ImportResult> {
    tokio::task::spawn_blocking(move || import_archive(&bytes, &library, &config))
        .await
        .map_err(|e| ChatvaultError::Task(e.to_string()))?
}

/// Reads an archive asynchronously, then imports it on the blocking pool.
///
/// Reference-mode URLs name the archive, as with
/// [`import_file`](super::import_file).
pub async fn import_file_async(
    path: impl AsRef<Path>,
    library: ChatLibrary,
    config: ImportConfig,
) -> Result<ImportResult> {
    let path = fs::canonicalize(path.as_ref()).await?;
    let bytes = fs::read(&path).await?;
    tokio::task::spawn_blocking(move || {
        import_source(Cursor::new(&bytes), Some(&path), &library, &config)
    })
    .await
    .map_err(|e| ChatvaultError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    use super::*;

    fn chat_zip() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("_chat.txt", SimpleFileOptions::default()).unwrap();
        writer
            .write_all(b"1/2/23, 9:00 AM - Alice: Hi\n1/2/23, 9:01 AM - Bob: Yo\n")
            .unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_import_archive_async() {
        let result = import_archive_async(chat_zip(), ChatLibrary::new(), ImportConfig::new())
            .await
            .unwrap();
        assert_eq!(result.stats.added, 1);
        assert_eq!(result.library.chats()[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_import_file_async_missing_file() {
        let err = import_file_async("/nonexistent/export.zip", ChatLibrary::new(), ImportConfig::new())
            .await
            .unwrap_err();
        assert!(err.is_io());
    }
}
