//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - Global options and the chosen [`Command`]
//! - [`Command`] - One variant per subcommand
//!
//! Every subcommand works on a JSON library file, `chatvault.json` in the
//! current directory unless `--library` says otherwise.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::chat::{ChatId, PARTICIPANT_DISPLAY_LIMIT};
use crate::config::{ImportConfig, MediaMode};
use crate::core::filter::{DEFAULT_PAGE_LIMIT, MessageQuery};
use crate::error::Result;

/// Default library file.
pub const DEFAULT_LIBRARY: &str = "chatvault.json";

/// Import WhatsApp chat exports into a deduplicated chat library.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatvault")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatvault import 'WhatsApp Chat - Alice.zip' --user Me
    chatvault import export.zip --media-dir media/
    chatvault list
    chatvault show 3f2a... --search lunch --after 2024-01-01
    chatvault delete 3f2a... 9bc1...")]
pub struct Args {
    /// Path to the library file
    #[arg(short, long, global = true, default_value = DEFAULT_LIBRARY)]
    pub library: PathBuf,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Participants shown per chat in `import` and `list` output
    #[arg(long, global = true, value_name = "N", default_value_t = PARTICIPANT_DISPLAY_LIMIT)]
    pub participants: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Import a ZIP export into the library
    Import {
        /// Path to the export archive
        archive: PathBuf,

        /// Your own display name, left out of generated chat names
        #[arg(short, long, value_name = "NAME")]
        user: Option<String>,

        /// Write attachments into this directory and link them from the library
        #[arg(long, value_name = "DIR")]
        media_dir: Option<PathBuf>,
    },

    /// List chats
    List,

    /// Show messages of one chat
    Show {
        /// Chat id (see `list`)
        id: String,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Messages per page
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: usize,

        /// Only messages whose text or author contains this (case-insensitive)
        #[arg(short, long, value_name = "TEXT")]
        search: Option<String>,

        /// Only messages from this author
        #[arg(long, value_name = "AUTHOR")]
        from: Option<String>,

        /// Only messages on or after this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        after: Option<String>,

        /// Only messages on or before this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        before: Option<String>,
    },

    /// Delete chats by id
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete every chat
    Clear,
}

impl Args {
    /// Log filter implied by `-v`.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }

    /// Import configuration for the `import` subcommand.
    ///
    /// Attachments are embedded when they will be written to disk and
    /// referenced by archive path otherwise.
    pub fn import_config(&self) -> Option<ImportConfig> {
        let Command::Import { user, media_dir, .. } = &self.command else {
            return None;
        };
        let mut config = ImportConfig::new()
            .with_participant_display_limit(self.participants)
            .with_media_mode(if media_dir.is_some() {
                MediaMode::Embed
            } else {
                MediaMode::Reference
            });
        if let Some(user) = user {
            config = config.with_current_user(user.clone());
        }
        Some(config)
    }
}

impl Command {
    /// Message query for the `show` subcommand.
    pub fn message_query(&self) -> Option<Result<(ChatId, MessageQuery)>> {
        let Command::Show {
            id,
            page,
            limit,
            search,
            from,
            after,
            before,
        } = self
        else {
            return None;
        };

        let build = || -> Result<MessageQuery> {
            let mut query = MessageQuery::new().with_page(*page).with_limit(*limit);
            if let Some(search) = search {
                query = query.with_search(search.clone());
            }
            if let Some(from) = from {
                query = query.with_author(from.clone());
            }
            if let Some(after) = after {
                query = query.with_date_from(after)?;
            }
            if let Some(before) = before {
                query = query.with_date_to(before)?;
            }
            Ok(query)
        };

        Some(build().map(|query| (ChatId::from(id.as_str()), query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import() {
        let args = Args::parse_from(["chatvault", "import", "export.zip", "--user", "Me"]);
        assert_eq!(args.library, PathBuf::from(DEFAULT_LIBRARY));
        let config = args.import_config().unwrap();
        assert_eq!(config.current_user.as_deref(), Some("Me"));
        assert_eq!(config.media, MediaMode::Reference);
    }

    #[test]
    fn test_media_dir_embeds() {
        let args = Args::parse_from(["chatvault", "import", "x.zip", "--media-dir", "m"]);
        assert_eq!(args.import_config().unwrap().media, MediaMode::Embed);
    }

    #[test]
    fn test_participant_limit() {
        let args = Args::parse_from(["chatvault", "import", "x.zip"]);
        assert_eq!(args.import_config().unwrap().participant_display_limit, 5);

        let args = Args::parse_from(["chatvault", "import", "x.zip", "--participants", "2"]);
        assert_eq!(args.import_config().unwrap().participant_display_limit, 2);

        let args = Args::parse_from(["chatvault", "list", "--participants", "1"]);
        assert_eq!(args.participants, 1);
        assert!(args.import_config().is_none());
    }

    #[test]
    fn test_global_library_after_subcommand() {
        let args = Args::parse_from(["chatvault", "list", "--library", "other.json", "-vv"]);
        assert_eq!(args.library, PathBuf::from("other.json"));
        assert_eq!(args.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_show_query() {
        let args = Args::parse_from([
            "chatvault", "show", "abc", "--page", "2", "--limit", "10", "--search", "hi", "--after",
            "2024-01-01",
        ]);
        let (id, query) = args.command.message_query().unwrap().unwrap();
        assert_eq!(id.as_str(), "abc");
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 10);
        assert_eq!(query.search.as_deref(), Some("hi"));
        assert!(query.after.is_some());
    }

    #[test]
    fn test_show_bad_date() {
        let args = Args::parse_from(["chatvault", "show", "abc", "--before", "yesterday"]);
        assert!(args.command.message_query().unwrap().is_err());
    }

    #[test]
    fn test_delete_requires_ids() {
        assert!(Args::try_parse_from(["chatvault", "delete"]).is_err());
    }
}
