//! Property-based tests for chatvault.
//!
//! These tests generate random transcripts to check round-trip stability,
//! import idempotence and merge monotonicity.

use std::io::{Cursor, Write};

use proptest::prelude::*;

use chatvault::Message;
use chatvault::core::merge::{new_messages, set_difference};
use chatvault::prelude::*;
use chatvault::transcript::{parse_transcript, to_transcript};
use zip::write::SimpleFileOptions;

/// Generate a random header-shaped message using fast strategies (no regex!)
fn arb_message() -> impl Strategy<Value = Message> {
    (
        prop::sample::select(vec![
            "Alice".to_string(),
            "Bob".to_string(),
            "Иван".to_string(),
            "+1 555 0100".to_string(),
            "Me".to_string(),
        ]),
        prop::sample::select(vec![
            "1/2/23, 9:00 AM".to_string(),
            "1/2/23, 9:01\u{202F}PM".to_string(),
            "15.01.2024, 10:30".to_string(),
            "2024-01-15 10:30".to_string(),
        ]),
        prop::sample::select(vec![
            "Hello".to_string(),
            String::new(),
            "two\nlines".to_string(),
            "trailing blank\n".to_string(),
            "<attached: photo.jpg>".to_string(),
            "time 10:30: colon".to_string(),
            "Привет 🎉".to_string(),
        ]),
    )
        .prop_map(|(author, timestamp, content)| Message::new(author, timestamp, content))
}

fn arb_messages(max_len: usize) -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec(arb_message(), 1..max_len)
}

fn zip_of(transcript: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("_chat.txt", SimpleFileOptions::default()).unwrap();
    writer.write_all(transcript.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Serializing parsed messages and parsing again gives the same messages.
    #[test]
    fn prop_transcript_round_trip(messages in arb_messages(20)) {
        let first = parse_transcript(&to_transcript(&messages));
        let second = parse_transcript(&to_transcript(&first));
        prop_assert_eq!(second, first);
    }

    /// Identity fields survive the round trip unchanged.
    #[test]
    fn prop_round_trip_keeps_identity(messages in arb_messages(20)) {
        let parsed = parse_transcript(&to_transcript(&messages));
        prop_assert_eq!(parsed.len(), messages.len());
        for (a, b) in parsed.iter().zip(&messages) {
            prop_assert!(a.is_same(b));
        }
    }

    /// Importing the same archive twice changes nothing the second time.
    #[test]
    fn prop_import_idempotent(messages in arb_messages(15)) {
        let bytes = zip_of(&to_transcript(&messages));
        let config = ImportConfig::new().with_media_mode(MediaMode::Reference);

        let first = import_archive(&bytes, &ChatLibrary::new(), &config).unwrap();
        let second = import_archive(&bytes, &first.library, &config).unwrap();

        prop_assert_eq!(second.stats.added, 0);
        prop_assert_eq!(second.stats.updated, 0);
        prop_assert_eq!(second.stats.skipped, first.stats.messages_added);
        prop_assert_eq!(second.library, first.library);
    }

    /// Merging a cumulative export appends exactly the new tail.
    #[test]
    fn prop_cumulative_merge_appends_tail(messages in arb_messages(20), cut in 0usize..20) {
        let cut = cut.min(messages.len());
        let found = new_messages(&messages[..cut], messages.clone());

        let mut merged = messages[..cut].to_vec();
        merged.extend(found.messages);
        prop_assert_eq!(merged.len(), messages.len());
        prop_assert_eq!(found.duplicates, cut);
    }

    /// The fallback never yields a message that is already stored, and never
    /// loses one that is not.
    #[test]
    fn prop_set_difference_is_exact(existing in arb_messages(10), parsed in arb_messages(10)) {
        let fresh = set_difference(&existing, parsed.clone());
        for m in &fresh {
            prop_assert!(!existing.iter().any(|e| e.is_same(m)));
        }
        let expected = parsed.iter().filter(|p| !existing.iter().any(|e| e.is_same(p))).count();
        prop_assert_eq!(fresh.len(), expected);
    }
}
