//! Querying the messages of one chat.
//!
//! [`MessageQuery`] combines text search, author and date filters with
//! 1-based pagination. [`apply_query`] runs it over a message slice and
//! returns a [`MessagePage`].
//!
//! # Filter Types
//!
//! | Filter | Method | Description |
//! |--------|--------|-------------|
//! | Search | [`with_search`](MessageQuery::with_search) | Content or author contains text (case-insensitive) |
//! | Author | [`with_author`](MessageQuery::with_author) | Messages from one author (ASCII case-insensitive) |
//! | Date from | [`with_date_from`](MessageQuery::with_date_from) | Messages on or after date |
//! | Date to | [`with_date_to`](MessageQuery::with_date_to) | Messages on or before date |
//!
//! # Example
//!
//! ```
//! use chatvault::Message;
//! use chatvault::core::filter::{MessageQuery, apply_query};
//!
//! # fn main() -> chatvault::Result<()> {
//! let messages = vec![
//!     Message::new("Alice", "1/2/23, 9:00 AM", "Lunch?"),
//!     Message::new("Bob", "1/2/23, 9:01 AM", "lunch at noon"),
//!     Message::new("Alice", "1/2/23, 9:02 AM", "ok"),
//! ];
//!
//! let query = MessageQuery::new().with_search("LUNCH").with_limit(1);
//! let page = apply_query(&messages, &query)?;
//!
//! assert_eq!(page.total, 2);
//! assert_eq!(page.items.len(), 1);
//! assert_eq!(page.total_pages(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - Date filters compare against [`Message::sent_at`]; messages whose
//!   timestamp could not be parsed are **excluded** while a date filter is
//!   active
//! - All filters are combined with AND logic

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::Message;
use crate::error::{ChatvaultError, Result};

/// Page size used when none is given.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Filters plus pagination for one chat's messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    /// Case-insensitive substring of the content or the author.
    pub search: Option<String>,

    /// Include only messages from this author.
    pub author: Option<String>,

    /// Include only messages sent on or after this instant.
    pub after: Option<NaiveDateTime>,

    /// Include only messages sent on or before this instant.
    pub before: Option<NaiveDateTime>,

    /// 1-based page number.
    pub page: usize,

    /// Messages per page.
    pub limit: usize,
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            search: None,
            author: None,
            after: None,
            before: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl MessageQuery {
    /// Creates a query that matches everything, first page.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = (!text.is_empty()).then_some(text);
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Sets the start date (inclusive). Date format: `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatvaultError::InvalidDate`] if the format is invalid.
    pub fn with_date_from(mut self, date_str: &str) -> Result<Self> {
        self.after = Some(parse_date(date_str)?.and_time(NaiveTime::MIN));
        Ok(self)
    }

    /// Sets the end date (inclusive, through the end of that day).
    ///
    /// # Errors
    ///
    /// Returns [`ChatvaultError::InvalidDate`] if the format is invalid.
    pub fn with_date_to(mut self, date_str: &str) -> Result<Self> {
        // End of the day to include the full day
        self.before = parse_date(date_str)?.and_hms_opt(23, 59, 59);
        Ok(self)
    }

    /// Sets the start instant directly.
    #[must_use]
    pub fn with_after(mut self, dt: NaiveDateTime) -> Self {
        self.after = Some(dt);
        self
    }

    /// Sets the end instant directly.
    #[must_use]
    pub fn with_before(mut self, dt: NaiveDateTime) -> Self {
        self.before = Some(dt);
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns `true` if any filter is active.
    pub fn is_filtering(&self) -> bool {
        self.search.is_some() || self.author.is_some() || self.has_date_filter()
    }

    /// Returns `true` if date filters are active.
    pub fn has_date_filter(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }

    /// Returns `true` if `msg` passes every active filter.
    pub fn matches(&self, msg: &Message) -> bool {
        if let Some(ref author) = self.author {
            if !msg.author.eq_ignore_ascii_case(author) {
                return false;
            }
        }

        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            if !msg.content.to_lowercase().contains(&needle)
                && !msg.author.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if self.has_date_filter() {
            let Some(sent_at) = msg.sent_at else {
                return false;
            };
            if self.after.is_some_and(|after| sent_at < after) {
                return false;
            }
            if self.before.is_some_and(|before| sent_at > before) {
                return false;
            }
        }

        true
    }

    fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(ChatvaultError::invalid_query("page numbers start at 1"));
        }
        if self.limit == 0 {
            return Err(ChatvaultError::invalid_query("limit must be at least 1"));
        }
        if let (Some(after), Some(before)) = (self.after, self.before) {
            if after > before {
                return Err(ChatvaultError::invalid_query(
                    "start date is after end date",
                ));
            }
        }
        Ok(())
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| ChatvaultError::invalid_date(date_str))
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub page: usize,
    pub limit: usize,
    /// Matching messages across all pages.
    pub total: usize,
}

impl MessagePage {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.limit.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Runs a query over messages in stored order.
///
/// A page past the end is empty, not an error.
///
/// # Errors
///
/// Returns [`ChatvaultError::InvalidQuery`] for page 0, limit 0, or a start
/// date after the end date.
pub fn apply_query(messages: &[Message], query: &MessageQuery) -> Result<MessagePage> {
    query.validate()?;

    let matching: Vec<&Message> = messages.iter().filter(|m| query.matches(m)).collect();
    let offset = (query.page - 1).saturating_mul(query.limit);
    let items = matching
        .iter()
        .skip(offset)
        .take(query.limit)
        .map(|m| (*m).clone())
        .collect();

    Ok(MessagePage {
        items,
        page: query.page,
        limit: query.limit,
        total: matching.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_msg(author: &str, content: &str, day: Option<&str>) -> Message {
        let mut msg = Message::new(author, "raw", content);
        if let Some(day) = day {
            let naive = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
            msg.sent_at = Some(naive.and_hms_opt(12, 0, 0).unwrap());
        }
        msg
    }

    #[test]
    fn test_filter_by_author() {
        let messages = vec![
            make_msg("Alice", "Hello", None),
            make_msg("Bob", "Hi", None),
            make_msg("alice", "Bye", None),
        ];

        let page = apply_query(&messages, &MessageQuery::new().with_author("ALICE")).unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|m| m.author.eq_ignore_ascii_case("alice")));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let messages = vec![
            make_msg("Alice", "See you at the Café", None),
            make_msg("Bob", "nope", None),
        ];
        let page = apply_query(&messages, &MessageQuery::new().with_search("café")).unwrap();
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_search_matches_author() {
        let messages = vec![
            make_msg("Bobby Tables", "hi", None),
            make_msg("Alice", "nothing here", None),
        ];
        let page = apply_query(&messages, &MessageQuery::new().with_search("bob")).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].author, "Bobby Tables");
    }

    #[test]
    fn test_empty_search_is_ignored() {
        let query = MessageQuery::new().with_search("");
        assert!(!query.is_filtering());
    }

    #[test]
    fn test_date_range_inclusive() {
        let messages = vec![
            make_msg("Alice", "Old", Some("2024-01-01")),
            make_msg("Alice", "Mid", Some("2024-06-15")),
            make_msg("Alice", "New", Some("2024-12-31")),
        ];

        let query = MessageQuery::new()
            .with_date_from("2024-06-15")
            .unwrap()
            .with_date_to("2024-12-31")
            .unwrap();
        let page = apply_query(&messages, &query).unwrap();

        let contents: Vec<_> = page.items.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Mid", "New"]);
    }

    #[test]
    fn test_instant_bounds() {
        let messages = vec![
            make_msg("Alice", "Old", Some("2024-01-01")),
            make_msg("Alice", "Mid", Some("2024-06-15")),
            make_msg("Alice", "New", Some("2024-12-31")),
        ];
        let noon = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let exact = MessageQuery::new().with_after(noon).with_before(noon);
        let page = apply_query(&messages, &exact).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].content, "Mid");

        let later = MessageQuery::new().with_after(noon + chrono::Duration::seconds(1));
        assert_eq!(apply_query(&messages, &later).unwrap().total, 1);

        let inverted = MessageQuery::new()
            .with_after(noon)
            .with_before(noon - chrono::Duration::seconds(1));
        assert!(apply_query(&messages, &inverted).is_err());
    }

    #[test]
    fn test_unparsed_timestamp_excluded_when_date_filter() {
        let messages = vec![
            make_msg("Alice", "With date", Some("2024-06-15")),
            make_msg("Alice", "No date", None),
        ];

        let query = MessageQuery::new().with_date_from("2024-01-01").unwrap();
        let page = apply_query(&messages, &query).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].content, "With date");
    }

    #[test]
    fn test_invalid_date() {
        let err = MessageQuery::new().with_date_from("15/06/2024").unwrap_err();
        assert!(err.is_invalid_date());
    }

    #[test]
    fn test_pagination() {
        let messages: Vec<_> = (0..5).map(|i| make_msg("A", &i.to_string(), None)).collect();

        let page = apply_query(&messages, &MessageQuery::new().with_limit(2).with_page(3)).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].content, "4");
        assert_eq!(page.total_pages(), 3);
        assert!(!page.has_next());

        let past_end = apply_query(&messages, &MessageQuery::new().with_limit(2).with_page(9)).unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 5);
    }

    #[test]
    fn test_invalid_pagination() {
        assert!(apply_query(&[], &MessageQuery::new().with_page(0)).is_err());
        assert!(apply_query(&[], &MessageQuery::new().with_limit(0)).is_err());
    }

    #[test]
    fn test_reversed_range_rejected() {
        let query = MessageQuery::new()
            .with_date_from("2024-06-01")
            .unwrap()
            .with_date_to("2024-01-01")
            .unwrap();
        assert!(apply_query(&[], &query).is_err());
    }
}
