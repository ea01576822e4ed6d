//! Search results grouped by the plan they were found on.

use std::fmt;

use jiff::Timestamp;
use serde::{ser::SerializeTuple, Serialize, Serializer};

/// Format used for first-seen times in newlove output and logs.
pub const FIRST_SEEN_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// What the second column of a search result reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    /// Number of occurrences the server counted on the plan
    Count(u32),
    /// When an excerpt was first noticed, for time-ordered love
    FirstSeen(Timestamp),
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tally::Count(n) => write!(f, "{n}"),
            Tally::FirstSeen(ts) => write!(f, "{}", ts.strftime(FIRST_SEEN_FORMAT)),
        }
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tally::Count(n) => serializer.serialize_u32(*n),
            Tally::FirstSeen(_) => serializer.collect_str(self),
        }
    }
}

/// One plan's hits for a search term.
///
/// `excerpts` may be shorter than the count, since the server merges
/// overlapping excerpts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub username: String,
    pub tally: Tally,
    pub excerpts: Vec<String>,
}

impl SearchResult {
    pub fn new(username: impl Into<String>, count: u32, excerpts: Vec<String>) -> Self {
        Self {
            username: username.into(),
            tally: Tally::Count(count),
            excerpts,
        }
    }
}

// Serialized as `[username, count, [excerpts...]]`.
impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.username)?;
        tuple.serialize_element(&self.tally)?;
        tuple.serialize_element(&self.excerpts)?;
        tuple.end()
    }
}
