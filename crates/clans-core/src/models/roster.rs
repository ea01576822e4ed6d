//! Autoread roster and planwatch entries.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Unread plans on the autoread list, keyed by tier label ("Level 1", ...).
pub type Roster = BTreeMap<String, Vec<String>>;

/// A plan updated within the planwatch window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentUpdate {
    pub username: String,
    pub updated: Timestamp,
}
