//! Tracking of planlove (and other searches) across runs.
//!
//! For each tracked search a log in the profile directory records every
//! excerpt seen, when it was first seen, and whether it has been shown:
//!
//! ```json
//! {
//!   "gorp": {
//!     "hey [baldwint] how are you": {
//!       "timestamp": "2013-08-05T13:22:00Z",
//!       "unread": false
//!     }
//!   }
//! }
//! ```
//!
//! The log is rebuilt from each fresh set of results, so excerpts that have
//! disappeared from plans drop out of it.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ClansError, IoResultExt, Result},
    hooks::{Extension, SessionContext},
    models::{SearchResult, Tally},
};

pub const NAME: &str = "newlove";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewloveOptions {
    /// Planlove searches to track: `None` tracks only your own, an empty
    /// string tracks all, otherwise a comma-separated list of names
    pub log_love: Option<String>,
    /// Same as `log_love`, for ordinary searches (`None` tracks nothing)
    pub log_search: Option<String>,
    pub order_by_time: bool,
    pub only_new: bool,
    pub keep_unread: bool,
}

impl NewloveOptions {
    /// Whether the results are altered or only recorded.
    pub fn wants_log(&self) -> bool {
        self.order_by_time || self.only_new
    }
}

/// What is known about one excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoveState {
    #[serde(with = "first_seen")]
    pub timestamp: Timestamp,
    pub unread: bool,
}

/// Excerpt states by lover, then by excerpt.
pub type LoveLog = BTreeMap<String, BTreeMap<String, LoveState>>;

mod first_seen {
    use jiff::Timestamp;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::models::FIRST_SEEN_FORMAT;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.strftime(FIRST_SEEN_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Builds the log for `results`: excerpts already in `log` keep their
/// state, new ones are stamped `timestamp` and unread.
///
/// Entries carried over are removed from `log`, leaving behind only the
/// excerpts that have vanished since it was written.
pub fn rebuild_log(log: &mut LoveLog, results: &[SearchResult], timestamp: Timestamp) -> LoveLog {
    let mut rebuilt = LoveLog::new();
    for result in results {
        let mut old = log.get_mut(&result.username);
        let excerpts = rebuilt.entry(result.username.clone()).or_default();
        for excerpt in &result.excerpts {
            let state = old
                .as_mut()
                .and_then(|old| old.remove(excerpt))
                .unwrap_or(LoveState {
                    timestamp,
                    unread: true,
                });
            excerpts.insert(excerpt.clone(), state);
        }
    }
    rebuilt
}

/// One log entry with its keys folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatLove {
    pub lover: String,
    pub text: String,
    pub state: LoveState,
}

pub fn flatten_log(log: &LoveLog) -> Vec<FlatLove> {
    log.iter()
        .flat_map(|(lover, excerpts)| {
            excerpts.iter().map(move |(text, state)| FlatLove {
                lover: lover.clone(),
                text: text.clone(),
                state: *state,
            })
        })
        .collect()
}

/// Reorders or filters `results` using `log`.
///
/// Ordering by time replaces the results with one entry per excerpt,
/// oldest first, each tallied by when it was first seen.
pub fn modify_results(
    results: &mut Vec<SearchResult>,
    log: &LoveLog,
    order_by_time: bool,
    only_new: bool,
) {
    if order_by_time {
        let mut flat = flatten_log(log);
        flat.sort_by_key(|love| love.state.timestamp);
        *results = flat
            .into_iter()
            .filter(|love| !only_new || love.state.unread)
            .map(|love| SearchResult {
                username: love.lover,
                tally: Tally::FirstSeen(love.state.timestamp),
                excerpts: vec![love.text],
            })
            .collect();
    } else if only_new {
        for result in results.iter_mut() {
            let seen = log.get(&result.username);
            result.excerpts.retain(|excerpt| {
                seen.and_then(|s| s.get(excerpt))
                    .map_or(true, |state| state.unread)
            });
        }
    }
}

/// File name of the log for `term`. Path separators are percent-encoded so
/// the log always lands directly in the profile directory.
fn log_file_name(term: &str, suffix: &str) -> String {
    let mut name = String::with_capacity(term.len() + suffix.len() + 1);
    for c in term.chars() {
        match c {
            '%' => name.push_str("%25"),
            '/' => name.push_str("%2F"),
            '\\' => name.push_str("%5C"),
            '\0' => name.push_str("%00"),
            c => name.push(c),
        }
    }
    name.push('.');
    name.push_str(suffix);
    name
}

/// Records search results and optionally shows only the new ones, or shows
/// them in the order they appeared.
#[derive(Debug, Clone)]
pub struct Newlove {
    options: NewloveOptions,
}

impl Newlove {
    pub fn new(options: NewloveOptions) -> Self {
        Self { options }
    }

    /// Whether a search for `term` is tracked for `username`.
    pub fn is_tracked(&self, username: &str, term: &str, planlove: bool) -> bool {
        let configured = if planlove {
            &self.options.log_love
        } else {
            &self.options.log_search
        };
        match configured.as_deref() {
            None => planlove && term == username,
            Some("") => true,
            Some(list) => list.split(',').map(str::trim).any(|t| t == term),
        }
    }

    fn load(path: &Path) -> Result<LoveLog> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LoveLog::new()),
            Err(e) => Err(e).at_path(path),
        }
    }
}

impl Extension for Newlove {
    fn name(&self) -> &'static str {
        NAME
    }

    fn pre_search(&self, ctx: &mut SessionContext, term: &str, planlove: bool) -> Result<()> {
        ctx.take_state::<PathBuf>(NAME);
        if self.is_tracked(ctx.username(), term, planlove) {
            let suffix = if planlove { "love" } else { "search" };
            let path = ctx.profile_dir().join(log_file_name(term, suffix));
            ctx.set_state(NAME, path);
            Ok(())
        } else if self.options.wants_log() {
            Err(ClansError::Extension {
                extension: NAME.to_string(),
                message: format!("Not configured to track '{term}'"),
            })
        } else {
            Ok(())
        }
    }

    fn post_search(&self, ctx: &mut SessionContext, results: &mut Vec<SearchResult>) -> Result<()> {
        let Some(path) = ctx.take_state::<PathBuf>(NAME) else {
            return Ok(());
        };

        let mut old = Self::load(&path)?;
        let now = Timestamp::now();
        let now = Timestamp::from_second(now.as_second()).unwrap_or(now);
        let mut log = rebuild_log(&mut old, results, now);
        if !old.values().all(|excerpts| excerpts.is_empty()) {
            log::debug!("excerpts gone since last search: {old:?}");
        }

        modify_results(
            results,
            &log,
            self.options.order_by_time,
            self.options.only_new,
        );

        if !self.options.keep_unread {
            for state in log.values_mut().flat_map(|excerpts| excerpts.values_mut()) {
                state.unread = false;
            }
        }

        let text = serde_json::to_string_pretty(&log)?;
        std::fs::write(&path, text).at_path(&path)?;
        Ok(())
    }
}
