//! Output formatters.
//!
//! Every way of showing Plans data to the user is a [`PlanFormatter`]. The
//! available kinds form the closed [`FormatKind`] enum, chosen once at
//! startup from the name table in [`FORMATTERS`]:
//!
//! | name    | plan bodies                       | dates                          |
//! |---------|-----------------------------------|--------------------------------|
//! | `raw`   | server HTML, untouched            | `2015-01-28 23:46:00` (UTC)    |
//! | `text`  | markup stripped to plain text     | `Wed January 28 2015, 5:46 PM` |
//! | `color` | markup rendered with ANSI styles  | as `text`                      |
//! | `json`  | server HTML inside JSON documents | `2015-01-28T23:46:00Z`         |
//!
//! ## Module Organization
//!
//! - [`raw`], [`text`], [`color`], [`json`]: the formatter kinds
//! - [`datetime`]: timestamp display wrappers
//! - [`columns`]: terminal grid layout

pub mod color;
pub mod columns;
pub mod datetime;
pub mod json;
pub mod raw;
pub mod text;

use std::{fmt, io, str::FromStr};

use jiff::{tz::TimeZone, Timestamp};
use serde::{Deserialize, Serialize};

pub use color::ColorFormatter;
pub use datetime::{IsoDateTime, ServerDateTime, UtcDateTime};
pub use json::JsonFormatter;
pub use raw::RawFormatter;
pub use text::TextFormatter;

use crate::models::{PlanHeader, Roster, SearchResult};

/// How a list of items is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListLayout {
    /// One item per line
    #[default]
    Plain,
    /// One item per line, prefixed with ` - `
    Bullets,
    /// A grid sized to the longest item, when more than one column fits
    Columns,
}

/// Rendering of Plans data for one output format.
///
/// The provided methods implement the line-oriented layouts shared by the
/// human-readable formats in terms of [`PlanFormatter::filter_html`],
/// [`PlanFormatter::format_date`] and the two styling hooks.
pub trait PlanFormatter {
    /// Converts plan markup to this format's representation.
    fn filter_html(&self, html: &str) -> String;

    /// Renders a timestamp.
    fn format_date(&self, timestamp: &Timestamp) -> String;

    /// Styles a header label such as `Username`.
    fn label(&self, text: &str) -> String {
        text.to_string()
    }

    /// Styles a username the way planlove is shown.
    fn love(&self, username: &str) -> String {
        username.to_string()
    }

    /// Header lines, a blank line, then `body` as given.
    fn format_plan(&self, header: &PlanHeader, body: &str) -> String {
        let date = |ts: &Option<Timestamp>| ts.as_ref().map(|t| self.format_date(t)).unwrap_or_default();
        format!(
            "{}: {}\n{}: {}\n{}: {}\n{}: {}\n\n{}",
            self.label("Username"),
            header.username,
            self.label("Last Updated"),
            date(&header.lastupdated),
            self.label("Last Login"),
            date(&header.lastlogin),
            self.label("Name"),
            header.planname.as_deref().unwrap_or_default(),
            body
        )
    }

    /// Prints `items`, each passed through [`PlanFormatter::filter_html`].
    fn print_list(&self, out: &mut dyn io::Write, items: &[String], layout: ListLayout) -> io::Result<()> {
        let items: Vec<String> = items.iter().map(|i| self.filter_html(i)).collect();
        if layout == ListLayout::Columns {
            if let Some(grid) = columns::grid(&items, columns::TERMINAL_WIDTH) {
                return out.write_all(grid.as_bytes());
            }
        }
        let prefix = if layout == ListLayout::Bullets { " - " } else { "" };
        for item in &items {
            writeln!(out, "{prefix}{item}")?;
        }
        Ok(())
    }

    /// Prints each plan's name and tally followed by its bulleted excerpts.
    fn print_search_results(&self, out: &mut dyn io::Write, results: &[SearchResult]) -> io::Result<()> {
        for result in results {
            writeln!(out, "[{}]: {}\n", self.love(&result.username), result.tally)?;
            self.print_list(out, &result.excerpts, ListLayout::Bullets)?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Prints each autoread tier in order, followed by a blank line.
    fn print_autoread(&self, out: &mut dyn io::Write, roster: &Roster, layout: ListLayout) -> io::Result<()> {
        for (level, names) in roster {
            writeln!(out, "{level}:")?;
            self.print_list(out, names, layout)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

/// The closed set of output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    #[default]
    Raw,
    Text,
    Color,
    Json,
}

/// Registration table of format names.
pub const FORMATTERS: &[(&str, FormatKind)] = &[
    ("raw", FormatKind::Raw),
    ("text", FormatKind::Text),
    ("color", FormatKind::Color),
    ("json", FormatKind::Json),
];

impl FormatKind {
    pub fn name(self) -> &'static str {
        FORMATTERS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("raw", |(name, _)| name)
    }

    /// Instantiates the formatter, rendering human dates in `tz`.
    pub fn formatter(self, tz: TimeZone) -> Box<dyn PlanFormatter> {
        match self {
            FormatKind::Raw => Box::new(RawFormatter),
            FormatKind::Text => Box::new(TextFormatter::new(tz)),
            FormatKind::Color => Box::new(ColorFormatter::new(tz)),
            FormatKind::Json => Box::new(JsonFormatter),
        }
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        FORMATTERS
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                let names: Vec<&str> = FORMATTERS.iter().map(|(name, _)| *name).collect();
                format!("Invalid format: {s} (expected one of {})", names.join(", "))
            })
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
