//! Parsing of the server's local date strings.
//!
//! Plans renders times in its own timezone, in two shapes: the long form
//! used on plan headers (`Wed January 28th 2015, 5:46 PM`) and the short
//! form used by planwatch (`01/28/15, 5:46 PM`). Both are converted to UTC
//! [`Timestamp`]s here.

use std::sync::LazyLock;

use jiff::{
    civil::{Date, DateTime, Time},
    tz::TimeZone,
    Timestamp,
};
use regex::{Captures, Regex};

use crate::error::{ClansError, Result};

/// Timezone the public Plans server renders its dates in.
pub const DEFAULT_SERVER_TIMEZONE: &str = "America/Chicago";

static LONG_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z]+,?\s+)?([A-Za-z]+)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4}),?\s+(\d{1,2}):(\d{2})\s*([AaPp][Mm])$",
    )
    .expect("valid regex")
});

static SHORT_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4}),?\s+(\d{1,2}):(\d{2})\s*([AaPp][Mm])$")
        .expect("valid regex")
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Interprets server-local date strings in a fixed timezone.
#[derive(Debug, Clone)]
pub struct ServerClock {
    tz: TimeZone,
}

impl ServerClock {
    /// Clock for the named IANA timezone.
    ///
    /// # Errors
    ///
    /// Returns `ClansError::Configuration` if the zone is unknown.
    pub fn new(zone: &str) -> Result<Self> {
        let tz = TimeZone::get(zone)
            .map_err(|e| ClansError::configuration(format!("unknown timezone '{zone}': {e}")))?;
        Ok(Self { tz })
    }

    pub fn timezone(&self) -> &TimeZone {
        &self.tz
    }

    /// Parses the long header form, e.g. `Wed January 28th 2015, 5:46 PM`.
    pub fn parse_long(&self, text: &str) -> Result<Timestamp> {
        let caps = LONG_FORM
            .captures(text.trim())
            .ok_or_else(|| ClansError::parse(format!("unrecognized date '{text}'")))?;
        let month_name = caps[1].to_ascii_lowercase();
        let month = MONTHS
            .iter()
            .position(|m| *m == month_name || (month_name.len() >= 3 && m.starts_with(&month_name)))
            .ok_or_else(|| ClansError::parse(format!("unrecognized month in '{text}'")))?;
        let day = number(&caps, 2, text)?;
        let year = number(&caps, 3, text)?;
        self.resolve(text, year, month as i64 + 1, day, &caps, 4)
    }

    /// Parses the short planwatch form, e.g. `01/28/15, 5:46 PM`.
    pub fn parse_short(&self, text: &str) -> Result<Timestamp> {
        let caps = SHORT_FORM
            .captures(text.trim())
            .ok_or_else(|| ClansError::parse(format!("unrecognized date '{text}'")))?;
        let month = number(&caps, 1, text)?;
        let day = number(&caps, 2, text)?;
        let mut year = number(&caps, 3, text)?;
        if caps[3].len() == 2 {
            year += 2000;
        }
        self.resolve(text, year, month, day, &caps, 4)
    }

    /// Parses either form.
    pub fn parse(&self, text: &str) -> Result<Timestamp> {
        self.parse_long(text).or_else(|_| self.parse_short(text))
    }

    fn resolve(
        &self,
        text: &str,
        year: i64,
        month: i64,
        day: i64,
        caps: &Captures<'_>,
        first_time_group: usize,
    ) -> Result<Timestamp> {
        let hour12 = number(caps, first_time_group, text)?;
        let minute = number(caps, first_time_group + 1, text)?;
        let pm = caps[first_time_group + 2].eq_ignore_ascii_case("pm");
        if !(1..=12).contains(&hour12) {
            return Err(ClansError::parse(format!("invalid hour in '{text}'")));
        }
        let hour = (hour12 % 12) + if pm { 12 } else { 0 };

        let invalid = |e: jiff::Error| ClansError::parse(format!("invalid date '{text}': {e}"));
        let date = Date::new(year as i16, month as i8, day as i8).map_err(invalid)?;
        let time = Time::new(hour as i8, minute as i8, 0, 0).map_err(invalid)?;
        let zoned = DateTime::from_parts(date, time)
            .to_zoned(self.tz.clone())
            .map_err(invalid)?;
        Ok(zoned.timestamp())
    }
}

impl Default for ServerClock {
    fn default() -> Self {
        let tz = TimeZone::get(DEFAULT_SERVER_TIMEZONE).unwrap_or(TimeZone::UTC);
        Self { tz }
    }
}

fn number(caps: &Captures<'_>, group: usize, text: &str) -> Result<i64> {
    caps[group]
        .parse()
        .map_err(|_| ClansError::parse(format!("invalid number in '{text}'")))
}
