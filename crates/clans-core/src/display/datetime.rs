//! DateTime display utilities.
//!
//! Machines get UTC; people get the server's own timezone, in the same
//! shape Plans shows on its web pages minus the ordinal suffix.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// `2015-01-28 23:46:00`: UTC, no zone designator.
pub struct UtcDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for UtcDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.strftime("%Y-%m-%d %H:%M:%S"))
    }
}

/// `2015-01-28T23:46:00Z`: ISO 8601 in UTC, whole seconds.
pub struct IsoDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for IsoDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.strftime("%Y-%m-%dT%H:%M:%SZ"))
    }
}

/// `Wed January 28 2015, 5:46 PM` in the given timezone.
pub struct ServerDateTime<'a> {
    pub timestamp: &'a Timestamp,
    pub tz: &'a TimeZone,
}

impl fmt::Display for ServerDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.timestamp
                .to_zoned(self.tz.clone())
                .strftime("%a %B %-d %Y, %-I:%M %p")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn test_machine_formats() {
        let t = ts("2015-01-28T23:46:00Z");
        assert_eq!(UtcDateTime(&t).to_string(), "2015-01-28 23:46:00");
        assert_eq!(IsoDateTime(&t).to_string(), "2015-01-28T23:46:00Z");
    }

    #[test]
    fn test_server_format_follows_dst() {
        let tz = TimeZone::get("America/Chicago").unwrap();
        let winter = ts("2015-01-28T23:46:00Z");
        let summer = ts("2012-04-12T20:06:00Z");
        assert_eq!(
            ServerDateTime { timestamp: &winter, tz: &tz }.to_string(),
            "Wed January 28 2015, 5:46 PM"
        );
        assert_eq!(
            ServerDateTime { timestamp: &summer, tz: &tz }.to_string(),
            "Thu April 12 2012, 3:06 PM"
        );
    }
}
