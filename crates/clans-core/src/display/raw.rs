//! The `raw` format: server markup passed through untouched.

use jiff::Timestamp;

use super::{PlanFormatter, UtcDateTime};

#[derive(Debug, Clone, Copy, Default)]
pub struct RawFormatter;

impl PlanFormatter for RawFormatter {
    fn filter_html(&self, html: &str) -> String {
        html.to_string()
    }

    fn format_date(&self, timestamp: &Timestamp) -> String {
        UtcDateTime(timestamp).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{fixtures, ListLayout};

    #[test]
    fn test_format_date() {
        let ts: Timestamp = "2015-01-28T23:46:00Z".parse().unwrap();
        assert_eq!(RawFormatter.format_date(&ts), "2015-01-28 23:46:00");
    }

    #[test]
    fn test_format_plan() {
        let text = RawFormatter.format_plan(&fixtures::header(), "this is my plan\n");
        assert_eq!(
            text,
            "Username: username\n\
             Last Updated: 2013-08-05 13:22:00\n\
             Last Login: 2013-08-07 03:42:00\n\
             Name: clever catchphrase\n\
             \n\
             this is my plan\n"
        );
    }

    #[test]
    fn test_print_list() {
        let out = fixtures::render(|out| {
            RawFormatter.print_list(out, &fixtures::list(), ListLayout::Plain)
        });
        assert_eq!(out, "one\ntwo\nthree\nfour\n");
    }

    #[test]
    fn test_print_bulleted_list() {
        let out = fixtures::render(|out| {
            RawFormatter.print_list(out, &fixtures::list(), ListLayout::Bullets)
        });
        assert_eq!(out, " - one\n - two\n - three\n - four\n");
    }

    #[test]
    fn test_print_search_results() {
        let out = fixtures::render(|out| {
            RawFormatter.print_search_results(out, &fixtures::search_results())
        });
        assert_eq!(
            out,
            "[plan1]: 1\n\n - snip one <b>term</b> context\n\n\
             [plan2]: 2\n\n - snip one <b>term</b> context\n - snip two <b>term</b> context\n\n\
             [plan3]: 2\n\n - snip <b>term</b> twice <b>term</b> twice\n\n"
        );
    }

    #[test]
    fn test_empty_search_prints_nothing() {
        let out = fixtures::render(|out| RawFormatter.print_search_results(out, &[]));
        assert_eq!(out, "");
    }

    #[test]
    fn test_print_autoread() {
        let out = fixtures::render(|out| {
            RawFormatter.print_autoread(out, &fixtures::roster(), ListLayout::Plain)
        });
        assert_eq!(
            out,
            "Level 1:\nbff\ninteresting\nfunny\ngorp\n\n\
             Level 2:\nroommate\nrando\n\n\
             Level 3:\nmeh\n\n"
        );
    }
}
