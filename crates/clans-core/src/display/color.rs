//! The `color` format: plain text decorated with ANSI escapes.

use jiff::{tz::TimeZone, Timestamp};

use super::{
    text::{filter_markup, Styles},
    PlanFormatter, ServerDateTime,
};

const BRIGHT: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const NORMAL: &str = "\x1b[22m";
const UNDERLINE: &str = "\x1b[4m";
const RESET_ALL: &str = "\x1b[0m";
const STRIKE: &str = "\x1b[9m";
const NO_STRIKE: &str = "\x1b[29m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const MAGENTA: &str = "\x1b[35m";
const DEFAULT_FG: &str = "\x1b[39m";

pub const COLOR: Styles = Styles {
    bold: (BRIGHT, NORMAL),
    italic: (DIM, NORMAL),
    underline: (UNDERLINE, RESET_ALL),
    strike: (STRIKE, NO_STRIKE),
    // bright blue
    love: ("\x1b[1m\x1b[34m", "\x1b[22m\x1b[39m"),
    link_url: (GREEN, DEFAULT_FG),
    link_text: (MAGENTA, DEFAULT_FG),
    rule: (RED, DEFAULT_FG),
};

/// Terminal text with ANSI styles, dates in the server's timezone.
#[derive(Debug, Clone)]
pub struct ColorFormatter {
    tz: TimeZone,
}

impl ColorFormatter {
    pub fn new(tz: TimeZone) -> Self {
        Self { tz }
    }
}

impl PlanFormatter for ColorFormatter {
    fn filter_html(&self, html: &str) -> String {
        filter_markup(html, &COLOR)
    }

    fn format_date(&self, timestamp: &Timestamp) -> String {
        ServerDateTime {
            timestamp,
            tz: &self.tz,
        }
        .to_string()
    }

    fn label(&self, text: &str) -> String {
        format!("{BRIGHT}{text}{NORMAL}")
    }

    fn love(&self, username: &str) -> String {
        let (open, close) = COLOR.love;
        format!("{open}{username}{close}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::fixtures;

    fn fmt() -> ColorFormatter {
        ColorFormatter::new(TimeZone::get("America/Chicago").unwrap())
    }

    #[test]
    fn test_format_plan_bolds_labels() {
        let text = fmt().format_plan(&fixtures::header(), "this is my plan\n");
        assert_eq!(
            text,
            "\x1b[1mUsername\x1b[22m: username\n\
             \x1b[1mLast Updated\x1b[22m: Mon August 5 2013, 8:22 AM\n\
             \x1b[1mLast Login\x1b[22m: Tue August 6 2013, 10:42 PM\n\
             \x1b[1mName\x1b[22m: clever catchphrase\n\
             \n\
             this is my plan\n"
        );
    }

    #[test]
    fn test_tag_styling() {
        assert_eq!(
            fmt().filter_html("This is <b>bold</b> and <i>italic</i>"),
            "This is \x1b[1mbold\x1b[22m and \x1b[2mitalic\x1b[22m"
        );
    }

    #[test]
    fn test_underline_and_strike() {
        assert_eq!(
            fmt().filter_html(r#"This is <span class="underline">underlined</span><!--u-->"#),
            "This is \x1b[4munderlined\x1b[0m"
        );
        assert_eq!(
            fmt().filter_html(r#"<span class="strike">oops</span><!--strike-->"#),
            "\x1b[9moops\x1b[29m"
        );
    }

    #[test]
    fn test_link_formatting() {
        assert_eq!(
            fmt().filter_html(
                r#"<a href="http://www.facebook.com/" class="onplan">my favorite website</a>"#
            ),
            "[\x1b[32mhttp://www.facebook.com/\x1b[39m|\x1b[35mmy favorite website\x1b[39m]"
        );
    }

    #[test]
    fn test_love_formatting() {
        assert_eq!(
            fmt().filter_html(r#"[<a href="read.php?searchname=gorp" class="planlove">GORP</a>]"#),
            "[\x1b[1m\x1b[34mGORP\x1b[22m\x1b[39m]"
        );
    }

    #[test]
    fn test_hr_formatting() {
        let expected = format!("I need a clean\n\x1b[31m{}\x1b[39m\nbreak", "=".repeat(70));
        assert_eq!(fmt().filter_html("I need a clean\n<hr>break"), expected);
    }

    #[test]
    fn test_print_search_results() {
        let out = fixtures::render(|out| fmt().print_search_results(out, &fixtures::search_results()));
        let (bold, unbold) = ("\x1b[1m", "\x1b[22m");
        let (link, unlink) = ("\x1b[1m\x1b[34m", "\x1b[22m\x1b[39m");
        let expected = format!(
            "[{link}plan1{unlink}]: 1\n\n - snip one {bold}term{unbold} context\n\n\
             [{link}plan2{unlink}]: 2\n\n - snip one {bold}term{unbold} context\n - snip two {bold}term{unbold} context\n\n\
             [{link}plan3{unlink}]: 2\n\n - snip {bold}term{unbold} twice {bold}term{unbold} twice\n\n"
        );
        assert_eq!(out, expected);
    }
}
