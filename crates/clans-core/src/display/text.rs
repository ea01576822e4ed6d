//! The `text` format, and the markup filter it shares with `color`.

use std::sync::LazyLock;

use jiff::{tz::TimeZone, Timestamp};
use regex::{Captures, Regex};

use super::{PlanFormatter, ServerDateTime};

/// Width of the rule that replaces `<hr>`.
pub const RULE_WIDTH: usize = 70;

/// Opening and closing decorations applied by [`filter_markup`].
#[derive(Debug, Clone, Copy)]
pub struct Styles {
    pub bold: (&'static str, &'static str),
    pub italic: (&'static str, &'static str),
    pub underline: (&'static str, &'static str),
    pub strike: (&'static str, &'static str),
    pub love: (&'static str, &'static str),
    pub link_url: (&'static str, &'static str),
    pub link_text: (&'static str, &'static str),
    pub rule: (&'static str, &'static str),
}

pub const PLAIN: Styles = Styles {
    bold: ("", ""),
    italic: ("", ""),
    underline: ("", ""),
    strike: ("", ""),
    love: ("", ""),
    link_url: ("", ""),
    link_text: ("", ""),
    rule: ("", ""),
};

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect("valid regex"));
    };
}

pattern!(BOLD, r"(?s)<b>(.+?)</b>");
pattern!(ITALIC, r"(?s)<i>(.+?)</i>");
pattern!(TELETYPE, r"(?s)<tt>(.+?)</tt>");
pattern!(UNDERLINE, r#"(?s)<span class="underline">(.+?)</span><!--u-->"#);
pattern!(STRIKE, r#"(?s)<span class="strike">(.+?)</span><!--strike-->"#);
pattern!(LOVE, r#"(?s)<a href=\S* class="planlove">(.+?)</a>"#);
pattern!(LINK, r#"(?s)<a href="([^"]*)" class="onplan">(.+?)</a>"#);
pattern!(SUB, r#"(?s)<p class="sub">(.*?)</p>"#);
pattern!(BREAK, r"<br ?/?>");
pattern!(RULE, r"<hr ?/?>");

fn wrap(re: &Regex, html: &str, (open, close): (&str, &str)) -> String {
    re.replace_all(html, |c: &Captures<'_>| format!("{open}{}{close}", &c[1]))
        .into_owned()
}

/// Reduces plan markup to terminal text, decorating with `styles`.
///
/// Source line breaks are dropped first, since the markup's own `<br>`
/// carries the layout. Entities are decoded last so escaped markup is never
/// mistaken for tags.
pub fn filter_markup(html: &str, styles: &Styles) -> String {
    let mut s: String = html.chars().filter(|c| *c != '\r' && *c != '\n').collect();

    s = wrap(&BOLD, &s, styles.bold);
    s = wrap(&ITALIC, &s, styles.italic);
    s = wrap(&TELETYPE, &s, ("", ""));
    s = wrap(&UNDERLINE, &s, styles.underline);
    s = wrap(&STRIKE, &s, styles.strike);
    s = wrap(&LOVE, &s, styles.love);
    s = LINK
        .replace_all(&s, |c: &Captures<'_>| {
            let (url, text) = (&c[1], &c[2]);
            let (uo, uc) = styles.link_url;
            if url == text {
                format!("[{uo}{url}{uc}]")
            } else {
                let (to, tc) = styles.link_text;
                format!("[{uo}{url}{uc}|{to}{text}{tc}]")
            }
        })
        .into_owned();
    s = wrap(&SUB, &s, ("", ""));
    s = BREAK.replace_all(&s, "\n").into_owned();

    let (ro, rc) = styles.rule;
    let rule = format!("\n{ro}{}{rc}\n", "=".repeat(RULE_WIDTH));
    s = RULE.replace_all(&s, regex::NoExpand(&rule)).into_owned();

    s.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

/// Plain text in the server's timezone.
#[derive(Debug, Clone)]
pub struct TextFormatter {
    tz: TimeZone,
}

impl TextFormatter {
    pub fn new(tz: TimeZone) -> Self {
        Self { tz }
    }
}

impl PlanFormatter for TextFormatter {
    fn filter_html(&self, html: &str) -> String {
        filter_markup(html, &PLAIN)
    }

    fn format_date(&self, timestamp: &Timestamp) -> String {
        ServerDateTime {
            timestamp,
            tz: &self.tz,
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{fixtures, ListLayout};

    fn fmt() -> TextFormatter {
        TextFormatter::new(TimeZone::get("America/Chicago").unwrap())
    }

    #[test]
    fn test_format_date() {
        let winter: Timestamp = "2015-01-28T23:46:00Z".parse().unwrap();
        let summer: Timestamp = "2012-04-12T20:06:00Z".parse().unwrap();
        assert_eq!(fmt().format_date(&winter), "Wed January 28 2015, 5:46 PM");
        assert_eq!(fmt().format_date(&summer), "Thu April 12 2012, 3:06 PM");
    }

    #[test]
    fn test_format_plan_uses_server_time() {
        assert_eq!(
            fmt().format_plan(&fixtures::header(), "this is my plan\n"),
            "Username: username\n\
             Last Updated: Mon August 5 2013, 8:22 AM\n\
             Last Login: Tue August 6 2013, 10:42 PM\n\
             Name: clever catchphrase\n\
             \n\
             this is my plan\n"
        );
    }

    #[test]
    fn test_br_stripping() {
        assert_eq!(
            fmt().filter_html("one<br>two<br/>three<br />four"),
            "one\ntwo\nthree\nfour"
        );
    }

    #[test]
    fn test_crlf_stripping() {
        assert_eq!(
            fmt().filter_html("one\ntwo\rthree\r\nfour"),
            "onetwothreefour"
        );
    }

    #[test]
    fn test_html_escapes() {
        assert_eq!(
            fmt().filter_html("I develop in a &quot;quick &amp; dirty&quot; &lt;style&gt;"),
            "I develop in a \"quick & dirty\" <style>"
        );
    }

    #[test]
    fn test_escaped_markup_is_not_stripped() {
        assert_eq!(fmt().filter_html("&lt;b&gt;x&lt;/b&gt;"), "<b>x</b>");
    }

    #[test]
    fn test_tag_stripping() {
        assert_eq!(
            fmt().filter_html("This is <b>bold</b> and <i>italic</i> and <tt>mono</tt>"),
            "This is bold and italic and mono"
        );
    }

    #[test]
    fn test_underline_and_strike() {
        assert_eq!(
            fmt().filter_html(
                r#"This is <span class="underline">underlined</span><!--u--> and <span class="strike">gone</span><!--strike-->"#
            ),
            "This is underlined and gone"
        );
    }

    #[test]
    fn test_link_formatting() {
        assert_eq!(
            fmt().filter_html(
                r#"<a href="http://www.facebook.com/" class="onplan">my favorite website</a>"#
            ),
            "[http://www.facebook.com/|my favorite website]"
        );
        assert_eq!(
            fmt().filter_html(r#"<a href="http://x.org/" class="onplan">http://x.org/</a>"#),
            "[http://x.org/]"
        );
    }

    #[test]
    fn test_love_formatting() {
        assert_eq!(
            fmt().filter_html(r#"[<a href="read.php?searchname=gorp" class="planlove">GORP</a>]"#),
            "[GORP]"
        );
    }

    #[test]
    fn test_psub_formatting() {
        assert_eq!(
            fmt().filter_html(r#"<p class="sub">we all live in a yellow</p>"#),
            "we all live in a yellow"
        );
    }

    #[test]
    fn test_hr_formatting() {
        let expected = format!("I need a clean\n{}\nbreak", "=".repeat(70));
        assert_eq!(fmt().filter_html("I need a clean\n<hr>break"), expected);
    }

    #[test]
    fn test_print_list_in_columns() {
        let out = fixtures::render(|out| {
            fmt().print_list(out, &fixtures::list(), ListLayout::Columns)
        });
        assert_eq!(out, "one    two    three  four\n");
    }

    #[test]
    fn test_print_search_results() {
        let out = fixtures::render(|out| fmt().print_search_results(out, &fixtures::search_results()));
        assert_eq!(
            out,
            "[plan1]: 1\n\n - snip one term context\n\n\
             [plan2]: 2\n\n - snip one term context\n - snip two term context\n\n\
             [plan3]: 2\n\n - snip term twice term twice\n\n"
        );
    }
}
