//! Extraction of structured data from Plans pages.
//!
//! A [`Page`] wraps one HTML response. The document is parsed with an
//! error-tolerant HTML5 parser for navigation; anything that must survive
//! byte-for-byte (the edit textarea, plan bodies, search excerpts) is either
//! sliced from the raw response or re-serialized through [`crate::canon`].
//!
//! `Page` holds a parsed DOM that is not `Send`; callers extract what they
//! need and drop it before awaiting anything else.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::{
    canon,
    dates::ServerClock,
    error::{ClansError, Result},
    fingerprint::Fingerprint,
    models::{Banner, BannerKind, EditBuffer, Plan, PlanHeader, SearchResult},
};

const BUG_REPORT_HOST: &str = "code.google.com";
const BUG_REPORT_PATH: &str = "/p/grinnellplans/issues/entry";

/// Message carried by a missing edit form.
pub const NO_EDIT_TEXT: &str = "Couldn't get edit text, are we logged in?";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ClansError::parse(format!("bad selector '{css}': {e:?}")))
}

/// A parsed Plans page.
pub struct Page<'a> {
    raw: &'a str,
    doc: Html,
}

impl<'a> Page<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            doc: Html::parse_document(raw),
        }
    }

    fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>> {
        Ok(self.doc.select(&selector(css)?).next())
    }

    /// The `id` of `<body>`, which names the page.
    ///
    /// # Errors
    ///
    /// `IncompatibleServer` when the body has no id, as on the legacy
    /// interface.
    pub fn identity(&self) -> Result<String> {
        self.first("body")?
            .and_then(|body| body.value().attr("id"))
            .map(str::to_string)
            .ok_or_else(|| ClansError::IncompatibleServer {
                reason: "Postmodern interface required".to_string(),
            })
    }

    /// Username embedded in the bug-report link every authenticated page
    /// carries in its footer.
    pub fn logged_in_username(&self) -> Result<Option<String>> {
        for anchor in self.doc.select(&selector("a[href]")?) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if let Some(name) = username_from_bug_link(href) {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    /// The edit form's text and, if present, its declared fingerprint.
    ///
    /// # Errors
    ///
    /// `SessionExpired` when the page has no textarea.
    pub fn edit_buffer(&self) -> Result<EditBuffer> {
        if self.first("textarea")?.is_none() {
            return Err(ClansError::session_expired(NO_EDIT_TEXT));
        }
        let inner = raw_textarea(self.raw).ok_or_else(|| ClansError::session_expired(NO_EDIT_TEXT))?;
        let inner = inner
            .strip_prefix("\r\n")
            .or_else(|| inner.strip_prefix('\n'))
            .unwrap_or(inner);

        let fingerprint = self
            .first(r#"input[name="edit_text_md5"]"#)?
            .and_then(|input| input.value().attr("value"))
            .map(Fingerprint::declared);

        Ok(EditBuffer {
            text: decode_entities(inner),
            fingerprint,
        })
    }

    /// The info or alert banner, if the page shows one.
    pub fn banner(&self, kind: BannerKind) -> Result<Option<Banner>> {
        let Some(div) = self.first(&format!("div.{}", kind.class()))? else {
            return Ok(None);
        };
        let mut children = div.children().filter_map(ElementRef::wrap);
        let title = children.next().map(element_text).unwrap_or_default();
        let body = children.map(element_text).collect();
        Ok(Some(Banner { kind, title, body }))
    }

    /// Header and body of a plan page.
    ///
    /// # Errors
    ///
    /// `NotFound` carrying the alert title when the plan is missing.
    pub fn plan(&self, clock: &ServerClock) -> Result<Plan> {
        let header = self.first("div#header")?;
        let text = self.first("div.plan_text")?;
        let (Some(header), Some(text)) = (header, text) else {
            return match self.banner(BannerKind::Alert)? {
                Some(alert) => Err(ClansError::NotFound {
                    message: alert.title,
                }),
                None => Err(ClansError::parse("plan page has no header or body")),
            };
        };

        let value = |key: &str| -> Result<Option<String>> {
            Ok(header
                .select(&selector(&format!("li.{key} span.value"))?)
                .next()
                .and_then(first_content))
        };
        let when = |key: &str| -> Result<Option<jiff::Timestamp>> {
            let raw = header
                .select(&selector(&format!("li.{key} span.value span.long"))?)
                .next()
                .and_then(first_content);
            Ok(raw.and_then(|raw| match clock.parse_long(&raw) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    log::warn!("ignoring {key} '{raw}': {e}");
                    None
                }
            }))
        };

        let username = value("username")?
            .ok_or_else(|| ClansError::parse("plan header has no username"))?;
        let plan_header = PlanHeader {
            username,
            lastupdated: when("lastupdated")?,
            lastlogin: when("lastlogin")?,
            planname: value("planname")?,
        };

        Ok(Plan {
            header: plan_header,
            body: canon::content_html(text),
        })
    }

    /// Search hits grouped by plan. A page without a results list has no
    /// hits.
    pub fn search_results(&self) -> Result<Vec<SearchResult>> {
        let Some(list) = self.first("ul#search_results")? else {
            return Ok(Vec::new());
        };
        let group_sel = selector("div.result_user_group")?;
        let user_sel = selector("a.planlove")?;
        let span_sel = selector("span")?;
        let li_sel = selector("li")?;

        let mut results = Vec::new();
        for group in list.select(&group_sel) {
            let username = group
                .select(&user_sel)
                .next()
                .map(element_text)
                .ok_or_else(|| ClansError::parse("search result without a plan name"))?;
            let count_text = group
                .select(&span_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            let count = count_text.trim().parse().map_err(|_| {
                ClansError::parse(format!("bad result count '{count_text}' for {username}"))
            })?;
            let excerpts = group
                .select(&li_sel)
                .filter_map(|li| li.select(&span_sel).next())
                .map(canon::inner_html)
                .collect();
            results.push(SearchResult::new(username, count, excerpts));
        }
        Ok(results)
    }

    /// `(username, server-local time)` pairs from the planwatch list.
    pub fn planwatch(&self) -> Result<Vec<(String, String)>> {
        let Some(list) = self.first("ul#new_plan_list")? else {
            return Ok(Vec::new());
        };
        let li_sel = selector("li")?;
        let user_sel = selector("a.planlove")?;
        let span_sel = selector("span")?;

        let mut entries = Vec::new();
        for li in list.select(&li_sel) {
            let Some(user) = li.select(&user_sel).next() else {
                continue;
            };
            let when = li
                .select(&span_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            entries.push((element_text(user), when.trim().to_string()));
        }
        Ok(entries)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// First child of `element` as text, mirroring how header values are laid
/// out: a bare text node, or occasionally a wrapping element.
fn first_content(element: ElementRef<'_>) -> Option<String> {
    let child = element.children().next()?;
    match child.value() {
        Node::Text(text) => Some(text.to_string()),
        Node::Element(_) => ElementRef::wrap(child).map(element_text),
        _ => None,
    }
}

fn username_from_bug_link(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    if url.host_str() != Some(BUG_REPORT_HOST) || url.path() != BUG_REPORT_PATH {
        return None;
    }
    let comment = url
        .query_pairs()
        .find(|(key, _)| key == "comment")
        .map(|(_, value)| value.into_owned())?;
    let start = comment.find('[')?;
    let stop = start + comment[start..].find(']')?;
    Some(comment[start + 1..stop].to_string())
}

/// Raw inner text of the first textarea, exactly as served.
fn raw_textarea(raw: &str) -> Option<&str> {
    let lowered = raw.to_ascii_lowercase();
    let open = lowered.find("<textarea")?;
    let content_start = open + lowered[open..].find('>')? + 1;
    let close = content_start + lowered[content_start..].find("</textarea")?;
    Some(&raw[content_start..close])
}

/// Decodes character references in textarea content. Unknown named
/// references are left as written.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest[1..].find(';').map(|i| i + 1) else {
            break;
        };
        let name = &rest[1..semi];
        let decoded = match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| name.strip_prefix('#').map(str::parse::<u32>))
                .and_then(|n| n.ok())
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOTER: &str = r#"<a href="http://code.google.com/p/grinnellplans/issues/entry?comment=Reported+by+%5Bbaldwint%5D">Report a bug</a>"#;

    fn page_html(body_id: &str, content: &str) -> String {
        format!(
            "<!DOCTYPE html><html><head><title>Plans</title></head>\
             <body id=\"{body_id}\">{content}<div id=\"footer\">{FOOTER}</div></body></html>"
        )
    }

    #[test]
    fn test_identity() {
        let html = page_html("planspage_home", "");
        assert_eq!(Page::parse(&html).identity().unwrap(), "planspage_home");

        let legacy = "<html><body><p>hi</p></body></html>";
        assert!(matches!(
            Page::parse(legacy).identity(),
            Err(ClansError::IncompatibleServer { .. })
        ));
    }

    #[test]
    fn test_username_from_footer() {
        let html = page_html("planspage_home", "");
        assert_eq!(
            Page::parse(&html).logged_in_username().unwrap().as_deref(),
            Some("baldwint")
        );
        let anonymous = "<html><body id=\"x\"></body></html>";
        assert_eq!(Page::parse(anonymous).logged_in_username().unwrap(), None);
    }

    #[test]
    fn test_edit_buffer_keeps_line_endings() {
        let html = page_html(
            "planspage_edit",
            "<form><textarea name=\"plan\" rows=\"20\">\r\nline one\r\n&lt;b&gt;bold&lt;/b&gt; &amp; &quot;more&quot;\r\n</textarea>\
             <input type=\"hidden\" name=\"edit_text_md5\" value=\"ABCDEF\"></form>",
        );
        let buffer = Page::parse(&html).edit_buffer().unwrap();
        assert_eq!(buffer.text, "line one\r\n<b>bold</b> & \"more\"\r\n");
        assert_eq!(buffer.fingerprint, Some(Fingerprint::declared("abcdef")));
    }

    #[test]
    fn test_edit_buffer_requires_textarea() {
        let html = page_html("planspage_index", "<form></form>");
        match Page::parse(&html).edit_buffer() {
            Err(ClansError::SessionExpired { message }) => assert_eq!(message, NO_EDIT_TEXT),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_banners() {
        let html = page_html(
            "planspage_edit",
            "<div class=\"alertmessage\"><h3>Error</h3><p>Your plan was edited from another instance</p><p> of the edit page.</p></div>",
        );
        let page = Page::parse(&html);
        let alert = page.banner(BannerKind::Alert).unwrap().unwrap();
        assert_eq!(alert.title, "Error");
        assert_eq!(
            alert.body,
            "Your plan was edited from another instance of the edit page."
        );
        assert!(page.banner(BannerKind::Info).unwrap().is_none());
    }

    #[test]
    fn test_plan_extraction() {
        let html = page_html(
            "planspage_read",
            "<div id=\"header\"><ul>\
             <li class=\"username\"><span class=\"title\">Username:</span><span class=\"value\">baldwint</span></li>\
             <li class=\"lastupdated\"><span class=\"title\">Last Updated:</span><span class=\"value\"><span class=\"short\">01/28/15, 5:46 PM</span><span class=\"long\">Wed January 28th 2015, 5:46 PM</span></span></li>\
             <li class=\"lastlogin\"><span class=\"title\">Last Login:</span><span class=\"value\"><span class=\"short\"></span><span class=\"long\"></span></span></li>\
             <li class=\"planname\"><span class=\"title\">Name:</span><span class=\"value\">clever catchphrase</span></li>\
             </ul></div>\
             <div class=\"plan_text\">\n<p class=\"sub\">I said &quot;hi&quot;<br/>to <a class=\"planlove\" href=\"read.php?searchname=gorp\">gorp</a></p></div>",
        );
        let plan = Page::parse(&html).plan(&ServerClock::default()).unwrap();
        assert_eq!(plan.header.username, "baldwint");
        assert_eq!(plan.header.planname.as_deref(), Some("clever catchphrase"));
        assert_eq!(
            plan.header.lastupdated,
            Some("2015-01-28T23:46:00Z".parse().unwrap())
        );
        assert_eq!(plan.header.lastlogin, None);
        assert_eq!(
            plan.body,
            "<p class=\"sub\">I said &quot;hi&quot;<br>to <a href=\"read.php?searchname=gorp\" class=\"planlove\">gorp</a></p>"
        );
    }

    #[test]
    fn test_missing_plan_reports_alert_title() {
        let html = page_html(
            "planspage_read",
            "<div class=\"alertmessage\"><h3>No such user: nobody</h3></div>",
        );
        match Page::parse(&html).plan(&ServerClock::default()) {
            Err(ClansError::NotFound { message }) => assert_eq!(message, "No such user: nobody"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_search_results_are_grouped() {
        let html = page_html(
            "planspage_search",
            "<ul id=\"search_results\">\
             <li><div class=\"result_user_group\"><a href=\"read.php?searchname=plan1\" class=\"planlove\">plan1</a><span>1</span>\
             <ul><li><span>snip one <b>term</b> context</span></li></ul></div></li>\
             <li><div class=\"result_user_group\"><a href=\"read.php?searchname=plan2\" class=\"planlove\">plan2</a><span>2</span>\
             <ul><li><span>snip one <b>term</b> context</span></li><li><span>snip two <b>term</b> context</span></li></ul></div></li>\
             </ul>",
        );
        let results = Page::parse(&html).search_results().unwrap();
        assert_eq!(
            results,
            vec![
                SearchResult::new("plan1", 1, vec!["snip one <b>term</b> context".into()]),
                SearchResult::new(
                    "plan2",
                    2,
                    vec![
                        "snip one <b>term</b> context".into(),
                        "snip two <b>term</b> context".into()
                    ]
                ),
            ]
        );
    }

    #[test]
    fn test_no_search_results() {
        let html = page_html("planspage_search", "<p>Nothing found</p>");
        assert!(Page::parse(&html).search_results().unwrap().is_empty());
    }

    #[test]
    fn test_planwatch_entries() {
        let html = page_html(
            "planspage_planwatch",
            "<ul id=\"new_plan_list\">\
             <li><a href=\"read.php?searchname=gorp\" class=\"planlove\">gorp</a> <span>01/28/15, 5:46 PM</span></li>\
             <li><a href=\"read.php?searchname=bff\" class=\"planlove\">bff</a> <span>01/27/15, 9:01 AM</span></li>\
             </ul>",
        );
        let entries = Page::parse(&html).planwatch().unwrap();
        assert_eq!(
            entries,
            vec![
                ("gorp".to_string(), "01/28/15, 5:46 PM".to_string()),
                ("bff".to_string(), "01/27/15, 9:01 AM".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&lt;b&gt; &amp;amp; &#9733; &#x1F4A9;"), "<b> &amp; ★ 💩");
        assert_eq!(decode_entities("&bogus; & alone"), "&bogus; & alone");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }
}
