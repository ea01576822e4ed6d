//! The `json` format: pretty-printed documents for scripts.

use std::io;

use jiff::Timestamp;
use serde::Serialize;

use super::{IsoDateTime, ListLayout, PlanFormatter};
use crate::models::{PlanHeader, Roster, SearchResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

#[derive(Serialize)]
struct PlanDocument<'a> {
    username: &'a str,
    lastupdated: Option<String>,
    lastlogin: Option<String>,
    planname: Option<&'a str>,
    plan: &'a str,
}

fn print_pretty<T: Serialize + ?Sized>(out: &mut dyn io::Write, value: &T) -> io::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    writeln!(out, "{text}")
}

impl PlanFormatter for JsonFormatter {
    fn filter_html(&self, html: &str) -> String {
        html.to_string()
    }

    fn format_date(&self, timestamp: &Timestamp) -> String {
        IsoDateTime(timestamp).to_string()
    }

    /// A single object, without a trailing newline.
    fn format_plan(&self, header: &PlanHeader, body: &str) -> String {
        let doc = PlanDocument {
            username: &header.username,
            lastupdated: header.lastupdated.as_ref().map(|t| self.format_date(t)),
            lastlogin: header.lastlogin.as_ref().map(|t| self.format_date(t)),
            planname: header.planname.as_deref(),
            plan: body,
        };
        // Serializing plain strings and options cannot fail.
        serde_json::to_string_pretty(&doc).unwrap_or_default()
    }

    fn print_list(&self, out: &mut dyn io::Write, items: &[String], _layout: ListLayout) -> io::Result<()> {
        print_pretty(out, items)
    }

    fn print_search_results(&self, out: &mut dyn io::Write, results: &[SearchResult]) -> io::Result<()> {
        print_pretty(out, results)
    }

    fn print_autoread(&self, out: &mut dyn io::Write, roster: &Roster, _layout: ListLayout) -> io::Result<()> {
        print_pretty(out, roster)
    }
}
