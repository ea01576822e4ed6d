//! The Plans protocol client.
//!
//! [`PlansClient`] drives the server's pages the way a browser would: it logs
//! in through the front page, fetches and submits the edit form, and scrapes
//! plan, search and planwatch pages. Every HTML response passes through
//! [`PlansClient::inspect`], which insists on the page markers this client
//! understands and guards the logged-in identity.
//!
//! ```text
//! Unauthenticated ──login──▶ Authenticated(username)
//!                                  │
//!                  any page reporting another user ──▶ IdentityChanged
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use clans_core::PlansClientBuilder;
//!
//! # async fn example() -> clans_core::Result<()> {
//! let mut client = PlansClientBuilder::new()
//!     .with_base_url(Some("http://www.grinnellplans.com"))
//!     .build()?;
//!
//! if client.login("baldwint", "hunter2").await? {
//!     let buffer = client.fetch_edit_buffer(true).await?;
//!     let fingerprint = buffer.fingerprint.clone().expect("requested");
//!     let message = client
//!         .submit_edit(&format!("{}\nmore", buffer.text), &fingerprint)
//!         .await?;
//!     println!("{message}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;

use serde::Deserialize;

pub use builder::{PlansClientBuilder, DEFAULT_BASE_URL};

use crate::{
    canon,
    dates::ServerClock,
    error::{ClansError, Result},
    fingerprint::Fingerprint,
    models::{BannerKind, EditBuffer, Plan, RecentUpdate, Roster, SearchResult},
    page::Page,
    transport::Transport,
};

/// Authenticated session with a Plans server.
#[derive(Debug)]
pub struct PlansClient {
    transport: Transport,
    clock: ServerClock,
    username: Option<String>,
}

impl PlansClient {
    pub(crate) fn new(transport: Transport, clock: ServerClock) -> Self {
        Self {
            transport,
            clock,
            username: None,
        }
    }

    /// The user this client is logged in as, once known.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn clock(&self) -> &ServerClock {
        &self.clock
    }

    /// Session cookies for persisting between runs.
    pub fn export_cookies(&self) -> Option<String> {
        self.transport.export_cookies()
    }

    pub fn import_cookies(&self, header: &str) {
        self.transport.import_cookies(header);
    }

    /// Checks the page markers common to every page and the identity it
    /// reports.
    fn inspect(&self, page: &Page<'_>) -> Result<Option<String>> {
        page.identity()?;
        let found = page.logged_in_username()?;
        if let (Some(expected), Some(found)) = (&self.username, &found) {
            if expected != found {
                return Err(ClansError::IdentityChanged {
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }
        Ok(found)
    }

    /// Logs in. Returns whether the server accepted the session.
    ///
    /// The server only checks the credentials when the session cookie is
    /// missing or expired, so empty credentials test an existing session.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<bool> {
        let form = [
            ("username", username),
            ("password", password),
            ("submit", "Login"),
        ];
        let response = self.transport.post("index.php", &form).await?;
        if !response.url.path().ends_with("/home.php") {
            log::info!("login rejected, landed on {}", response.url);
            return Ok(false);
        }

        let page = Page::parse(&response.body);
        let found = self
            .inspect(&page)?
            .ok_or_else(|| ClansError::parse("home page does not name the logged-in user"))?;
        log::info!("logged in as {found}");
        self.username = Some(found);
        Ok(true)
    }

    /// Logs in with credentials, failing with `Authentication` when the
    /// server refuses them.
    pub async fn login_as(&mut self, username: &str, password: &str) -> Result<()> {
        if self.login(username, password).await? {
            Ok(())
        } else {
            Err(ClansError::Authentication {
                username: username.to_string(),
            })
        }
    }

    /// Fetches the edit form's text, optionally with the server's
    /// fingerprint of it.
    ///
    /// # Errors
    ///
    /// - `SessionExpired` when the form is missing
    /// - `FingerprintMismatch` when the declared fingerprint does not match
    ///   the text received
    pub async fn fetch_edit_buffer(&mut self, with_fingerprint: bool) -> Result<EditBuffer> {
        let response = self.transport.get("edit.php", &[]).await?;
        let page = Page::parse(&response.body);
        self.inspect(&page)?;
        let mut buffer = page.edit_buffer()?;

        if !with_fingerprint {
            buffer.fingerprint = None;
            return Ok(buffer);
        }
        let declared = buffer
            .fingerprint
            .clone()
            .ok_or_else(|| ClansError::parse("edit page has no edit_text_md5 field"))?;
        let computed = Fingerprint::of(&buffer.text);
        if declared != computed {
            return Err(ClansError::FingerprintMismatch {
                declared: declared.to_string(),
                computed: computed.to_string(),
            });
        }
        Ok(buffer)
    }

    /// Replaces the plan, provided it still matches `expected`.
    ///
    /// Line endings are converted to CRLF before submission. Returns the
    /// server's confirmation message.
    ///
    /// # Errors
    ///
    /// - `Conflict`, `PlanTooLong` or `Rejected` with the alert text
    /// - `UnverifiedUpdate` when the server confirms nothing
    pub async fn submit_edit(&mut self, text: &str, expected: &Fingerprint) -> Result<String> {
        let plan = canon::normalize_newlines(text);
        let form = [
            ("plan", plan.as_str()),
            ("edit_text_md5", expected.as_str()),
            ("submit", "Change Plan"),
        ];
        let response = self.transport.post("edit.php", &form).await?;
        let page = Page::parse(&response.body);
        self.inspect(&page)?;

        if let Some(alert) = page.banner(BannerKind::Alert)? {
            log::info!("plan update rejected: {}", alert.body);
            return Err(ClansError::from_rejection(alert.body));
        }
        let info = page
            .banner(BannerKind::Info)?
            .ok_or(ClansError::UnverifiedUpdate)?;
        log::info!("plan updated: {}", info.body);
        Ok(info.body)
    }

    /// Reads someone's plan.
    ///
    /// # Errors
    ///
    /// `NotFound` with the server's message when there is no such plan.
    pub async fn read_plan(&mut self, name: &str) -> Result<Plan> {
        let response = self
            .transport
            .get("read.php", &[("searchname", name)])
            .await?;
        let page = Page::parse(&response.body);
        self.inspect(&page)?;
        page.plan(&self.clock)
    }

    /// Searches all plans for `term`, or for planlove of user `term` when
    /// `planlove` is set.
    pub async fn search_plans(&mut self, term: &str, planlove: bool) -> Result<Vec<SearchResult>> {
        let flag = if planlove { "1" } else { "0" };
        let response = self
            .transport
            .get("search.php", &[("mysearch", term), ("planlove", flag)])
            .await?;
        let page = Page::parse(&response.body);
        self.inspect(&page)?;
        page.search_results()
    }

    /// Unread plans on the autoread list, from the JSON API.
    pub async fn autoread_roster(&mut self) -> Result<Roster> {
        let response = self
            .transport
            .get("api/1/index.php", &[("task", "autofingerlist")])
            .await?;
        let parsed: AutofingerResponse = serde_json::from_str(&response.body)
            .map_err(|e| ClansError::parse(format!("unexpected autofinger response: {e}")))?;
        let groups = parsed.autofinger_list.ok_or_else(|| {
            ClansError::session_expired("Couldn't get autoread list, are we logged in?")
        })?;

        Ok(groups
            .into_iter()
            .map(|group| (format!("Level {}", group.level), group.usernames))
            .collect())
    }

    /// Plans updated within the last `hours` hours.
    pub async fn recent_activity(&mut self, hours: u32) -> Result<Vec<RecentUpdate>> {
        let hours = hours.to_string();
        let response = self
            .transport
            .post("planwatch.php", &[("mytime", hours.as_str())])
            .await?;
        let page = Page::parse(&response.body);
        self.inspect(&page)?;
        page.planwatch()?
            .into_iter()
            .map(|(username, when)| {
                let updated = self.clock.parse(&when)?;
                Ok(RecentUpdate { username, updated })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AutofingerResponse {
    #[serde(rename = "autofingerList")]
    autofinger_list: Option<Vec<AutofingerGroup>>,
}

#[derive(Debug, Deserialize)]
struct AutofingerGroup {
    level: Level,
    #[serde(default)]
    usernames: Vec<String>,
}

/// The API reports levels as numbers or numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Level {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Number(n) => write!(f, "{n}"),
            Level::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autofinger_levels() {
        let json = r#"{"autofingerList":[
            {"level":"1","usernames":["bff","gorp"]},
            {"level":2,"usernames":["rando"]},
            {"level":3}
        ]}"#;
        let parsed: AutofingerResponse = serde_json::from_str(json).unwrap();
        let roster: Roster = parsed
            .autofinger_list
            .unwrap()
            .into_iter()
            .map(|g| (format!("Level {}", g.level), g.usernames))
            .collect();
        assert_eq!(roster["Level 1"], vec!["bff", "gorp"]);
        assert_eq!(roster["Level 2"], vec!["rando"]);
        assert!(roster["Level 3"].is_empty());
    }
}
