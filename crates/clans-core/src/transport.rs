//! HTTP transport to the Plans server.
//!
//! Requests are issued one at a time and awaited to completion. HTTP status
//! codes are deliberately ignored; Plans reports failures through banners in
//! the page body, which the caller inspects.

use std::{sync::Arc, time::Duration};

use reqwest::cookie::{CookieStore, Jar};
use url::Url;

use crate::error::{ClansError, Result};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A fetched page: where the request ended up after redirects, and its body.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub body: String,
}

/// Cookie-carrying HTTP session bound to one base URL.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl Transport {
    /// Creates a transport for `base_url`. A trailing slash is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ClansError::Configuration` if the URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| ClansError::configuration(format!("invalid url '{base_url}': {e}")))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClansError::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            jar,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClansError::configuration(format!("invalid path '{path}': {e}")))
    }

    /// GET `path` with the given query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = self.url(path)?;
        log::debug!("GET {url}");
        let request = self.http.get(url).query(query);
        Self::exchange(request).await
    }

    /// POST `form` to `path` as `application/x-www-form-urlencoded`.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<Response> {
        let url = self.url(path)?;
        log::debug!("POST {url}");
        let request = self.http.post(url).form(form);
        Self::exchange(request).await
    }

    async fn exchange(request: reqwest::RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|source| ClansError::Connection { source })?;
        let url = response.url().clone();
        log::debug!("{} from {url}", response.status());
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClansError::Connection { source })?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| ClansError::parse(format!("response from {url} is not UTF-8: {e}")))?;
        Ok(Response { url, body })
    }

    /// Cookies currently held for the base URL, as a `Cookie` header value.
    pub fn export_cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Restores cookies previously produced by [`Transport::export_cookies`].
    pub fn import_cookies(&self, header: &str) {
        for cookie in header.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            self.jar.add_cookie_str(cookie, &self.base_url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_ignored() {
        let a = Transport::new("http://plans.example.com/").unwrap();
        let b = Transport::new("http://plans.example.com").unwrap();
        assert_eq!(a.base_url(), b.base_url());
        assert_eq!(
            a.url("edit.php").unwrap().as_str(),
            "http://plans.example.com/edit.php"
        );
    }

    #[test]
    fn test_mounted_below_root() {
        let t = Transport::new("http://example.com/plans").unwrap();
        assert_eq!(
            t.url("api/1/index.php").unwrap().as_str(),
            "http://example.com/plans/api/1/index.php"
        );
    }

    #[test]
    fn test_cookie_round_trip() {
        let t = Transport::new("http://plans.example.com").unwrap();
        assert_eq!(t.export_cookies(), None);
        t.import_cookies("PHPSESSID=abc123; remember=yes");
        let exported = t.export_cookies().unwrap();
        assert!(exported.contains("PHPSESSID=abc123"));
        assert!(exported.contains("remember=yes"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            Transport::new("not a url"),
            Err(ClansError::Configuration { .. })
        ));
    }
}
