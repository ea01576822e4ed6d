//! Builder for creating and configuring PlansClient instances.

use super::PlansClient;
use crate::{
    dates::{ServerClock, DEFAULT_SERVER_TIMEZONE},
    error::Result,
    transport::Transport,
};

/// Address of the public Plans server.
pub const DEFAULT_BASE_URL: &str = "http://www.grinnellplans.com";

/// Builder for creating and configuring PlansClient instances.
#[derive(Debug, Clone, Default)]
pub struct PlansClientBuilder {
    base_url: Option<String>,
    timezone: Option<String>,
    cookies: Option<String>,
}

impl PlansClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server address. Defaults to [`DEFAULT_BASE_URL`].
    pub fn with_base_url<S: AsRef<str>>(mut self, url: Option<S>) -> Self {
        if let Some(url) = url {
            self.base_url = Some(url.as_ref().to_string());
        }
        self
    }

    /// Sets the timezone the server renders dates in.
    pub fn with_timezone<S: AsRef<str>>(mut self, zone: Option<S>) -> Self {
        if let Some(zone) = zone {
            self.timezone = Some(zone.as_ref().to_string());
        }
        self
    }

    /// Seeds the cookie jar from a saved session.
    pub fn with_cookies<S: AsRef<str>>(mut self, cookies: Option<S>) -> Self {
        if let Some(cookies) = cookies {
            self.cookies = Some(cookies.as_ref().to_string());
        }
        self
    }

    /// Builds the configured client.
    ///
    /// # Errors
    ///
    /// Returns `ClansError::Configuration` if the URL or timezone is invalid
    pub fn build(self) -> Result<PlansClient> {
        let transport = Transport::new(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let clock = ServerClock::new(self.timezone.as_deref().unwrap_or(DEFAULT_SERVER_TIMEZONE))?;
        if let Some(cookies) = &self.cookies {
            transport.import_cookies(cookies);
        }
        Ok(PlansClient::new(transport, clock))
    }
}
