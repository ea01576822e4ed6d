//! Core library for clans, a command-line client for the Plans journaling
//! service.
//!
//! Plans has no API. This crate talks to it the way a browser does, posting
//! its forms and scraping its pages, and turns what comes back into typed
//! values:
//!
//! - **Protocol** ([`client`], [`transport`], [`page`]): login, the
//!   compare-and-swap plan edit, reading, searching, planwatch and the
//!   autoread roster
//! - **Fidelity** ([`canon`], [`fingerprint`]): plan text survives the round
//!   trip through the HTML parser byte for byte, so the server's MD5
//!   fingerprints keep matching
//! - **Display** ([`display`]): raw, text, color and JSON renderings of
//!   everything the client returns
//! - **Extensions** ([`hooks`], [`ext`]): backups around edits and the
//!   newlove tracker for planlove searches
//! - **Profile** ([`config`], [`credentials`]): the `clans.toml` file and
//!   saved sessions
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use clans_core::{display::FormatKind, PlansClientBuilder};
//!
//! # async fn example() -> clans_core::Result<()> {
//! let mut client = PlansClientBuilder::new().build()?;
//! if !client.login("baldwint", "hunter2").await? {
//!     return Ok(());
//! }
//!
//! let plan = client.read_plan("gorp").await?;
//! let formatter = FormatKind::Text.formatter(client.clock().timezone().clone());
//! println!("{}", formatter.format_plan(&plan.header, &plan.body));
//! # Ok(())
//! # }
//! ```

pub mod canon;
pub mod client;
pub mod config;
pub mod credentials;
pub mod dates;
pub mod display;
pub mod error;
pub mod ext;
pub mod fingerprint;
pub mod hooks;
pub mod models;
pub mod page;
pub mod transport;

// Re-export commonly used types
pub use client::{PlansClient, PlansClientBuilder, DEFAULT_BASE_URL};
pub use config::Config;
pub use credentials::{CookieFile, CredentialStore};
pub use dates::ServerClock;
pub use display::{FormatKind, ListLayout, PlanFormatter};
pub use error::{ClansError, Result};
pub use fingerprint::Fingerprint;
pub use hooks::{Extension, HookDispatcher, HookFlow, SessionContext};
pub use models::{
    Banner, BannerKind, EditBuffer, Plan, PlanHeader, RecentUpdate, Roster, SearchResult, Tally,
};
