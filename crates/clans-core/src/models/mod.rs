//! Data models for pages scraped from Plans.
//!
//! These are plain data carriers; rendering lives in [`crate::display`] and
//! extraction from HTML in [`crate::page`].

pub mod banner;
pub mod edit;
pub mod plan;
pub mod roster;
pub mod search;

pub use banner::{Banner, BannerKind};
pub use edit::EditBuffer;
pub use plan::{Plan, PlanHeader};
pub use roster::{RecentUpdate, Roster};
pub use search::{SearchResult, Tally, FIRST_SEEN_FORMAT};
