//! Plan header and body as read from another user's plan page.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Metadata shown above a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanHeader {
    /// Username the plan belongs to
    pub username: String,

    /// Last update time (UTC), if the server reported one
    pub lastupdated: Option<Timestamp>,

    /// Last login time (UTC), if the server reported one
    pub lastlogin: Option<Timestamp>,

    /// The user's self-chosen plan name
    pub planname: Option<String>,
}

/// A plan as rendered by the server: header plus canonicalized HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub header: PlanHeader,

    /// Body markup, byte-identical to what the server serves
    pub body: String,
}
