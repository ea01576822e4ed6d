//! Message banners the server uses to report outcomes.

/// Which banner a page carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// `div.infomessage`, shown after successful actions
    Info,
    /// `div.alertmessage`, shown on errors
    Alert,
}

impl BannerKind {
    /// CSS class of the banner's `div`.
    pub fn class(self) -> &'static str {
        match self {
            BannerKind::Info => "infomessage",
            BannerKind::Alert => "alertmessage",
        }
    }
}

/// A banner's first child is its title; the remaining children are its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub title: String,
    pub body: String,
}
