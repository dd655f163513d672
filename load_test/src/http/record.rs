//! Outcome of a single tagged HTTP request

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Label scoping metrics and thresholds to one service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestTag {
    Auth,
    Menu,
    Search,
    Order,
}

impl RequestTag {
    pub const ALL: [RequestTag; 4] = [
        RequestTag::Auth,
        RequestTag::Menu,
        RequestTag::Search,
        RequestTag::Order,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestTag::Auth => "auth",
            RequestTag::Menu => "menu",
            RequestTag::Search => "search",
            RequestTag::Order => "order",
        }
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown request tag '{s}'"))
    }
}

#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub tag: RequestTag,
    pub method: &'static str,
    pub url: String,
    /// HTTP status, or 0 when no response was received
    pub status: u16,
    pub body_len: usize,
    pub duration: Duration,
    pub error: Option<String>,
}

impl RequestRecord {
    /// Whether the request counts as failed for `http_req_failed`:
    /// no response, or a status outside 200-399.
    pub fn is_failed(&self) -> bool {
        self.error.is_some() || !(200..=399).contains(&self.status)
    }

    pub fn has_body(&self) -> bool {
        self.body_len > 0
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_micros() as f64 / 1000.0
    }
}
