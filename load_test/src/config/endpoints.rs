//! Target service endpoints

use reqwest::Url;

use crate::error::{LoadTestError, Result};

pub const DEFAULT_AUTH_URL: &str = "http://localhost:30001/api/login";
pub const DEFAULT_MENU_URL: &str = "http://localhost:30002/api/menu-items";
pub const DEFAULT_SEARCH_URL: &str = "http://localhost:30003/api/search/menu-items?query=produto";
pub const DEFAULT_ORDER_URL: &str = "http://localhost:30004/api/orders";

/// Fully-qualified URLs for the four services the scenario exercises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: Url,
    pub menu: Url,
    pub search: Url,
    pub order: Url,
}

impl Endpoints {
    pub fn parse(auth: &str, menu: &str, search: &str, order: &str) -> Result<Self> {
        Ok(Self {
            auth: parse_url("auth", auth)?,
            menu: parse_url("menu", menu)?,
            search: parse_url("search", search)?,
            order: parse_url("order", order)?,
        })
    }

    /// Local defaults (one port per service)
    pub fn local() -> Result<Self> {
        Self::parse(
            DEFAULT_AUTH_URL,
            DEFAULT_MENU_URL,
            DEFAULT_SEARCH_URL,
            DEFAULT_ORDER_URL,
        )
    }
}

fn parse_url(service: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| LoadTestError::InvalidConfig(format!("{service} URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadTestError::InvalidConfig(format!(
            "{service} URL '{raw}' has unsupported scheme '{other}'"
        ))),
    }
}
