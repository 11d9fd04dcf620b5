//! Domain names, top-level domain extraction and the wildcard lookup policy

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Host label substituted for `*` when looking up a wildcard domain
pub const WILDCARD_PLACEHOLDER: &str = "this-domain-should-not-exist";

// ASCII word characters only; `\w` in the regex crate is Unicode-aware.
static TOP_LEVEL_DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_]+\.[A-Za-z0-9_]+$").expect("top level domain pattern is valid")
});

/// A configured domain together with the top-level domain used for zone matching
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    /// Configured hostname, possibly starting with `*.`
    pub name: String,
    /// Last two labels of `name`, see [`top_level_domain`]
    pub top_level_domain: String,
}

impl Domain {
    /// Build a domain, deriving its top-level domain
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let top_level_domain = top_level_domain(&name)?;
        Ok(Self {
            name,
            top_level_domain,
        })
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Extract the "top-level domain" of a hostname
///
/// One trailing dot is stripped, then the last two dot-separated runs of
/// ASCII word characters (`[A-Za-z0-9_]`) are returned.
///
/// This is not a public suffix lookup: `shop.example.co.uk` yields `co.uk`.
/// Zones are matched with this same rule, so both sides stay consistent.
///
/// # Errors
///
/// [`Error::Extraction`] when the input has no two trailing word labels,
/// e.g. `example` or `example.`.
pub fn top_level_domain(domain: &str) -> Result<String> {
    let trimmed = domain.strip_suffix('.').unwrap_or(domain);
    TOP_LEVEL_DOMAIN_REGEX
        .find(trimmed)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::extraction(domain))
}

/// Host to hand to the resolver for a configured domain
///
/// Wildcard names cannot be looked up literally. For `*.example.com` the
/// lookup goes to `this-domain-should-not-exist.example.com`, which any
/// wildcard record in the zone answers. Every other name is returned as is.
pub fn effective_lookup_host(domain: &str) -> String {
    match domain.strip_prefix("*.") {
        Some(rest) => format!("{WILDCARD_PLACEHOLDER}.{rest}"),
        None => domain.to_string(),
    }
}
