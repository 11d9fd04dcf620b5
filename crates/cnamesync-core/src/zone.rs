//! Matching wrong domains against a provider zone

use crate::domain::{Domain, top_level_domain};
use crate::error::Result;
use std::collections::HashSet;

/// Wrong domains that belong to one zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneMembership {
    resource_domain: String,
    names: HashSet<String>,
}

impl ZoneMembership {
    /// Top-level domain of the zone this membership was built for
    pub fn resource_domain(&self) -> &str {
        &self.resource_domain
    }

    /// Whether the zone holds any wrong domain
    ///
    /// When false the zone's records must not be fetched at all.
    pub fn has_any(&self) -> bool {
        !self.names.is_empty()
    }

    /// Whether `name` (without trailing dot) is a wrong domain of this zone
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of wrong domains in the zone
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the membership is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Member names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Build the membership of a zone from its DNS name
///
/// The zone's resource domain is derived with the same rule as the domains
/// themselves, so `example.com.` collects every wrong domain whose top-level
/// domain is `example.com`.
///
/// # Errors
///
/// [`crate::Error::Extraction`] if the zone's DNS name has no top-level domain.
pub fn match_zone(zone_dns_name: &str, wrong_domains: &[Domain]) -> Result<ZoneMembership> {
    let resource_domain = top_level_domain(zone_dns_name)?;
    let names = wrong_domains
        .iter()
        .filter(|domain| domain.top_level_domain == resource_domain)
        .map(|domain| domain.name.clone())
        .collect();

    Ok(ZoneMembership {
        resource_domain,
        names,
    })
}
