// # Zone Provider Trait
//
// Defines the interface to the DNS provider holding the managed zones.
//
// ## Implementations
//
// - Google Cloud DNS: `cnamesync-provider-clouddns` crate
//
// ## Usage
//
// ```rust,ignore
// use cnamesync_core::ZoneProvider;
//
// for zone in provider.list_zones().await? {
//     let records = provider.list_records(&zone).await?;
// }
// ```

use crate::diff::ChangeSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Record type handled by the reconciliation pass
pub const RECORD_TYPE_A: &str = "A";

/// A zone held by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedZone {
    /// Provider identifier used in API paths
    pub name: String,
    /// Fully-qualified suffix served by the zone (usually with trailing dot)
    pub dns_name: String,
    /// Numeric provider id, if the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ManagedZone {
    /// Create a zone without a numeric id
    pub fn new(name: impl Into<String>, dns_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dns_name: dns_name.into(),
            id: None,
        }
    }
}

/// A record set as read from (or written to) the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Fully-qualified record name, with trailing dot
    pub name: String,
    /// Record type ("A", "AAAA", "CNAME", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record data, in provider order
    #[serde(rename = "rrdatas", default)]
    pub addresses: Vec<String>,
    /// Time-to-live in seconds
    #[serde(default)]
    pub ttl: u32,
}

impl ProviderRecord {
    /// Create an "A" record with a single address
    pub fn a(name: impl Into<String>, address: impl Into<String>, ttl: u32) -> Self {
        Self {
            name: name.into(),
            record_type: RECORD_TYPE_A.to_string(),
            addresses: vec![address.into()],
            ttl,
        }
    }

    /// Whether this is an "A" record
    pub fn is_a(&self) -> bool {
        self.record_type == RECORD_TYPE_A
    }
}

/// Trait for DNS provider implementations
///
/// # Responsibilities
///
/// Providers execute API calls and report success or failure. They do not
/// decide which records need changing and do not retry; both belong to the
/// engine.
///
/// # Atomicity
///
/// [`ZoneProvider::submit_change`] must apply all additions and deletions of a
/// [`ChangeSet`] in one request, so a zone is never half-corrected.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// List every zone of the configured project
    async fn list_zones(&self) -> Result<Vec<ManagedZone>, crate::Error>;

    /// List the record sets of one zone
    ///
    /// Implementations may return records of any type; the diff builder
    /// ignores everything that is not an "A" record.
    async fn list_records(&self, zone: &ManagedZone) -> Result<Vec<ProviderRecord>, crate::Error>;

    /// Submit a change atomically
    ///
    /// Never called with an empty change set.
    async fn submit_change(
        &self,
        zone: &ManagedZone,
        change: &ChangeSet,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
