//! Outcome of a reconciliation pass

use crate::domain::Domain;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;

/// Body reported when every domain already points at the reference address
pub const NO_WRONG_DOMAINS: &str = "No Wrong Domains";

/// What happened to one provider zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ZoneOutcome {
    /// No wrong domain belongs to the zone; its records were not fetched
    NotAffected { zone: String, dns_name: String },

    /// Wrong domains belong to the zone but every record is already correct
    AlreadyCorrect { zone: String, dns_name: String },

    /// A change was submitted for the listed record names
    Corrected {
        zone: String,
        dns_name: String,
        records: Vec<String>,
    },

    /// Evaluating or updating the zone failed
    Failed {
        zone: String,
        dns_name: String,
        kind: String,
        error: String,
    },
}

impl ZoneOutcome {
    /// Provider name of the zone
    pub fn zone(&self) -> &str {
        match self {
            ZoneOutcome::NotAffected { zone, .. }
            | ZoneOutcome::AlreadyCorrect { zone, .. }
            | ZoneOutcome::Corrected { zone, .. }
            | ZoneOutcome::Failed { zone, .. } => zone,
        }
    }

    /// Whether this zone failed
    pub fn is_failed(&self) -> bool {
        matches!(self, ZoneOutcome::Failed { .. })
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub reference_name: String,
    pub reference_ip: IpAddr,
    /// Domains found wrong, whether or not a zone needed changing
    pub wrong_domains: Vec<Domain>,
    pub zones: Vec<ZoneOutcome>,
}

impl ReconcileReport {
    /// Whether the pass found nothing to do
    pub fn is_clean(&self) -> bool {
        self.wrong_domains.is_empty()
    }

    /// Whether any zone failed
    pub fn has_failures(&self) -> bool {
        self.zones.iter().any(ZoneOutcome::is_failed)
    }

    /// Zones that failed
    pub fn failures(&self) -> impl Iterator<Item = &ZoneOutcome> {
        self.zones.iter().filter(|z| z.is_failed())
    }

    /// Provider names of the zones a change was submitted to
    pub fn corrected_zones(&self) -> Vec<&str> {
        self.zones
            .iter()
            .filter(|z| matches!(z, ZoneOutcome::Corrected { .. }))
            .map(ZoneOutcome::zone)
            .collect()
    }

    /// Names of the wrong domains
    pub fn wrong_domain_names(&self) -> Vec<&str> {
        self.wrong_domains.iter().map(|d| d.name.as_str()).collect()
    }

    /// Plain-text summary returned to the trigger
    pub fn summary(&self) -> String {
        if self.is_clean() {
            return NO_WRONG_DOMAINS.to_string();
        }
        format!(
            "Fixed wrong domain. wrongDomains: [{}]\n",
            self.wrong_domain_names().join(" ")
        )
    }
}
