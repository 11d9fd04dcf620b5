//! Record-level diff for one zone

use crate::traits::ProviderRecord;
use crate::zone::ZoneMembership;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::debug;

/// TTL written on every replaced record, in seconds
pub const DEFAULT_RECORD_TTL: u32 = 300;

/// Paired record deletions and additions for one zone
///
/// `deletions[i]` and `additions[i]` always describe the same record name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Records to add
    pub additions: Vec<ProviderRecord>,
    /// Records to delete
    pub deletions: Vec<ProviderRecord>,
}

impl ChangeSet {
    /// Whether there is nothing to submit
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty()
    }

    /// Number of replaced records
    pub fn len(&self) -> usize {
        self.additions.len()
    }

    /// Names of the replaced records, in order
    pub fn record_names(&self) -> Vec<String> {
        self.additions.iter().map(|r| r.name.clone()).collect()
    }
}

/// Compute the changes that repoint the zone's wrong records at `reference_ip`
///
/// A record is replaced only if it is an "A" record, its name is in
/// `membership`, it has at least one address, and its first address differs
/// from `reference_ip`. Only the first address is considered.
///
/// Records already at the reference address at the provider are left alone
/// even when the resolver still reports the old address, so re-running the
/// diff after a submission yields an empty change set.
pub fn build_diff(
    records: &[ProviderRecord],
    membership: &ZoneMembership,
    reference_ip: IpAddr,
    ttl: u32,
) -> ChangeSet {
    let reference = reference_ip.to_string();
    let mut change = ChangeSet::default();

    for record in records {
        if !record.is_a() {
            continue;
        }

        let record_domain = record.name.strip_suffix('.').unwrap_or(&record.name);
        if !membership.contains(record_domain) {
            continue;
        }

        let Some(current) = record.addresses.first() else {
            debug!("{} has no addresses, skipping", record.name);
            continue;
        };

        if *current == reference {
            debug!("{} already at {} at the provider", record_domain, reference);
            continue;
        }

        let fqdn = format!("{record_domain}.");
        change
            .deletions
            .push(ProviderRecord::a(fqdn.clone(), current.clone(), ttl));
        change
            .additions
            .push(ProviderRecord::a(fqdn, reference.clone(), ttl));
    }

    change
}
