//! Test doubles and common utilities for the reconciliation contract tests
//!
//! The doubles record every call so tests can assert which provider
//! operations a pass performed.

#![allow(dead_code)]

use cnamesync_core::error::Result;
use cnamesync_core::traits::{ManagedZone, NameLookup, ProviderRecord, ZoneProvider};
use cnamesync_core::{ChangeSet, RetryPolicy, SyncConfig};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A lookup answering from a fixed table
///
/// Unknown hosts fail with `NotFound`. Every queried host is recorded.
pub struct StaticLookup {
    answers: HashMap<String, Vec<IpAddr>>,
    queried: Arc<Mutex<Vec<String>>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            queried: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer `host` with a single address
    pub fn with(mut self, host: &str, ip: [u8; 4]) -> Self {
        self.answers.insert(host.to_string(), vec![IpAddr::from(ip)]);
        self
    }

    /// Answer `host` with several addresses, in order
    pub fn with_many(mut self, host: &str, ips: Vec<IpAddr>) -> Self {
        self.answers.insert(host.to_string(), ips);
        self
    }

    /// Shared handle on the queried hosts
    pub fn queried(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.queried)
    }
}

#[async_trait::async_trait]
impl NameLookup for StaticLookup {
    async fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        self.queried.lock().unwrap().push(host.to_string());
        self.answers.get(host).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("no such host: {host}"))
        })
    }
}

/// A lookup failing a fixed number of times before answering
pub struct FlakyLookup {
    failures: usize,
    ip: IpAddr,
    calls: Arc<AtomicUsize>,
}

impl FlakyLookup {
    pub fn new(failures: usize, ip: [u8; 4]) -> Self {
        Self {
            failures,
            ip: IpAddr::from(ip),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl NameLookup for FlakyLookup {
    async fn lookup(&self, _host: &str) -> std::io::Result<Vec<IpAddr>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            // Alternate between an error and an empty answer
            if call % 2 == 0 {
                return Err(std::io::Error::other("temporary failure in name resolution"));
            }
            return Ok(Vec::new());
        }
        Ok(vec![self.ip])
    }
}

/// An in-memory provider that applies submitted changes and tracks calls
pub struct MockZoneProvider {
    zones: Arc<Vec<ManagedZone>>,
    records: Arc<Mutex<HashMap<String, Vec<ProviderRecord>>>>,
    list_zones_calls: Arc<AtomicUsize>,
    listed_zones: Arc<Mutex<Vec<String>>>,
    submitted: Arc<Mutex<Vec<(String, ChangeSet)>>>,
    failing_zones: Arc<HashSet<String>>,
}

impl MockZoneProvider {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(Vec::new()),
            records: Arc::new(Mutex::new(HashMap::new())),
            list_zones_calls: Arc::new(AtomicUsize::new(0)),
            listed_zones: Arc::new(Mutex::new(Vec::new())),
            submitted: Arc::new(Mutex::new(Vec::new())),
            failing_zones: Arc::new(HashSet::new()),
        }
    }

    /// Add a zone with its records
    pub fn with_zone(mut self, name: &str, dns_name: &str, records: Vec<ProviderRecord>) -> Self {
        Arc::make_mut(&mut self.zones).push(ManagedZone::new(name, dns_name));
        self.records
            .lock()
            .unwrap()
            .insert(name.to_string(), records);
        self
    }

    /// Make change submission fail for `zone`
    pub fn failing_submit_for(mut self, zone: &str) -> Self {
        Arc::make_mut(&mut self.failing_zones).insert(zone.to_string());
        self
    }

    /// Create a provider sharing zones, records and counters with `other`
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            records: Arc::clone(&other.records),
            list_zones_calls: Arc::clone(&other.list_zones_calls),
            listed_zones: Arc::clone(&other.listed_zones),
            submitted: Arc::clone(&other.submitted),
            failing_zones: Arc::clone(&other.failing_zones),
        }
    }

    pub fn list_zones_calls(&self) -> usize {
        self.list_zones_calls.load(Ordering::SeqCst)
    }

    /// Zones whose records were listed, in call order
    pub fn listed_zones(&self) -> Vec<String> {
        self.listed_zones.lock().unwrap().clone()
    }

    /// Submitted changes, in call order
    pub fn submitted(&self) -> Vec<(String, ChangeSet)> {
        self.submitted.lock().unwrap().clone()
    }

    /// Current records of a zone
    pub fn records_of(&self, zone: &str) -> Vec<ProviderRecord> {
        self.records
            .lock()
            .unwrap()
            .get(zone)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ZoneProvider for MockZoneProvider {
    async fn list_zones(&self) -> Result<Vec<ManagedZone>> {
        self.list_zones_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.zones.as_ref().clone())
    }

    async fn list_records(&self, zone: &ManagedZone) -> Result<Vec<ProviderRecord>> {
        self.listed_zones.lock().unwrap().push(zone.name.clone());
        Ok(self.records_of(&zone.name))
    }

    async fn submit_change(&self, zone: &ManagedZone, change: &ChangeSet) -> Result<()> {
        if self.failing_zones.contains(&zone.name) {
            return Err(cnamesync_core::Error::provider("mock", "change rejected"));
        }

        self.submitted
            .lock()
            .unwrap()
            .push((zone.name.clone(), change.clone()));

        // Apply atomically: drop deleted record sets, then add the new ones
        let mut records = self.records.lock().unwrap();
        let zone_records = records.entry(zone.name.clone()).or_default();
        zone_records.retain(|r| {
            !change
                .deletions
                .iter()
                .any(|d| d.name == r.name && d.record_type == r.record_type)
        });
        zone_records.extend(change.additions.iter().cloned());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a config with instant retries
pub fn fast_config(reference: &str, domains: &[&str]) -> SyncConfig {
    SyncConfig::new(reference, domains.iter().map(|d| d.to_string()).collect())
        .with_retry(RetryPolicy::new(3, Duration::ZERO))
        .with_pass_timeout(Duration::from_secs(5))
}
