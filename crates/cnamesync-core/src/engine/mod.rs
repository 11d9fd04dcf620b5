//! Reconciliation engine
//!
//! The SyncEngine is responsible for:
//! - Resolving the reference name
//! - Classifying the configured domains
//! - Matching wrong domains against every provider zone
//! - Submitting one atomic change per affected zone
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────┐
//!     trigger ───────▶ │  SyncEngine  │
//!                      └──────────────┘
//!                              │
//!         ┌────────────────────┼─────────────────────┐
//!         ▼                    ▼                     ▼
//! ┌──────────────┐    ┌─────────────────┐    ┌──────────────┐
//! │   Resolver   │    │ match_zone +    │    │ ZoneProvider │
//! │ (retrying)   │    │ build_diff      │    │ (list/submit)│
//! └──────────────┘    └─────────────────┘    └──────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Resolve the reference name (fatal on failure)
//! 2. Classify the domains (fatal on any failure); stop if none are wrong
//! 3. List zones (fatal on failure)
//! 4. Per zone: match, list records, diff, submit. A failing zone is
//!    recorded in the report and the next zone is evaluated.

use crate::classify::classify;
use crate::config::SyncConfig;
use crate::diff::build_diff;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::report::{ReconcileReport, ZoneOutcome};
use crate::resolver::Resolver;
use crate::traits::{ManagedZone, NameLookup, ZoneProvider};
use crate::zone::match_zone;
use chrono::Utc;
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Call [`SyncEngine::reconcile()`] once per trigger
///
/// Every pass starts from scratch; the engine keeps no state between passes.
///
/// ## Threading
///
/// A pass runs sequentially on the calling task. The engine is `Send + Sync`
/// and can be shared behind an `Arc`; callers that must not overlap passes
/// serialize them themselves.
pub struct SyncEngine {
    /// Retrying resolver for the reference name and the domains
    resolver: Resolver,

    /// DNS provider holding the zones
    provider: Box<dyn ZoneProvider>,

    /// Reconciliation settings
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `lookup`: Single-attempt name lookup, wrapped with `config.retry`
    /// - `provider`: DNS provider implementation
    /// - `config`: Reconciliation configuration
    pub fn new(
        lookup: Box<dyn NameLookup>,
        provider: Box<dyn ZoneProvider>,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver: Resolver::new(lookup, config.retry),
            provider,
            config,
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one reconciliation pass under the configured deadline
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileReport)`: The pass ran to completion. Individual zones
    ///   may still have failed, see [`ReconcileReport::has_failures`].
    /// - `Err(Error)`: The reference or a domain did not resolve, zones could
    ///   not be listed, or the deadline expired.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let deadline = self.config.pass_timeout;
        match tokio::time::timeout(deadline, self.run_pass()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Reconciliation pass exceeded {:?}", deadline);
                Err(Error::Timeout(deadline))
            }
        }
    }

    async fn run_pass(&self) -> Result<ReconcileReport> {
        let started_at = Utc::now();
        info!(
            "Checking {} domain(s) against {}",
            self.config.domains.len(),
            self.config.reference_name
        );

        let reference_ip = self.resolver.resolve(&self.config.reference_name).await?;
        info!("Reference {} resolves to {}", self.config.reference_name, reference_ip);

        let wrong_domains =
            classify(&self.resolver, reference_ip, self.config.domains.as_slice()).await?;

        let mut report = ReconcileReport {
            started_at,
            finished_at: started_at,
            reference_name: self.config.reference_name.clone(),
            reference_ip,
            wrong_domains,
            zones: Vec::new(),
        };

        if report.wrong_domains.is_empty() {
            info!("No wrong domains");
            report.finished_at = Utc::now();
            return Ok(report);
        }

        info!("Wrong domains: {:?}", report.wrong_domain_names());

        let zones = self.provider.list_zones().await.map_err(|e| {
            error!("Could not list zones from {}: {}", self.provider.provider_name(), e);
            e
        })?;
        debug!("Provider {} returned {} zone(s)", self.provider.provider_name(), zones.len());

        for zone in &zones {
            let outcome = match self.correct_zone(zone, &report.wrong_domains, reference_ip).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Failed to correct zone {} ({}): {}", zone.name, zone.dns_name, e);
                    ZoneOutcome::Failed {
                        zone: zone.name.clone(),
                        dns_name: zone.dns_name.clone(),
                        kind: e.kind().to_string(),
                        error: e.to_string(),
                    }
                }
            };
            report.zones.push(outcome);
        }

        if report.has_failures() {
            warn!("{} zone(s) failed during this pass", report.failures().count());
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    /// Evaluate and, if needed, correct one zone
    async fn correct_zone(
        &self,
        zone: &ManagedZone,
        wrong_domains: &[Domain],
        reference_ip: IpAddr,
    ) -> Result<ZoneOutcome> {
        let membership = match_zone(&zone.dns_name, wrong_domains)?;

        if !membership.has_any() {
            debug!("Zone {} ({}) holds no wrong domain", zone.name, zone.dns_name);
            return Ok(ZoneOutcome::NotAffected {
                zone: zone.name.clone(),
                dns_name: zone.dns_name.clone(),
            });
        }

        let records = self.provider.list_records(zone).await?;
        let change = build_diff(&records, &membership, reference_ip, self.config.record_ttl);

        if change.is_empty() {
            info!(
                "Zone {} already correct at the provider for {:?}",
                zone.name,
                membership.names()
            );
            return Ok(ZoneOutcome::AlreadyCorrect {
                zone: zone.name.clone(),
                dns_name: zone.dns_name.clone(),
            });
        }

        info!(
            "Submitting {} record change(s) to zone {}: {:?}",
            change.len(),
            zone.name,
            change.record_names()
        );
        self.provider.submit_change(zone, &change).await?;

        Ok(ZoneOutcome::Corrected {
            zone: zone.name.clone(),
            dns_name: zone.dns_name.clone(),
            records: change.record_names(),
        })
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("resolver", &self.resolver)
            .field("provider", &self.provider.provider_name())
            .field("config", &self.config)
            .finish()
    }
}
