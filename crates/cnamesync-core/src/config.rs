//! Configuration types for the reconciliation engine
//!
//! Built once at startup (see the `cnamesyncd` daemon) and handed to
//! [`crate::SyncEngine`]; nothing is read from the environment here.

use crate::diff::DEFAULT_RECORD_TTL;
use crate::resolver::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Reference hostname whose address every managed domain must carry
    pub reference_name: String,

    /// Managed hostnames (possibly `*.`-prefixed)
    pub domains: Vec<String>,

    /// Retry policy for every lookup
    #[serde(default)]
    pub retry: RetryPolicy,

    /// TTL written on replaced records
    #[serde(default = "default_record_ttl")]
    pub record_ttl: u32,

    /// Deadline for a whole pass
    #[serde(default = "default_pass_timeout")]
    pub pass_timeout: Duration,
}

impl SyncConfig {
    /// Create a configuration with defaults
    ///
    /// The reference name is trimmed; the domains are kept verbatim and
    /// trimmed during classification.
    pub fn new(reference_name: impl Into<String>, domains: Vec<String>) -> Self {
        Self {
            reference_name: reference_name.into().trim().to_string(),
            domains,
            retry: RetryPolicy::default(),
            record_ttl: default_record_ttl(),
            pass_timeout: default_pass_timeout(),
        }
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the pass deadline
    pub fn with_pass_timeout(mut self, pass_timeout: Duration) -> Self {
        self.pass_timeout = pass_timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.reference_name.is_empty() {
            return Err(crate::Error::config("Reference name (CNAME) cannot be empty"));
        }

        if self.domains.iter().all(|d| d.trim().is_empty()) {
            return Err(crate::Error::config("No domains configured"));
        }

        if self.retry.max_attempts == 0 {
            return Err(crate::Error::config("Resolver max attempts must be > 0"));
        }

        if self.pass_timeout.is_zero() {
            return Err(crate::Error::config("Pass timeout must be > 0"));
        }

        Ok(())
    }
}

fn default_record_ttl() -> u32 {
    DEFAULT_RECORD_TTL
}

fn default_pass_timeout() -> Duration {
    Duration::from_secs(120)
}
