//! Name resolution with bounded fixed-delay retries
//!
//! The [`Resolver`] owns the retry policy; [`NameLookup`] implementations
//! perform exactly one attempt per call.

use crate::error::{Error, Result};
use crate::traits::NameLookup;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed-delay retry policy for lookups
///
/// The delay between attempts is constant; there is no backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of lookup attempts (at least one is always made)
    pub max_attempts: u32,
    /// Pause between two consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Short policy: 5 attempts, 100ms apart
    pub fn short() -> Self {
        Self::new(5, Duration::from_millis(100))
    }

    /// Single attempt, no delay
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    /// 32 attempts, 200ms apart
    fn default() -> Self {
        Self::new(32, Duration::from_millis(200))
    }
}

/// System resolver lookup (getaddrinfo via tokio's blocking pool)
///
/// Addresses come back in getaddrinfo order and are not filtered by family.
/// On a dual-stack host the first address may be IPv6, and the engine then
/// writes that address as the rrdata of an `A` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

#[async_trait]
impl NameLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Resolver applying a [`RetryPolicy`] to a [`NameLookup`]
pub struct Resolver {
    lookup: Box<dyn NameLookup>,
    policy: RetryPolicy,
}

impl Resolver {
    /// Create a resolver
    pub fn new(lookup: Box<dyn NameLookup>, policy: RetryPolicy) -> Self {
        Self { lookup, policy }
    }

    /// Resolve `host` to its first address
    ///
    /// The first attempt returning at least one address wins. An empty answer
    /// counts as a failed attempt.
    ///
    /// # Errors
    ///
    /// [`Error::Resolution`] carrying the host and the last attempt's error
    /// once `max_attempts` attempts have failed.
    pub async fn resolve(&self, host: &str) -> Result<IpAddr> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            match self.lookup.lookup(host).await {
                Ok(addrs) => {
                    if let Some(ip) = addrs.first() {
                        debug!("Resolved {} -> {} (attempt {})", host, ip, attempt);
                        return Ok(*ip);
                    }
                    last_error = "no addresses returned".to_string();
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            warn!(
                "Failed to look up {} (attempt {}/{}): {}",
                host,
                attempt + 1,
                attempts,
                last_error
            );

            // Wait before retry (unless this was the last attempt)
            if attempt + 1 < attempts && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        Err(Error::resolution(host, attempts, last_error))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
