// # Name Lookup Trait
//
// Defines a single attempt at resolving a hostname.
//
// ## Implementations
//
// - System resolver: `crate::resolver::SystemLookup`
// - Test doubles: `tests/common/mod.rs`
//
// ## Usage
//
// ```rust,ignore
// use cnamesync_core::{NameLookup, SystemLookup};
//
// let addrs = SystemLookup.lookup("example.com").await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for hostname lookup implementations
///
/// # Retry
///
/// Implementations perform exactly one lookup per call. Retrying is owned
/// by [`crate::resolver::Resolver`], which wraps a `NameLookup` with a
/// [`crate::resolver::RetryPolicy`].
#[async_trait]
pub trait NameLookup: Send + Sync {
    /// Look up all addresses of `host`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<IpAddr>)`: Addresses in the order reported by the resolver.
    ///   An empty vector counts as a failed attempt.
    /// - `Err(io::Error)`: The lookup itself failed
    async fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}
