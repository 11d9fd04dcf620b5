// # cnamesync-core
//
// Core library for keeping DNS A records pinned to the address of a
// reference name.
//
// ## Architecture Overview
//
// - **NameLookup**: Trait for a single hostname -> address lookup
// - **Resolver**: Bounded fixed-delay retry around a `NameLookup`
// - **classify**: Finds configured domains that disagree with the reference IP
// - **zone**: Matches wrong domains against a provider zone
// - **diff**: Computes the paired deletions/additions for one zone
// - **ZoneProvider**: Trait for the DNS provider (zones, records, changes)
// - **SyncEngine**: Orchestrates one reconciliation pass
//
// ## Design Principles
//
// 1. **Stateless passes**: Every pass starts from the resolver and the
//    provider; nothing is persisted between passes
// 2. **Provider is the source of truth**: A record already at the reference
//    address is never touched
// 3. **Library-First**: The daemon is a thin trigger around `SyncEngine`

pub mod traits;
pub mod domain;
pub mod resolver;
pub mod classify;
pub mod zone;
pub mod diff;
pub mod engine;
pub mod report;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{NameLookup, ZoneProvider};
pub use domain::{Domain, effective_lookup_host, top_level_domain};
pub use resolver::{Resolver, RetryPolicy, SystemLookup};
pub use zone::ZoneMembership;
pub use diff::{ChangeSet, DEFAULT_RECORD_TTL, build_diff};
pub use engine::SyncEngine;
pub use report::{ReconcileReport, ZoneOutcome};
pub use config::SyncConfig;
pub use error::{Error, Result};
