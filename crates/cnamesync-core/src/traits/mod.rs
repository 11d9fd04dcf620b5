//! Core traits for cnamesync
//!
//! This module defines the abstract interfaces the engine depends on.
//!
//! - [`NameLookup`]: One hostname -> address lookup attempt
//! - [`ZoneProvider`]: List zones and records, submit atomic changes

pub mod name_lookup;
pub mod zone_provider;

pub use name_lookup::NameLookup;
pub use zone_provider::{ManagedZone, ProviderRecord, ZoneProvider, RECORD_TYPE_A};
