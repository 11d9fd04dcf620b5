//! Classification of configured domains against the reference address

use crate::domain::{Domain, effective_lookup_host};
use crate::error::Result;
use crate::resolver::Resolver;
use std::net::IpAddr;
use tracing::{debug, info};

/// Find the configured domains whose address differs from `reference_ip`
///
/// Each entry is trimmed and empty entries are ignored. Every remaining
/// domain is resolved through [`effective_lookup_host`]; the comparison is
/// on the textual form of the address.
///
/// The result keeps configuration order, but callers must not rely on it.
///
/// # Errors
///
/// The pass is all-or-nothing: the first domain that fails to resolve, or
/// the first wrong domain without a top-level domain, aborts classification.
pub async fn classify<S: AsRef<str>>(
    resolver: &Resolver,
    reference_ip: IpAddr,
    domains: &[S],
) -> Result<Vec<Domain>> {
    let reference = reference_ip.to_string();
    let mut wrong = Vec::new();

    for entry in domains {
        let name = entry.as_ref().trim();
        if name.is_empty() {
            continue;
        }

        let lookup_host = effective_lookup_host(name);
        let resolved = resolver.resolve(&lookup_host).await?;

        if resolved.to_string() == reference {
            debug!("{} already points at {}", name, reference);
            continue;
        }

        info!("{} points at {}, expected {}", name, resolved, reference);
        wrong.push(Domain::new(name)?);
    }

    Ok(wrong)
}
