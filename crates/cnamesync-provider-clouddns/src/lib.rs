// # Google Cloud DNS Provider
//
// This crate provides the Google Cloud DNS provider for cnamesync.
//
// ## Behaviour
//
// - One HTTP request per API call; paginated listings follow `nextPageToken`
// - Full error propagation to the engine (no retry, no backoff)
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401/403, 404, 409, 412, 429, 5xx)
// - Dry-run mode: reads are performed, change submission is only logged
// - Changes are submitted as one atomic `changes.create` call per zone
//
// ## Security Requirements
//
// - Access tokens and credential material NEVER appear in logs
// - `Debug` output redacts credentials
//
// ## API Reference
//
// - Cloud DNS API v1: https://cloud.google.com/dns/docs/reference/rest/v1
// - List zones: GET `/projects/:project/managedZones`
// - List record sets: GET `/projects/:project/managedZones/:zone/rrsets`
// - Create change: POST `/projects/:project/managedZones/:zone/changes`

pub mod auth;

pub use auth::TokenSource;

use async_trait::async_trait;
use cnamesync_core::traits::{ManagedZone, ProviderRecord, ZoneProvider};
use cnamesync_core::{ChangeSet, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloud DNS API base URL
pub const CLOUD_DNS_API_BASE: &str = "https://dns.googleapis.com/dns/v1";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "clouddns";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedZonesListResponse {
    #[serde(default)]
    managed_zones: Vec<ManagedZoneWire>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedZoneWire {
    name: String,
    dns_name: String,
    // uint64 ids are sent as JSON strings, but accept numbers too
    #[serde(default)]
    id: Option<serde_json::Value>,
}

impl From<ManagedZoneWire> for ManagedZone {
    fn from(wire: ManagedZoneWire) -> Self {
        let id = wire.id.map(|id| match id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        ManagedZone {
            name: wire.name,
            dns_name: wire.dns_name,
            id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RrsetsListResponse {
    #[serde(default)]
    rrsets: Vec<ProviderRecord>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChangeRequest<'a> {
    additions: &'a [ProviderRecord],
    deletions: &'a [ProviderRecord],
}

#[derive(Debug, Deserialize)]
struct ChangeResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Google Cloud DNS provider
///
/// Stateless apart from the cached access token; all coordination
/// (which zones to touch, what to change) is owned by `SyncEngine`.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zones, record sets)
/// - Log the intended change payload
/// - **NOT** submit the change
pub struct CloudDnsProvider {
    /// Project holding the managed zones
    project_id: String,

    /// Bearer token source
    /// ⚠️ NEVER log tokens
    tokens: TokenSource,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API base URL (overridable for tests)
    base_url: String,

    /// Dry-run mode: if true, perform GET requests but skip change submission
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudDnsProvider")
            .field("project_id", &self.project_id)
            .field("tokens", &self.tokens)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Build the HTTP client shared by API and token requests
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

impl CloudDnsProvider {
    /// Create a new Cloud DNS provider
    ///
    /// # Parameters
    ///
    /// - `project_id`: Project holding the managed zones
    /// - `tokens`: Source of bearer tokens
    /// - `client`: HTTP client (see [`http_client`])
    /// - `dry_run`: If true, perform GET requests but skip change submission
    pub fn new(
        project_id: impl Into<String>,
        tokens: TokenSource,
        client: reqwest::Client,
        dry_run: bool,
    ) -> Result<Self> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(Error::config("Cloud DNS project id cannot be empty"));
        }

        Ok(Self {
            project_id,
            tokens,
            client,
            base_url: CLOUD_DNS_API_BASE.to_string(),
            dry_run,
        })
    }

    /// Create a provider from the contents of a Google credential file
    pub fn from_credentials_json(
        project_id: impl Into<String>,
        credentials_json: &str,
        dry_run: bool,
    ) -> Result<Self> {
        let client = http_client()?;
        let tokens = TokenSource::from_credentials_json(credentials_json, client.clone())?;
        Self::new(project_id, tokens, client, dry_run)
    }

    /// Use a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether changes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn zones_url(&self) -> String {
        format!("{}/projects/{}/managedZones", self.base_url, self.project_id)
    }

    fn zone_url(&self, zone: &ManagedZone, resource: &str) -> String {
        format!("{}/{}/{}", self.zones_url(), zone.name, resource)
    }

    /// GET a JSON document, optionally continuing a paginated listing
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        page_token: Option<&str>,
    ) -> Result<T> {
        let token = self.tokens.access_token().await?;
        let mut request = self.client.get(url).bearer_auth(token);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let response = check_status(response, url).await?;

        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e)))
    }
}

/// Map non-success responses to errors
async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    Err(status_error(status, &error_text, context))
}

fn status_error(status: u16, error_text: &str, context: &str) -> Error {
    let message = match status {
        401 | 403 => format!(
            "Authentication failed: invalid credentials or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Not found: {} - {}", context, error_text),
        409 => format!("Conflict: change already in progress. Status: {}", status),
        412 => format!(
            "Precondition failed: record set changed since it was read. Status: {} - {}",
            status, error_text
        ),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!("Cloud DNS server error (transient): {} - {}", status, error_text),
        _ => format!("Request to {} failed: {} - {}", context, status, error_text),
    };
    Error::provider(PROVIDER_NAME, message)
}

#[async_trait]
impl ZoneProvider for CloudDnsProvider {
    async fn list_zones(&self) -> Result<Vec<ManagedZone>> {
        let url = self.zones_url();
        let mut zones = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: ManagedZonesListResponse = self.get_json(&url, page_token.as_deref()).await?;
            zones.extend(page.managed_zones.into_iter().map(ManagedZone::from));

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        tracing::debug!("Found {} managed zone(s) in project {}", zones.len(), self.project_id);
        Ok(zones)
    }

    async fn list_records(&self, zone: &ManagedZone) -> Result<Vec<ProviderRecord>> {
        let url = self.zone_url(zone, "rrsets");
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: RrsetsListResponse = self.get_json(&url, page_token.as_deref()).await?;
            records.extend(page.rrsets);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        tracing::debug!("Zone {} has {} record set(s)", zone.name, records.len());
        Ok(records)
    }

    async fn submit_change(&self, zone: &ManagedZone, change: &ChangeSet) -> Result<()> {
        let url = self.zone_url(zone, "changes");
        let payload = ChangeRequest {
            additions: &change.additions,
            deletions: &change.deletions,
        };

        tracing::info!(
            "{} change in zone {}: {:?} [mode: {}]",
            if self.dry_run { "Would submit" } else { "Submitting" },
            zone.name,
            change.record_names(),
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let response = check_status(response, &url).await?;

        let created: ChangeResponse = response.json().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })?;

        tracing::info!(
            "Change {} accepted for zone {} (status: {})",
            created.id.as_deref().unwrap_or("?"),
            zone.name,
            created.status.as_deref().unwrap_or("unknown")
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
