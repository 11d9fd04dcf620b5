//! OAuth2 access tokens for the Cloud DNS API
//!
//! The `CREDENTIALS_JSON` payload is a Google credential file. Two kinds are
//! understood:
//!
//! - `service_account`: an RS256-signed JWT is exchanged for a token
//!   (`urn:ietf:params:oauth:grant-type:jwt-bearer`)
//! - `authorized_user`: the refresh token is exchanged for a token
//!
//! Tokens are cached and refreshed shortly before they expire.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use cnamesync_core::{Error, Result};
use ring::rand::SystemRandom;
use ring::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// OAuth2 scope granting read/write access to Cloud DNS
pub const CLOUD_DNS_SCOPE: &str = "https://www.googleapis.com/auth/ndev.clouddns.readwrite";

/// Google's default token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for service account assertions
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before their reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Credential file as found in `CREDENTIALS_JSON`
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default)]
        private_key_id: Option<String>,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// How tokens are obtained
enum Grant {
    ServiceAccount {
        client_email: String,
        key_id: Option<String>,
        key: RsaKeyPair,
        token_uri: String,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        token_uri: String,
    },
    /// Pre-issued token, never refreshed
    Fixed(String),
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Source of bearer tokens for API calls
///
/// # Security
///
/// The Debug implementation never prints keys, secrets or tokens.
pub struct TokenSource {
    grant: Grant,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.grant {
            Grant::ServiceAccount { client_email, .. } => {
                format!("service_account({client_email})")
            }
            Grant::AuthorizedUser { .. } => "authorized_user".to_string(),
            Grant::Fixed(_) => "fixed".to_string(),
        };
        f.debug_struct("TokenSource")
            .field("grant", &kind)
            .field("credentials", &"<REDACTED>")
            .finish()
    }
}

impl TokenSource {
    /// Build a token source from a Google credential file
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the JSON is malformed, its `type` is not
    /// supported, or the service account key cannot be parsed. Error
    /// messages never include key material.
    pub fn from_credentials_json(json: &str, client: reqwest::Client) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            Error::config(format!(
                "CREDENTIALS_JSON is not a supported credential file \
                (expected type service_account or authorized_user): {}",
                e
            ))
        })?;

        let grant = match file {
            CredentialsFile::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
            } => {
                let der = pem_to_der(&private_key)?;
                let key = RsaKeyPair::from_pkcs8(&der).map_err(|e| {
                    Error::config(format!("service account private key rejected: {}", e))
                })?;
                Grant::ServiceAccount {
                    client_email,
                    key_id: private_key_id,
                    key,
                    token_uri,
                }
            }
            CredentialsFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => Grant::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            },
        };

        Ok(Self {
            grant,
            client,
            cached: Mutex::new(None),
        })
    }

    /// Token source handing out a pre-issued access token
    ///
    /// Useful with `gcloud auth print-access-token` for one-off runs.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            grant: Grant::Fixed(token.into()),
            client: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    /// Get a valid access token, fetching a new one if needed
    pub async fn access_token(&self) -> Result<String> {
        if let Grant::Fixed(token) = &self.grant {
            return Ok(token.clone());
        }

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() + EXPIRY_MARGIN < token.expires_at
        {
            return Ok(token.token.clone());
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let request = match &self.grant {
            Grant::ServiceAccount {
                client_email,
                key_id,
                key,
                token_uri,
            } => {
                let assertion = sign_assertion(client_email, key_id.as_deref(), key, token_uri)?;
                tracing::debug!("Requesting access token for service account {}", client_email);
                self.client
                    .post(token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            }
            Grant::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => {
                tracing::debug!("Refreshing access token for authorized user");
                self.client.post(token_uri).form(&[
                    ("grant_type", "refresh_token"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                ])
            }
            Grant::Fixed(token) => {
                return Ok(CachedToken {
                    token: token.clone(),
                    expires_at: Instant::now() + Duration::from_secs(3600),
                });
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::provider("clouddns", format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::provider(
                "clouddns",
                format!("Token request rejected: {} - {}", status, error_text),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            Error::provider("clouddns", format!("Failed to parse token response: {}", e))
        })?;

        Ok(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

/// Decode the base64 body of a PEM block
fn pem_to_der(pem: &str) -> Result<Vec<u8>> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();

    if body.is_empty() {
        return Err(Error::config("service account private key is empty"));
    }

    STANDARD
        .decode(body)
        .map_err(|e| Error::config(format!("service account private key is not valid PEM: {}", e)))
}

/// Build the signed JWT exchanged for a service account token
fn sign_assertion(
    client_email: &str,
    key_id: Option<&str>,
    key: &RsaKeyPair,
    audience: &str,
) -> Result<String> {
    let now = chrono::Utc::now().timestamp();

    let mut header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
    if let Some(kid) = key_id {
        header["kid"] = serde_json::Value::from(kid);
    }
    let claims = serde_json::json!({
        "iss": client_email,
        "scope": CLOUD_DNS_SCOPE,
        "aud": audience,
        "iat": now,
        "exp": now + ASSERTION_LIFETIME_SECS,
    });

    let signing_input = format!(
        "{}.{}",
        encode_segment(&serde_json::to_vec(&header)?),
        encode_segment(&serde_json::to_vec(&claims)?)
    );

    let mut signature = vec![0u8; key.public().modulus_len()];
    key.sign(
        &RSA_PKCS1_SHA256,
        &SystemRandom::new(),
        signing_input.as_bytes(),
        &mut signature,
    )
    .map_err(|_| Error::provider("clouddns", "Failed to sign token assertion"))?;

    Ok(format!("{}.{}", signing_input, encode_segment(&signature)))
}

fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
