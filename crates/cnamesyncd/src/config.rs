//! Daemon configuration, read once from the environment

use anyhow::{Context, Result};
use cnamesync_core::{RetryPolicy, SyncConfig};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Optional file of `KEY=value` lines read at startup
pub const ENV_FILE: &str = ".env";

/// Application configuration
pub struct Config {
    pub project_id: String,
    /// ⚠️ NEVER log this value
    pub credentials_json: String,
    pub cname: String,
    pub domains: Vec<String>,
    pub port: u16,
    pub log_level: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub pass_timeout_secs: u64,
    pub dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("project_id", &self.project_id)
            .field("credentials_json", &"<REDACTED>")
            .field("cname", &self.cname)
            .field("domains", &self.domains)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("pass_timeout_secs", &self.pass_timeout_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to `.env`
    ///
    /// A missing or unreadable `.env` file is reported on stderr and the
    /// process environment is used alone.
    pub fn from_env() -> Result<Self> {
        let file = match load_env_file(Path::new(ENV_FILE)) {
            Ok(vars) => vars,
            Err(e) => {
                eprintln!("Error loading {} file: {}", ENV_FILE, e);
                HashMap::new()
            }
        };
        Self::from_lookup(env_over_file(|name| std::env::var(name).ok(), file))
    }

    /// Load configuration from any key/value lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            get(name).with_context(|| {
                format!(
                    "Could not load environment variable {name}. Set it via: export {name}=..."
                )
            })
        };

        let dry_run = match get("DNS_MODE").unwrap_or_default().to_lowercase().as_str() {
            "" | "live" => false,
            "dry-run" => true,
            other => anyhow::bail!(
                "DNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ),
        };

        Ok(Self {
            project_id: required("PROJECT_ID")?,
            credentials_json: required("CREDENTIALS_JSON")?,
            cname: required("CNAME")?.trim().to_string(),
            domains: required("DOMAINS")?
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            port: parse_or(&get, "PORT", 8080)?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            max_attempts: parse_or(
                &get,
                "RESOLVE_MAX_ATTEMPTS",
                RetryPolicy::default().max_attempts,
            )?,
            retry_delay_ms: parse_or(&get, "RESOLVE_RETRY_DELAY_MS", 200)?,
            pass_timeout_secs: parse_or(&get, "RECONCILE_TIMEOUT_SECS", 120)?,
            dry_run,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            anyhow::bail!("PROJECT_ID cannot be empty");
        }

        if self.credentials_json.trim().is_empty() {
            anyhow::bail!("CREDENTIALS_JSON cannot be empty");
        }

        if self.cname.is_empty() {
            anyhow::bail!("CNAME cannot be empty");
        }

        if self.domains.is_empty() {
            anyhow::bail!(
                "DOMAINS must contain at least one domain. \
                Set it via: export DOMAINS=\"www.example.com *.example.org\""
            );
        }

        if !(1..=100).contains(&self.max_attempts) {
            anyhow::bail!(
                "RESOLVE_MAX_ATTEMPTS must be between 1 and 100. Got: {}",
                self.max_attempts
            );
        }

        if self.retry_delay_ms > 10_000 {
            anyhow::bail!(
                "RESOLVE_RETRY_DELAY_MS must be between 0 and 10000. Got: {}",
                self.retry_delay_ms
            );
        }

        if !(1..=3600).contains(&self.pass_timeout_secs) {
            anyhow::bail!(
                "RECONCILE_TIMEOUT_SECS must be between 1 and 3600 seconds. Got: {}",
                self.pass_timeout_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Engine configuration derived from the environment
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(self.cname.clone(), self.domains.clone())
            .with_retry(RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.retry_delay_ms),
            ))
            .with_pass_timeout(Duration::from_secs(self.pass_timeout_secs))
    }
}

/// Read the variables of a dotenv file without touching the process environment
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Lookup preferring `get` and falling back to the file's variables
fn env_over_file(
    get: impl Fn(&str) -> Option<String>,
    file: HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> {
    move |name| get(name).or_else(|| file.get(name).cloned())
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: '{value}'")),
        _ => Ok(default),
    }
}
