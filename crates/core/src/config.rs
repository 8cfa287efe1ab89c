use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Output location shared by the three Silver jobs.
pub const DEFAULT_OUTPUT_LOCATION: &str = "s3://asksuite-athena-results/athena-temp/";

/// Project that runs BigQuery load jobs when `GCP_PROJECT` is unset.
pub const DEFAULT_GCP_PROJECT: &str = "asksuite-salesops";

pub const DEFAULT_BIGQUERY_ENDPOINT: &str = "https://bigquery.googleapis.com";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Poll intervals must be positive; zero would spin on the status endpoint.
fn profiled_env_interval_ms(profile: &str, key: &str, default: u64) -> u64 {
    match profiled_env_u64(profile, key, default) {
        0 => default,
        ms => ms,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub athena: AthenaConfig,
    pub bigquery: BigQueryConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SILVER_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_opt("SILVER_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            athena: AthenaConfig::from_env_profiled(p),
            bigquery: BigQueryConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  athena:    region={}, workgroup={}, output={}",
            self.athena.region,
            self.athena.workgroup.as_deref().unwrap_or("(default)"),
            self.athena.output_location
        );
        tracing::info!(
            "  athena:    poll={}ms, max_wait={}",
            self.athena.poll_interval_ms,
            self.athena
                .max_wait_seconds
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "unbounded".to_string())
        );
        tracing::info!(
            "  bigquery:  project={}, endpoint={}, token={}",
            self.bigquery.project,
            self.bigquery.endpoint,
            if self.bigquery.access_token.is_some() { "static" } else { "metadata-server" }
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 8080),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Athena / S3 ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthenaConfig {
    /// AWS region for Athena and the S3 result bucket.
    pub region: String,
    /// Athena workgroup; the account default when unset.
    pub workgroup: Option<String>,
    /// S3 prefix Athena writes query results under.
    pub output_location: String,
    /// Fixed delay between status polls.
    pub poll_interval_ms: u64,
    /// Upper bound on polling. `None` polls until a terminal state.
    pub max_wait_seconds: Option<u64>,
}

impl AthenaConfig {
    fn from_env_profiled(p: &str) -> Self {
        let region = profiled_env_opt(p, "AWS_DEFAULT_REGION")
            .or_else(|| profiled_env_opt(p, "AWS_REGION"))
            .unwrap_or_else(|| "us-east-1".to_string());

        Self {
            region,
            workgroup: profiled_env_opt(p, "ATHENA_WORKGROUP"),
            output_location: profiled_env_or(p, "ATHENA_OUTPUT_LOCATION", DEFAULT_OUTPUT_LOCATION),
            poll_interval_ms: profiled_env_interval_ms(p, "ATHENA_POLL_INTERVAL_MS", 2000),
            max_wait_seconds: profiled_env_opt(p, "ATHENA_MAX_WAIT_SECONDS")
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_seconds.map(Duration::from_secs)
    }
}

// ── BigQuery ──────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct BigQueryConfig {
    /// Project that owns the load jobs (and the default for unqualified tables).
    pub project: String,
    /// API base URL, overridable for emulators.
    pub endpoint: String,
    pub poll_interval_ms: u64,
    /// Static OAuth token. When unset the GCE metadata server is asked.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl BigQueryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            project: profiled_env_or(p, "GCP_PROJECT", DEFAULT_GCP_PROJECT),
            endpoint: profiled_env_or(p, "BIGQUERY_ENDPOINT", DEFAULT_BIGQUERY_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            poll_interval_ms: profiled_env_interval_ms(p, "BIGQUERY_POLL_INTERVAL_MS", 1000),
            access_token: profiled_env_opt(p, "GOOGLE_OAUTH_ACCESS_TOKEN"),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl fmt::Debug for BigQueryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigQueryConfig")
            .field("project", &self.project)
            .field("endpoint", &self.endpoint)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────
