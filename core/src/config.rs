//! Environment configuration, resolved once at startup.
//!
//! Every value has a default so a bare `Config::from_env()` talks to local
//! development services. The workflow-run credentials default to a
//! placeholder pair and are not meant for anything beyond a dev cluster.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::ConfigError;

pub const DEFAULT_RECORDS_URL: &str = "http://localhost:30800";
pub const DEFAULT_WORKFLOW_URL: &str = "http://localhost:8080/api/v2";
pub const DEFAULT_WORKFLOW_USERNAME: &str = "admin";
pub const DEFAULT_WORKFLOW_PASSWORD: &str = "admin";
pub const DEFAULT_DASHBOARD_LIMIT: usize = 20;
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Which upstream integration supplies breed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    /// REST API over the breeds table.
    Records,
    /// Workflow orchestrator; records are derived from per-run values.
    Runs,
}

impl FromStr for Integration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "records" | "api" => Ok(Integration::Records),
            "runs" | "workflow" => Ok(Integration::Runs),
            other => Err(format!("expected `records` or `runs`, got `{other}`")),
        }
    }
}

/// Username/password pair sent as an HTTP basic credential.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `authorization` header.
    pub fn header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for one upstream integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamProfile {
    pub base_url: String,
    pub auth: Option<BasicAuth>,
}

impl UpstreamProfile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
        }
    }

    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub integration: Integration,
    pub records: UpstreamProfile,
    pub workflow: UpstreamProfile,
    pub workflow_id: String,
    pub limit: usize,
    pub refresh_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let integration = parse_or(&get, "BREED_INTEGRATION", Integration::Records)?;
        let records_url = get("DOG_BREEDS_API_URL").unwrap_or_else(|| DEFAULT_RECORDS_URL.to_string());
        let workflow_url = get("WORKFLOW_API_URL").unwrap_or_else(|| DEFAULT_WORKFLOW_URL.to_string());
        let username =
            get("WORKFLOW_API_USERNAME").unwrap_or_else(|| DEFAULT_WORKFLOW_USERNAME.to_string());
        let password =
            get("WORKFLOW_API_PASSWORD").unwrap_or_else(|| DEFAULT_WORKFLOW_PASSWORD.to_string());
        let workflow_id = get("BREED_WORKFLOW_ID")
            .unwrap_or_else(|| crate::repository::DEFAULT_WORKFLOW_ID.to_string());
        let limit = parse_nonzero(&get, "BREED_LIMIT", DEFAULT_DASHBOARD_LIMIT)?;
        let refresh_secs = parse_nonzero(&get, "BREED_REFRESH_SECS", DEFAULT_REFRESH_SECS)?;

        Ok(Self {
            integration,
            records: UpstreamProfile::new(records_url),
            workflow: UpstreamProfile::new(workflow_url).with_auth(BasicAuth::new(username, password)),
            workflow_id,
            limit,
            refresh_secs,
        })
    }

    /// Profile of the integration currently selected.
    pub fn active_profile(&self) -> &UpstreamProfile {
        match self.integration {
            Integration::Records => &self.records,
            Integration::Runs => &self.workflow,
        }
    }
}

fn parse_or<G, T>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        },
    }
}

/// Like `parse_or`, but rejects zero.
fn parse_nonzero<G, T>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let parsed = parse_or(get, name, default)?;
    if parsed == T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: get(name).unwrap_or_default(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}
