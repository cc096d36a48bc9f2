//! Configuration for the Arena MCP server, loaded from environment variables.

use std::time::Duration;

use crate::error::ArenaError;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Default Arena REST API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.arenasolutions.com/v1";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Environment variable for the login email.
pub const EMAIL_ENV: &str = "ARENA_EMAIL";

/// Environment variable for the login password.
pub const PASSWORD_ENV: &str = "ARENA_PASSWORD";

/// Environment variable for the optional workspace id.
pub const WORKSPACE_ID_ENV: &str = "ARENA_WORKSPACE_ID";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "ARENA_BASE_URL";

/// Environment variable overriding the request timeout.
pub const TIMEOUT_MS_ENV: &str = "ARENA_TIMEOUT_MS";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Connection settings for the Arena API.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Arena REST API, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

/// Login credentials for an Arena session.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub workspace_id: Option<i64>,
}

/// Where the server gets credentials from when it needs to log in.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Read `ARENA_EMAIL`, `ARENA_PASSWORD` and `ARENA_WORKSPACE_ID` at login time.
    Environment,

    /// Use the given credentials.
    Fixed(Credentials),
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("workspace_id", &self.workspace_id)
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Config {
    /// Create a configuration pointing at the given base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_base_url(&v))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_ms = match lookup(TIMEOUT_MS_ENV) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid {TIMEOUT_MS_ENV}={raw:?}");
                DEFAULT_TIMEOUT_MS
            }),
            None => DEFAULT_TIMEOUT_MS,
        };

        Self {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            workspace_id: None,
        }
    }

    pub fn with_workspace_id(mut self, workspace_id: i64) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    /// Load credentials from environment variables.
    ///
    /// Fails with [`ArenaError::MissingCredentials`] when the email or password
    /// is unset or empty.
    pub fn from_env() -> Result<Self, ArenaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ArenaError> {
        let email = lookup(EMAIL_ENV).filter(|v| !v.is_empty());
        let password = lookup(PASSWORD_ENV).filter(|v| !v.is_empty());

        let (Some(email), Some(password)) = (email, password) else {
            return Err(ArenaError::MissingCredentials);
        };

        let workspace_id = match lookup(WORKSPACE_ID_ENV).filter(|v| !v.is_empty()) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| ArenaError::InvalidWorkspaceId(raw.clone()))?,
            ),
            None => None,
        };

        Ok(Self {
            email,
            password,
            workspace_id,
        })
    }
}

impl CredentialSource {
    /// Produce credentials for a login attempt.
    pub fn resolve(&self) -> Result<Credentials, ArenaError> {
        match self {
            CredentialSource::Environment => Credentials::from_env(),
            CredentialSource::Fixed(credentials) => Ok(credentials.clone()),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
