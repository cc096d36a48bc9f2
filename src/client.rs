//! Arena PLM REST API client with session authentication.

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::ArenaError;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Header carrying the session id on authenticated requests.
pub const SESSION_HEADER: &str = "arena_session_id";

/// Default number of items per search page.
pub const DEFAULT_LIMIT: u32 = 20;

/// Maximum number of items the API returns per page.
pub const MAX_LIMIT: u32 = 400;

/// User-Agent header for requests.
const USER_AGENT: &str = concat!("arena-mcp-server/", env!("CARGO_PKG_VERSION"));

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An authenticated Arena session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub workspace_id: Option<i64>,
}

/// Filters for the item search endpoint. Filters combine with AND semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub number: Option<String>,
    pub description: Option<String>,
    pub category_guid: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// One page of item search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "count_or_zero")]
    pub count: u64,

    #[serde(default, alias = "items")]
    pub results: Vec<Item>,
}

/// An Arena item. Fields not modelled here are kept in `extra`.
///
/// Display fields keep whatever JSON value the API sent, so an unexpected
/// type on one item does not fail the whole page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_number: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_phase: Option<LifecyclePhase>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifecyclePhase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    arena_session_id: String,
    #[serde(default)]
    workspace_id: Option<i64>,
}

/// Client for the Arena PLM REST API.
///
/// Holds one HTTP connection pool for the lifetime of the client. Dropping the
/// client (or calling [`ArenaClient::close`]) releases it. Clones share the
/// pool and carry a copy of the session.
#[derive(Clone)]
pub struct ArenaClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SearchQuery {
    /// Set the page size. Values above [`MAX_LIMIT`] are clamped when the
    /// request is built.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.min(MAX_LIMIT).to_string()),
            ("offset", self.offset.to_string()),
        ];

        let filters = [
            ("name", &self.name),
            ("number", &self.number),
            ("description", &self.description),
            ("category.guid", &self.category_guid),
        ];
        for (key, value) in filters {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push((key, value.to_string()));
            }
        }

        params
    }
}

impl ArenaClient {
    /// Create an unauthenticated client for the configured API.
    pub fn new(config: &Config) -> Result<Self, ArenaError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArenaError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            session: None,
        })
    }

    /// Whether a session from [`ArenaClient::login`] is held.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// The current session, if logged in.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Authenticate and store the returned session, replacing any previous one.
    ///
    /// A workspace id of `0` is treated as absent and not sent.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        workspace_id: Option<i64>,
    ) -> Result<Session, ArenaError> {
        let body = LoginRequest {
            email,
            password,
            workspace_id: workspace_id.filter(|&id| id != 0),
        };

        let response = self
            .http
            .post(self.url("/login"))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ArenaError::Authentication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArenaError::Authentication(format!(
                "login rejected with HTTP {}",
                status.as_u16()
            )));
        }

        let data: LoginResponse = response
            .json()
            .await
            .map_err(|e| ArenaError::Authentication(format!("invalid login response: {e}")))?;

        let session = Session {
            session_id: data.arena_session_id,
            workspace_id: data.workspace_id,
        };
        tracing::info!(workspace_id = ?session.workspace_id, "Logged in to Arena");

        self.session = Some(session.clone());
        Ok(session)
    }

    /// End the current session. Does nothing when not logged in.
    ///
    /// The local session is cleared before the request is sent, so the client
    /// is unauthenticated afterwards even if the request fails.
    pub async fn logout(&mut self) -> Result<(), ArenaError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        let response = self
            .http
            .put(self.url("/logout"))
            .header(CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, &session.session_id)
            .send()
            .await
            .map_err(|e| ArenaError::RequestFailed(e.to_string()))?;

        if response.status().is_success() {
            tracing::info!("Logged out of Arena");
        } else {
            tracing::warn!(
                status = response.status().as_u16(),
                "Arena logout returned an error status"
            );
        }

        Ok(())
    }

    /// Search for items. Requires a prior successful [`ArenaClient::login`].
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, ArenaError> {
        let session = self.session.as_ref().ok_or(ArenaError::NotAuthenticated)?;

        let params = query.to_params();
        tracing::debug!(?params, "Searching Arena items");

        let response = self
            .http
            .get(self.url("/items"))
            .header(CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, &session.session_id)
            .query(&params)
            .send()
            .await
            .map_err(|e| ArenaError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ArenaError::HttpStatus {
                status: response.status().as_u16(),
                endpoint: "/items".to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ArenaError::InvalidResponse(e.to_string()))
    }

    /// Release the HTTP connection pool.
    pub fn close(self) {
        tracing::debug!("Closing Arena client");
        drop(self);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            name: None,
            number: None,
            description: None,
            category_guid: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &"[REDACTED]")
            .field("workspace_id", &self.workspace_id)
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Read `count`, treating `null` as zero.
fn count_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Option::<u64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
