//! Arena PLM MCP server exposing item search to agents.

pub mod client;
pub mod config;
pub mod error;
mod tools;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
        Tool,
    },
    service::RequestContext,
};
use tokio::sync::Mutex;

pub use crate::client::{ArenaClient, Item, LifecyclePhase, SearchQuery, SearchResult, Session};
pub use crate::config::{Config, CredentialSource, Credentials};
pub use crate::error::ArenaError;
pub use crate::tools::{NO_ITEMS_FOUND, SEARCH_ITEMS, SearchItemsInput, format_results};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const INSTRUCTIONS: &str = "Search Arena PLM items with the search_items tool. \
    Authentication uses ARENA_EMAIL and ARENA_PASSWORD from the server environment.";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// MCP server for the Arena PLM API.
///
/// The Arena client is created and logged in on the first tool call that needs
/// it, then reused. The mutex is held only while the session is checked and
/// the login runs, so concurrent first calls log in once and searches overlap.
#[derive(Clone)]
pub struct Server {
    config: Config,
    credentials: CredentialSource,
    client: Arc<Mutex<Option<ArenaClient>>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Server {
    /// Create a server configured from the environment.
    pub fn new() -> Self {
        let config = Config::from_env();
        tracing::info!("Using Arena API at {}", config.base_url);
        Self::with_config(config, CredentialSource::Environment)
    }

    /// Create a server with explicit connection settings and credentials.
    pub fn with_config(config: Config, credentials: CredentialSource) -> Self {
        Self {
            config,
            credentials,
            client: Arc::new(Mutex::new(None)),
        }
    }

    /// The static tool catalog.
    pub fn tools(&self) -> Vec<Tool> {
        vec![tools::tool()]
    }

    /// Run a tool and render its outcome as text.
    ///
    /// Unknown tools and failures are reported in the returned text rather
    /// than as errors.
    pub async fn dispatch(&self, name: &str, arguments: Option<JsonObject>) -> String {
        match name {
            SEARCH_ITEMS => match self.search_items(arguments).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(code = e.code(), "{SEARCH_ITEMS} failed: {e}");
                    format!("Error: {e}")
                }
            },
            _ => {
                tracing::debug!("Unknown tool requested: {name}");
                format!("Unknown tool: {name}")
            }
        }
    }

    /// Whether the server currently holds a logged-in client.
    pub async fn is_authenticated(&self) -> bool {
        self.client
            .lock()
            .await
            .as_ref()
            .is_some_and(ArenaClient::is_authenticated)
    }

    /// Log out the cached client, if any. The next tool call logs in again.
    pub async fn logout(&self) -> Result<(), ArenaError> {
        match self.client.lock().await.as_mut() {
            Some(client) => client.logout().await,
            None => Ok(()),
        }
    }

    /// Release the cached client.
    pub async fn shutdown(&self) {
        if let Some(client) = self.client.lock().await.take() {
            client.close();
        }
    }

    async fn search_items(&self, arguments: Option<JsonObject>) -> Result<String, ArenaError> {
        let input = SearchItemsInput::from_arguments(arguments)?;

        let client = self.authenticated_client().await?;
        let result = client.search(&input.to_query()).await?;

        Ok(format_results(&result))
    }

    /// Get a handle to the logged-in client, logging in first if needed.
    ///
    /// The lock is released before the handle is returned.
    async fn authenticated_client(&self) -> Result<ArenaClient, ArenaError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref().filter(|c| c.is_authenticated()) {
            return Ok(client.clone());
        }

        let credentials = self.credentials.resolve()?;
        let mut client = ArenaClient::new(&self.config)?;
        client
            .login(
                &credentials.email,
                &credentials.password,
                credentials.workspace_id,
            )
            .await?;

        let handle = client.clone();
        *slot = Some(client);
        Ok(handle)
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations: Server Handler
//--------------------------------------------------------------------------------------------------

impl ServerHandler for Server {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let text = self.dispatch(&request.name, request.arguments).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn offline_server() -> Server {
        Server::with_config(
            Config::with_base_url("http://127.0.0.1:9"),
            CredentialSource::Fixed(Credentials::new("user@example.com", "secret")),
        )
    }

    #[test]
    fn test_catalog_has_one_tool() {
        let tools = offline_server().tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, SEARCH_ITEMS);
    }

    #[test]
    fn test_server_info_enables_tools() {
        let info = offline_server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.is_some());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_text() {
        let text = offline_server().dispatch("delete_items", None).await;
        assert_eq!(text, "Unknown tool: delete_items");
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_text() {
        let args = json!({ "bogus": true });
        let text = offline_server()
            .dispatch(SEARCH_ITEMS, args.as_object().cloned())
            .await;
        assert!(text.starts_with("Error: Invalid arguments:"), "{text}");
    }

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let server = offline_server();
        assert!(!server.is_authenticated().await);
        server.logout().await.unwrap();
        server.shutdown().await;
    }
}
