//! Error types for the Arena MCP server.

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("ARENA_EMAIL and ARENA_PASSWORD environment variables required")]
    MissingCredentials,

    #[error("Invalid ARENA_WORKSPACE_ID: {0}")]
    InvalidWorkspaceId(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not authenticated. Call login() first.")]
    NotAuthenticated,

    #[error("HTTP error {status} from {endpoint}")]
    HttpStatus { status: u16, endpoint: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ArenaError {
    /// Get the error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            ArenaError::MissingCredentials => "MISSING_CREDENTIALS",
            ArenaError::InvalidWorkspaceId(_) => "INVALID_WORKSPACE_ID",
            ArenaError::Authentication(_) => "AUTHENTICATION_FAILED",
            ArenaError::NotAuthenticated => "NOT_AUTHENTICATED",
            ArenaError::HttpStatus { .. } => "HTTP_ERROR",
            ArenaError::RequestFailed(_) => "REQUEST_FAILED",
            ArenaError::InvalidResponse(_) => "INVALID_RESPONSE",
            ArenaError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            ArenaError::ClientBuild(_) => "CLIENT_BUILD",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
