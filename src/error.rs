// Error taxonomy for the chat client
//
// Extraction misses are not errors: the parsers return `None`.

use thiserror::Error;

/// Local precondition failures. No remote call is made when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("A message is already being sent")]
    SendInFlight,

    #[error("No active session")]
    NoActiveSession,

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("No file selected")]
    NoFileSelected,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("File is empty: {0}")]
    EmptyFile(String),

    #[error("An upload is already in progress")]
    UploadInFlight,
}

/// Remote call failures. Logged by the caller; never corrupts local state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },

    #[error("{endpoint} rejected the request: {message}")]
    Rejected { endpoint: String, message: String },
}

impl TransportError {
    pub fn request(endpoint: &str, err: impl std::fmt::Display) -> Self {
        TransportError::Request {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(endpoint: &str, err: impl std::fmt::Display) -> Self {
        TransportError::Decode {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    pub fn rejected(endpoint: &str, message: impl Into<String>) -> Self {
        TransportError::Rejected {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }
}

/// Errors from session lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Another session is already active for '{0}'")]
    AlreadyActive(String),
}

impl From<String> for SessionError {
    fn from(message: String) -> Self {
        SessionError::Storage(message)
    }
}
