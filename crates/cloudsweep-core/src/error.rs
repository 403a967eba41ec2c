//! Error types for cloudsweep

use thiserror::Error;

/// Error reported by a cloud provider API or its transport.
///
/// Every variant is an *expected* failure: the scan absorbs it at task level
/// and treats the task as contributing no finding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Credentials lack permission for the operation
    #[error("access denied ({code}): {message}")]
    AccessDenied { code: String, message: String },

    /// The service or region is not enabled for the account
    #[error("not enabled ({code}): {message}")]
    NotEnabled { code: String, message: String },

    /// The provider throttled the request
    #[error("throttled ({code}): {message}")]
    Throttled { code: String, message: String },

    /// Any other error returned by the service
    #[error("service error ({code}): {message}")]
    Service { code: String, message: String },

    /// The request never produced a service response (dispatch, timeout, I/O)
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Short machine-friendly label, used in debug logs and task statistics
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AccessDenied { .. } => "access_denied",
            ApiError::NotEnabled { .. } => "not_enabled",
            ApiError::Throttled { .. } => "throttled",
            ApiError::Service { .. } => "service",
            ApiError::Transport(_) => "transport",
        }
    }
}

/// Main error type for cloudsweep operations
#[derive(Error, Debug)]
pub enum CloudsweepError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error with context
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The credential file does not exist
    #[error("Credential file not found: {0}")]
    CredentialsNotFound(String),

    /// A session could not be built for an account
    #[error("Failed to open session: {0}")]
    Session(String),

    /// Enabled regions could not be determined for an account
    #[error("Region discovery failed: {0}")]
    RegionDiscovery(String),

    /// Provider-level API failure
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// No client exists for the requested service
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// The service client does not implement the requested operation
    #[error("Unknown operation {operation} for service {service}")]
    UnknownOperation { service: String, operation: String },

    /// A response document did not have the expected shape
    #[error("Malformed response for {context}: {message}")]
    MalformedResponse { context: String, message: String },

    /// A scan task panicked
    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl CloudsweepError {
    /// Whether this is an expected provider error that scans absorb silently
    pub fn is_provider_error(&self) -> bool {
        matches!(self, CloudsweepError::Api(_))
    }

    /// Shorthand for a malformed response error
    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        CloudsweepError::MalformedResponse {
            context: context.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CloudsweepError {
    fn from(err: serde_json::Error) -> Self {
        CloudsweepError::Serialization(err.to_string())
    }
}

/// Result type alias for cloudsweep operations
pub type Result<T> = std::result::Result<T, CloudsweepError>;
