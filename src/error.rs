use std::fmt;

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Service error codes that mean the credentials behind a connection are unusable.
const AUTH_ERROR_CODES: &[&str] = &[
    "UnrecognizedClientException",
    "InvalidSignatureException",
    "ExpiredTokenException",
    "MissingAuthenticationTokenException",
    "AccessDeniedException",
    "IncompleteSignatureException",
];

/// What kind of failure a remote call ran into.
///
/// Connection and authentication failures poison the cached client; data
/// failures do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Connection,
    Authentication,
    Data,
}

impl FailureClass {
    /// Whether a cached connection should be dropped after this failure
    pub fn invalidates_connection(&self) -> bool {
        matches!(self, FailureClass::Connection | FailureClass::Authentication)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureClass::Connection => "connection",
            FailureClass::Authentication => "authentication",
            FailureClass::Data => "data",
        };
        f.write_str(name)
    }
}

/// Internal error taxonomy of the gateway.
///
/// Display renders only the root-cause message; the façade adds the context
/// prefix when it converts into [`IntegrationError`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("No DynamoDB action specified")]
    MissingAction,

    #[error("Invalid DynamoDB action {0}")]
    UnknownAction(String),

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    InvalidParameters(String),

    #[error("{message}")]
    RemoteOperation { message: String, class: FailureClass },

    #[error("{0}")]
    Metadata(String),

    #[error("{0}")]
    Connectivity(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Remote failure caused by the data or request, not the connection
    pub fn remote(message: impl Into<String>) -> Self {
        Error::RemoteOperation {
            message: message.into(),
            class: FailureClass::Data,
        }
    }

    /// Failure class if this error came back from a remote call
    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            Error::RemoteOperation { class, .. } => Some(*class),
            _ => None,
        }
    }
}

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// The single error kind visible to the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct IntegrationError {
    pub message: String,
}

impl IntegrationError {
    /// Wrap an internal error behind a context prefix, e.g. `DynamoDB request failed`
    pub fn wrap(context: &str, err: &Error) -> Self {
        Self {
            message: format!("{}, {}", context, err),
        }
    }
}

impl<E, R> From<SdkError<E, R>> for Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        let class = match &err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => FailureClass::Connection,
            SdkError::ServiceError(_) => match err.code() {
                Some(code) if AUTH_ERROR_CODES.contains(&code) => FailureClass::Authentication,
                _ => FailureClass::Data,
            },
            _ => FailureClass::Data,
        };
        let message = match err.message() {
            Some(message) => message.to_string(),
            None => DisplayErrorContext(&err).to_string(),
        };
        Error::RemoteOperation { message, class }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
