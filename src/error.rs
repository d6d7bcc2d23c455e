//! Error types for the Checkly provider.

use thiserror::Error;

use crate::client::ApiError;

/// Errors surfaced by provider operations.
///
/// Every variant is rendered to the host as an error diagnostic; the gRPC
/// status mapping is used when an error has to leave the process as a status.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The Checkly API returned an error that has no dedicated variant.
    #[error("API error: {0}")]
    Api(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Resource already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Quota or rate limit exceeded.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Service temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The API call did not finish within the configured timeout.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation not supported by the resource type.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Get the error message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Api(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Transport(_err) => "transport error (see Debug output)",
            Self::AlreadyExists(msg) => msg,
            Self::PermissionDenied(msg) => msg,
            Self::ResourceExhausted(msg) => msg,
            Self::Unavailable(msg) => msg,
            Self::DeadlineExceeded(msg) => msg,
            Self::Unimplemented(msg) => msg,
        }
    }

    /// Whether this error means the remote object no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Convert an API error, prefixing its message with `context`
    /// (for example `"checkly_check create"`).
    pub fn from_api(context: &str, err: ApiError) -> Self {
        let msg = format!("{}: {}", context, err);
        match err {
            ApiError::Status { status, .. } => match status {
                401 | 403 => Self::PermissionDenied(msg),
                404 => Self::NotFound(msg),
                409 => Self::AlreadyExists(msg),
                429 => Self::ResourceExhausted(msg),
                500..=599 => Self::Unavailable(msg),
                _ => Self::Api(msg),
            },
            ApiError::Timeout(_) => Self::DeadlineExceeded(msg),
            ApiError::Http(_) => Self::Unavailable(msg),
            ApiError::Decode { .. } => Self::Api(msg),
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Api(msg) => tonic::Status::internal(msg),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            },
            ProviderError::AlreadyExists(msg) => tonic::Status::already_exists(msg),
            ProviderError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            ProviderError::ResourceExhausted(msg) => tonic::Status::resource_exhausted(msg),
            ProviderError::Unavailable(msg) => tonic::Status::unavailable(msg),
            ProviderError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("check-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: check-123");

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::UnknownResource("checkly_widget".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: checkly_widget");
    }

    #[test]
    fn test_error_to_status() {
        let err = ProviderError::NotFound("test".to_string());
        let status: tonic::Status = err.into();
        assert_eq!(status.code(), tonic::Code::NotFound);

        let err = ProviderError::Validation("test".to_string());
        let status: tonic::Status = err.into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);

        let err = ProviderError::Configuration("test".to_string());
        let status: tonic::Status = err.into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);

        let err = ProviderError::Api("test".to_string());
        let status: tonic::Status = err.into();
        assert_eq!(status.code(), tonic::Code::Internal);

        let err = ProviderError::DeadlineExceeded("test".to_string());
        let status: tonic::Status = err.into();
        assert_eq!(status.code(), tonic::Code::DeadlineExceeded);
    }

    #[test]
    fn test_from_api_status_mapping() {
        let status = |code: u16| ApiError::Status {
            status: code,
            message: "boom".to_string(),
        };

        assert!(matches!(
            ProviderError::from_api("ctx", status(401)),
            ProviderError::PermissionDenied(_)
        ));
        assert!(matches!(
            ProviderError::from_api("ctx", status(403)),
            ProviderError::PermissionDenied(_)
        ));
        assert!(ProviderError::from_api("ctx", status(404)).is_not_found());
        assert!(matches!(
            ProviderError::from_api("ctx", status(409)),
            ProviderError::AlreadyExists(_)
        ));
        assert!(matches!(
            ProviderError::from_api("ctx", status(429)),
            ProviderError::ResourceExhausted(_)
        ));
        assert!(matches!(
            ProviderError::from_api("ctx", status(502)),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            ProviderError::from_api("ctx", status(400)),
            ProviderError::Api(_)
        ));
        assert!(matches!(
            ProviderError::from_api("ctx", ApiError::Timeout("15s".to_string())),
            ProviderError::DeadlineExceeded(_)
        ));
    }

    #[test]
    fn test_from_api_keeps_context_prefix() {
        let err = ProviderError::from_api(
            "checkly_check create",
            ApiError::Status {
                status: 400,
                message: "frequency is invalid".to_string(),
            },
        );
        assert_eq!(
            err.message(),
            "checkly_check create: API error 400: frequency is invalid"
        );
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("check-123".to_string());
        assert_eq!(err.message(), "check-123");

        let err = ProviderError::Configuration("missing api key".to_string());
        assert_eq!(err.message(), "missing api key");
    }
}
