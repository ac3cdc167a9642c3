//! Provider error types

use thiserror::Error;

/// Errors raised by a platform location provider
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// No provider can serve the request (disabled radio, missing hardware)
    #[error("location provider '{provider}' is unavailable")]
    Unavailable { provider: String },
    /// The platform refused access to location data
    #[error("location permission denied")]
    PermissionDenied,
    /// Any other platform failure; the message is the platform's own
    #[error("{message}")]
    Platform { message: String },
}

impl ProviderError {
    pub fn platform(message: impl Into<String>) -> Self {
        ProviderError::Platform { message: message.into() }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_message_is_verbatim() {
        let err = ProviderError::platform("kCLErrorDomain error 0");
        assert_eq!(err.to_string(), "kCLErrorDomain error 0");
    }

    #[test]
    fn test_unavailable_display() {
        let err = ProviderError::Unavailable { provider: "gps".to_string() };
        assert_eq!(err.to_string(), "location provider 'gps' is unavailable");
    }
}
