use thiserror::Error;

/// Message shown when a failure carries no text of its own.
pub const FALLBACK_USER_MESSAGE: &str = "Request failed. Check your connection or API key.";

/// Message shown when the generation API rejects the selected key.
pub const INVALID_KEY_MESSAGE: &str = "API Key Error. Please re-select a valid key.";

pub const NO_IMAGE_MESSAGE: &str = "No image generated in the response.";

pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate image.";

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Input rejected before any request was issued.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Network or API failure. The message is passed through untouched.
    #[error("{0}")]
    TransportError(String),

    #[error("{}", NO_IMAGE_MESSAGE)]
    EmptyResponseError,

    /// The model answered with text instead of an image.
    #[error("{0}")]
    ContentRejectedError(String),

    #[error("{}", INVALID_KEY_MESSAGE)]
    CredentialError,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LensError {
    /// The single string the UI layer shows for a failed submission.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_USER_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl From<reqwest::Error> for LensError {
    fn from(e: reqwest::Error) -> Self {
        LensError::TransportError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_is_passed_through() {
        let err = LensError::TransportError("Requested entity was not found.".into());
        assert_eq!(err.user_message(), "Requested entity was not found.");
    }

    #[test]
    fn test_empty_reason_falls_back() {
        let err = LensError::TransportError("  ".into());
        assert_eq!(err.user_message(), FALLBACK_USER_MESSAGE);
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(LensError::CredentialError.user_message(), INVALID_KEY_MESSAGE);
        assert_eq!(LensError::EmptyResponseError.user_message(), NO_IMAGE_MESSAGE);
        assert_eq!(
            LensError::ContentRejectedError("Blocked by safety filter".into()).user_message(),
            "Blocked by safety filter"
        );
    }
}
