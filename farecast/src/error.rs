//! Error types for the fare client, the normalizer and configuration

use thiserror::Error;

/// Errors from the remote fare and place-search services
///
/// Any of these ends the submission that triggered the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FareError {
    /// Network failure or timeout
    #[error("Request failed: {0}")]
    Transport(String),

    /// Service answered with a non-success status
    #[error("Service error (status {status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// A configured base URL could not be used
    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint {
        /// The offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors raised while turning form input into a [`RidePayload`](crate::types::RidePayload)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    /// A required field is unset or blank
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A choice field holds a value outside its vocabulary
    #[error("Unrecognized {field}: {value:?}")]
    Unrecognized {
        /// Field name
        field: &'static str,
        /// Raw value
        value: String,
    },

    /// Distance is not a positive, finite number
    #[error("Invalid distance: {0}")]
    InvalidDistance(f64),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
    },
}
