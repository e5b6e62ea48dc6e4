//! Error types for s3-walker
//!
//! This module defines the error hierarchy that covers:
//! - Object store transport and protocol errors
//! - Configuration validation errors
//! - Worker/channel errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Transport errors are transient by default and handled by the fetcher's
//!   retry policy; everything else terminates the enumeration
//! - Fatal errors surface as a single terminal sentinel in the output stream

use thiserror::Error;

/// Top-level error type for the s3-walker library
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Configuration validation errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Object store client errors
    #[error("object store error: {0}")]
    Client(#[from] ClientError),

    /// Malformed listing response
    #[error("protocol error listing '{prefix}': {reason}")]
    Protocol { prefix: String, reason: String },

    /// Enumeration was cancelled before completing
    #[error("enumeration cancelled")]
    Cancelled,

    /// Channel closed unexpectedly
    #[error("channel closed unexpectedly")]
    ChannelClosed,
}

impl WalkerError {
    /// True for errors raised by configuration validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, WalkerError::Config(_))
    }
}

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Bucket name was empty
    #[error("bucket name must not be empty")]
    EmptyBucket,

    /// Worker count below the minimum
    #[error("invalid concurrency {given}: must be at least {min}")]
    InvalidConcurrency { given: usize, min: usize },

    /// Channel capacity below the minimum
    #[error("invalid buffer capacity {given}: must be at least {min}")]
    InvalidCapacity { given: usize, min: usize },
}

/// Errors returned by an [`ObjectStoreClient`](crate::client::ObjectStoreClient)
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Failed to reach the object store for a single page
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The bucket does not exist
    #[error("bucket '{bucket}' not found")]
    NoSuchBucket { bucket: String },
}

impl ClientError {
    /// Shorthand for a transport error with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport {
            message: message.into(),
        }
    }

    /// Check if this error is transient (eligible for retry)
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Result type alias for ClientError
pub type ClientResult<T> = std::result::Result<T, ClientError>;
