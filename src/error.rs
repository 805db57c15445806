//! Error types for the snapshot client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the snapshot client
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to initialize the client
    #[error("Client initialization failed: {0}")]
    Init(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Network error while fetching from the API
    #[error("Network error: {0}")]
    Network(String),

    /// The response payload could not be read as an image
    #[error("Undecodable response payload: {0}")]
    Decode(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
