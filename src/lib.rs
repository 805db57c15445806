//! websnap
//!
//! A client for the ReevApp remote website snapshot API: ask the service to
//! render a website, receive the rendered screenshot as an image payload, and
//! keep an on-screen placeholder/error image contract while doing so.
//!
//! # Features
//!
//! - **Placeholder handling**: a loading image is shown on the target surface
//!   while the snapshot is being rendered remotely
//! - **In-band error decoding**: the API reports failures as 1-pixel-high
//!   images whose width carries the error code; the client probes for that
//!   signature and maps codes to templated error images
//! - **Bounded retry**: recoverable codes are retried immediately up to a
//!   configurable budget
//!
//! # Example
//!
//! ```no_run
//! use websnap::{ImageSurface, MemorySurface, SnapshotClient, SnapshotConfig, SnapshotRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SnapshotClient::new(SnapshotConfig::new("1a2b3c"))?;
//!
//! let mut surface = MemorySurface::new(300, 225);
//! let request = SnapshotRequest {
//!     width: 300,
//!     ..SnapshotRequest::new("http://example.com")
//! };
//! let accepted = client.request_snapshot(&request, Some(&mut surface));
//! assert!(accepted);
//! println!("surface now shows {:?}", surface.source());
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod codes;
pub use codes::ErrorCategory;

pub mod surface;
pub use surface::{ImageSurface, MemorySurface};

pub mod client;
pub use client::SnapshotClient;

// Async-friendly facade (worker-backed, mirrors the blocking client)
pub mod async_api;
pub use async_api::{AsyncClient, SnapshotOutcome};

/// Configuration for the snapshot client
///
/// All fields are public and may be reassigned after construction; the API
/// key is the only value that has to be supplied up front. The defaults point
/// at the public free-tier entry point and the stock placeholder/error image
/// templates.
///
/// # Examples
///
/// ```
/// let cfg = websnap::SnapshotConfig::new("1a2b3c");
/// assert!(cfg.is_free_api_key);
/// assert_eq!(cfg.max_retry, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// URL for the API entry point
    pub api_entry_point: String,
    /// Template for the placeholder shown while a snapshot is being rendered.
    /// `WIDTH` and `HEIGHT` tokens are substituted once each.
    pub url_img_loading: String,
    /// Template for error images. `ERROR_CODE`, `WIDTH` and `HEIGHT` tokens
    /// are substituted once each; redefine to use custom error images.
    pub url_img_error: String,
    /// How many times a snapshot is retried before the request is considered
    /// to be in an error state
    pub max_retry: u32,
    /// The API key used when requesting services
    pub api_key: String,
    /// Whether the key belongs to a non-paid plan. Free keys start with `1`.
    /// Derived from the key at construction; treat as read-only.
    pub is_free_api_key: bool,
    /// Client version identifier, passed along with every request
    pub version: String,
    /// Known error codes and their human-readable descriptions
    pub err_desc: HashMap<u32, String>,
    /// Error codes that are worth retrying
    pub recoverable_error_codes: HashSet<u32>,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            api_entry_point: "http://api.reevapp.com".to_string(),
            url_img_loading:
                "https://snapshots.fr-1.storage.online.net/Resources/Images/Loading/Loading-WIDTHxHEIGHT.png"
                    .to_string(),
            url_img_error:
                "https://snapshots.fr-1.storage.online.net/Resources/Images/Error/ERROR_CODE/Error-WIDTHxHEIGHT.png"
                    .to_string(),
            max_retry: 3,
            api_key: String::new(),
            is_free_api_key: false,
            version: "v0.9-beta".to_string(),
            err_desc: codes::default_error_descriptions(),
            recoverable_error_codes: codes::default_recoverable_codes(),
            timeout_ms: 30000,
        }
    }
}

impl SnapshotConfig {
    /// Build a configuration around an API key, deriving the free-tier flag.
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let is_free_api_key = api_key.starts_with('1');
        SnapshotConfig {
            api_key,
            is_free_api_key,
            ..Default::default()
        }
    }

    /// Replace the API key and re-derive the free-tier flag.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
        self.is_free_api_key = self.api_key.starts_with('1');
    }
}

/// Parameters for a single snapshot request
///
/// `width`/`height` of 0 mean "unset": the client falls back to the target
/// surface's dimensions when it has any. Unset retry and max-age values take
/// their defaults from the configuration at request time.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRequest {
    /// URL of the website to snapshot
    pub url: String,
    /// Ask the server to prepare the snapshot without returning it for display
    pub preload: bool,
    /// Requested image width in pixels (0 = unset)
    pub width: u32,
    /// Requested image height in pixels, only honored together with a
    /// positive width (0 = unset)
    pub height: u32,
    /// Maximum acceptable age of a cached snapshot, in minutes. Unset and
    /// negative values both resolve to 0.
    pub max_age_minutes: Option<i64>,
    /// Retry budget for this request; unset means the configured `max_retry`
    pub retries: Option<u32>,
}

impl SnapshotRequest {
    /// A display request for `url` with everything else at its defaults.
    pub fn new(url: impl Into<String>) -> Self {
        SnapshotRequest {
            url: url.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnapshotConfig::default();
        assert_eq!(config.max_retry, 3);
        assert_eq!(config.timeout_ms, 30000);
        assert!(config.api_entry_point.starts_with("http://"));
        assert!(config.url_img_loading.contains("WIDTHxHEIGHT"));
        assert!(config.url_img_error.contains("ERROR_CODE"));
        assert!(!config.is_free_api_key);
    }

    #[test]
    fn test_free_key_derivation() {
        assert!(SnapshotConfig::new("1abcdef").is_free_api_key);
        assert!(!SnapshotConfig::new("9abcdef").is_free_api_key);

        let mut config = SnapshotConfig::new("9abcdef");
        config.set_api_key("1xyz");
        assert!(config.is_free_api_key);
    }

    #[test]
    fn test_config_json_round_trip() {
        let mut config = SnapshotConfig::new("1a2b3c");
        config.max_retry = 5;
        let json = serde_json::to_string(&config).unwrap();
        let back: SnapshotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_retry, 5);
        assert_eq!(back.api_key, "1a2b3c");
        assert_eq!(back.err_desc.get(&40).map(String::as_str), Some("444"));
    }

    #[test]
    fn test_partial_config_overlay_keeps_defaults() {
        let overlay: SnapshotConfig =
            serde_json::from_str(r#"{ "max_retry": 1, "api_entry_point": "http://localhost:9" }"#)
                .unwrap();
        assert_eq!(overlay.max_retry, 1);
        assert_eq!(overlay.api_entry_point, "http://localhost:9");
        // Untouched fields come from the defaults
        assert!(overlay.url_img_error.contains("ERROR_CODE"));
        assert!(overlay.recoverable_error_codes.contains(&400));
    }

    #[test]
    fn test_request_defaults() {
        let request = SnapshotRequest::new("http://example.com");
        assert!(!request.preload);
        assert_eq!(request.width, 0);
        assert_eq!(request.height, 0);
        assert_eq!(request.max_age_minutes, None);
        assert_eq!(request.retries, None);
    }
}
