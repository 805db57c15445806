//! Error-code tables and classification for the snapshot API
//!
//! The API reports failures in-band by answering with a 1-pixel-high image
//! whose width carries a numeric error code. Codes up to 100 are internal
//! service codes; larger codes relay the HTTP status observed while the
//! target site was being rendered.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Error codes the server documents, with their human-readable descriptions.
pub fn default_error_descriptions() -> HashMap<u32, String> {
    [
        (10, "111"),
        (20, "222"),
        (30, "333"),
        (40, "444"),
        (50, "555"),
        (60, "666"),
        (70, "777"),
        (80, "888"),
        (90, "999"),
        (100, "10-10-10"),
        (400, "40-40-40"),
        (600, "60-60-60"),
    ]
    .into_iter()
    .map(|(code, desc)| (code, desc.to_string()))
    .collect()
}

/// Codes for which an automatic retry is worthwhile.
pub fn default_recoverable_codes() -> HashSet<u32> {
    [10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 400]
        .into_iter()
        .collect()
}

/// Coarse bucket an error code falls into, used to pick an error image.
///
/// The bucket string is substituted for the `ERROR_CODE` token of the
/// error-image template, so its `Display` form is part of the URL contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// An HTTP status group relayed by the renderer (`HTTP-200`, `HTTP-400`, ...)
    Http(u32),
    /// An internal service code, reduced to its tens digit group
    Internal(u32),
    /// No code was available (transport failure, no response)
    Unknown,
}

impl ErrorCategory {
    /// Classify a server-reported error code.
    ///
    /// Codes of 600 and above collapse into the `HTTP-500` bucket, codes
    /// strictly above 100 keep their hundreds group, and codes of 100 and
    /// below are internal codes grouped by tens. An absent code classifies
    /// as [`ErrorCategory::Unknown`].
    pub fn classify(code: Option<u32>) -> Self {
        match code {
            Some(c) if c >= 600 => ErrorCategory::Http(500),
            Some(c) if c > 100 => ErrorCategory::Http(c / 100 * 100),
            Some(c) => ErrorCategory::Internal(c / 10),
            None => ErrorCategory::Unknown,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Http(group) => write!(f, "HTTP-{}", group),
            ErrorCategory::Internal(group) => write!(f, "{}", group),
            ErrorCategory::Unknown => write!(f, "0"),
        }
    }
}
