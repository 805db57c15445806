//! Snapshot request flow: URL assembly, signature probing, bounded retry.

use std::io::Cursor;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use reqwest::blocking::Client;
use url::Url;

use crate::codes::ErrorCategory;
use crate::surface::ImageSurface;
use crate::{Error, Result, SnapshotConfig, SnapshotRequest};

/// What a fetched payload turned out to be.
enum Probe {
    /// A real rendered snapshot (or at least a plausibly sized image)
    Snapshot,
    /// The 1-pixel-high error signature; the width carries the error code
    ErrorCode(u32),
}

/// One pass through the retry loop, shared by the snapshot and icon flows.
struct Attempt<'a> {
    /// Path segment under the entry point (`free` or `icon`)
    endpoint: &'a str,
    /// Value of the `url` query pair
    target: &'a str,
    /// Caller-supplied URL, used verbatim in log lines
    label: &'a str,
    /// What is being generated, for log lines (`snapshot` / `website icon`)
    noun: &'a str,
    preload: bool,
    /// Effective dimensions for placeholder/error templates
    width: u32,
    height: u32,
    /// Dimensions to send as `w`/`h`; 0 suppresses the pair
    query_width: u32,
    query_height: u32,
    max_age: i64,
    retries: u32,
}

/// Client for the remote snapshot service.
///
/// Holds the long-lived configuration and a blocking HTTP client. The
/// configuration is public: templates, retry budget and error tables may be
/// reassigned between requests.
pub struct SnapshotClient {
    pub config: SnapshotConfig,
    http: Client,
}

impl SnapshotClient {
    /// Create a client around a configuration.
    ///
    /// Fails when the API key is empty or the HTTP client cannot be built.
    pub fn new(config: SnapshotConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("API key must not be empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Init(format!("Failed to build HTTP client: {}", e)))?;

        Ok(SnapshotClient { config, http })
    }

    /// Generate a snapshot of `request.url` and keep `surface` updated with
    /// its representation. While the snapshot is being rendered the surface
    /// shows a placeholder; if it cannot be generated, a status image with
    /// the failure reason is shown instead.
    ///
    /// Passing no surface turns the call into a preload: the server prepares
    /// the snapshot for a future request and nothing is displayed.
    ///
    /// The return value only signals that the request was accepted. Callers
    /// observe the outcome through the surface's final source.
    pub fn request_snapshot(
        &self,
        request: &SnapshotRequest,
        mut surface: Option<&mut dyn ImageSurface>,
    ) -> bool {
        if request.url.trim().is_empty() {
            self.log("URL not provided", None);
            return false;
        }

        let preload = request.preload || surface.is_none();
        let retries = request.retries.unwrap_or(self.config.max_retry);
        let max_age = clamp_max_age(request.max_age_minutes);

        // A caller-supplied width travels to the server; otherwise fall back
        // to the surface's current dimensions for the local templates only.
        let (mut width, mut height) = (request.width, request.height);
        if width == 0 {
            if let Some(s) = &surface {
                if s.width() > 0 {
                    width = s.width();
                    height = s.height();
                }
            }
        }

        if !preload {
            if let Some(s) = surface.as_mut() {
                s.set_source(&self.placeholder_image(width, height));
            }
        }

        self.run(
            Attempt {
                endpoint: "free",
                target: request.url.trim(),
                label: &request.url,
                noun: "snapshot",
                preload,
                width,
                height,
                query_width: request.width,
                query_height: request.height,
                max_age,
                retries,
            },
            surface,
        );

        true
    }

    /// Load a website's icon through the same request/response convention as
    /// the snapshot flow. The path part of the URL is ignored; only the
    /// site's origin identifies it.
    pub fn request_website_icon(
        &self,
        request: &SnapshotRequest,
        mut surface: Option<&mut dyn ImageSurface>,
    ) -> bool {
        if request.url.trim().is_empty() {
            self.log("URL not provided", None);
            return false;
        }

        let origin = match Url::parse(request.url.trim()) {
            Ok(parsed) if parsed.has_host() => parsed.origin().ascii_serialization(),
            _ => {
                self.log(
                    &format!("Cannot derive a site origin from: {}", request.url),
                    None,
                );
                return false;
            }
        };

        let preload = request.preload || surface.is_none();
        let retries = request.retries.unwrap_or(self.config.max_retry);
        let max_age = clamp_max_age(request.max_age_minutes);

        let (mut width, mut height) = (request.width, request.height);
        if width == 0 {
            if let Some(s) = &surface {
                if s.width() > 0 {
                    width = s.width();
                    height = s.height();
                }
            }
        }

        if !preload {
            if let Some(s) = surface.as_mut() {
                s.set_source(&self.placeholder_image(width, height));
            }
        }

        self.run(
            Attempt {
                endpoint: "icon",
                target: &origin,
                label: &request.url,
                noun: "website icon",
                preload,
                width,
                height,
                // Icons come in the server's standard size
                query_width: 0,
                query_height: 0,
                max_age,
                retries,
            },
            surface,
        );

        true
    }

    /// Immediate-retry attempt loop. Each pass rebuilds the request URL so
    /// the cache-busting `rnd` value differs between attempts.
    fn run(&self, attempt: Attempt<'_>, mut surface: Option<&mut dyn ImageSurface>) {
        let mut retries = attempt.retries;

        loop {
            let request_url = self.build_request_url(
                attempt.endpoint,
                attempt.target,
                attempt.max_age,
                attempt.query_width,
                attempt.query_height,
            );

            match self.fetch_probe(&request_url) {
                // The signature is only inspected for display requests;
                // preloads have nothing to swap out on success.
                Ok(Probe::ErrorCode(code)) if !attempt.preload => {
                    if retries > 0 && self.config.recoverable_error_codes.contains(&code) {
                        self.log(
                            &format!(
                                "Retrying {} generation {} time(s) more for: {}",
                                attempt.noun, retries, attempt.label
                            ),
                            Some(code),
                        );
                        retries -= 1;
                        continue;
                    }

                    self.log(
                        &format!("Error generating {} for: {}", attempt.noun, attempt.label),
                        Some(code),
                    );
                    if let Some(s) = surface.as_mut() {
                        s.set_source(&self.error_image(attempt.width, attempt.height, Some(code)));
                    }
                    return;
                }
                Ok(_) => {
                    // Rendered payload is ready; hand the request URL to the
                    // surface so the host fetches and displays it.
                    if !attempt.preload {
                        if let Some(s) = surface.as_mut() {
                            s.set_source(&request_url);
                        }
                    }
                    return;
                }
                Err(err) => {
                    if retries > 0 {
                        self.log(
                            &format!(
                                "Retrying {} generation {} time(s) more for: {} ({})",
                                attempt.noun, retries, attempt.label, err
                            ),
                            None,
                        );
                        retries -= 1;
                        continue;
                    }

                    self.log(
                        &format!(
                            "Could not communicate with server or error 500 returned, error generating {} for: {}",
                            attempt.noun, attempt.label
                        ),
                        None,
                    );
                    if let Some(s) = surface.as_mut() {
                        s.set_source(&self.error_image(attempt.width, attempt.height, None));
                    }
                    return;
                }
            }
        }
    }

    /// GET the request URL and decide whether the payload is a snapshot or
    /// the in-band error signature.
    fn fetch_probe(&self, request_url: &str) -> Result<Probe> {
        let response = self
            .http
            .get(request_url)
            .send()
            .map_err(|e| Error::Network(format!("GET failed: {}", e)))?;

        let bytes = response
            .bytes()
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        let (width, height) = image::io::Reader::new(Cursor::new(bytes.as_ref()))
            .with_guessed_format()
            .map_err(|e| Error::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| Error::Decode(e.to_string()))?;

        if height == 1 && width > 0 {
            Ok(Probe::ErrorCode(width))
        } else {
            Ok(Probe::Snapshot)
        }
    }

    /// Assemble the request URL for one attempt.
    ///
    /// `width` of 0 suppresses the `w` pair; `height` is only sent alongside
    /// a positive `width`.
    fn build_request_url(
        &self,
        endpoint: &str,
        target: &str,
        max_age: i64,
        width: u32,
        height: u32,
    ) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("api_call", "true");
        query.append_pair("apikey", &self.config.api_key);
        query.append_pair("version", &self.config.version);
        query.append_pair("rnd", &rand::random::<f64>().to_string());
        query.append_pair("maxage", &max_age.to_string());
        query.append_pair("url", target);

        if width > 0 {
            query.append_pair("w", &width.to_string());
            if height > 0 {
                query.append_pair("h", &height.to_string());
            }
        }

        format!(
            "{}/{}?{}",
            self.config.api_entry_point,
            endpoint,
            query.finish()
        )
    }

    // --- Pure helpers (no side effects, safe to call anywhere) ---

    /// URL of the placeholder shown while a snapshot is being rendered.
    pub fn placeholder_image(&self, width: u32, height: u32) -> String {
        fill_dimension_tokens(&self.config.url_img_loading, width, height)
    }

    /// URL of the error image to use for the given dimensions and code.
    ///
    /// An absent code produces the generic (transport failure) image.
    pub fn error_image(&self, width: u32, height: u32, code: Option<u32>) -> String {
        let category = ErrorCategory::classify(code);
        let path = self
            .config
            .url_img_error
            .replacen("ERROR_CODE", &category.to_string(), 1);
        fill_dimension_tokens(&path, width, height)
    }

    /// Human-readable description for a server error code, if documented.
    pub fn error_code_description(&self, code: u32) -> Option<&str> {
        self.config.err_desc.get(&code).map(String::as_str)
    }

    /// Format a diagnostic line tagged with the client version. A positive
    /// error code is appended together with its description, when known.
    pub fn log_line(&self, message: &str, code: Option<u32>) -> String {
        let mut line = format!(
            "{} - SnapshotClient - {} - {}",
            Utc::now().to_rfc3339(),
            self.config.version,
            message
        );

        if let Some(code) = code.filter(|c| *c > 0) {
            line.push_str(&format!(
                " - Error Code: {}, Description: {}",
                code,
                self.error_code_description(code).unwrap_or_default()
            ));
        }

        line
    }

    /// Emit a diagnostic line through the `log` facade.
    pub fn log(&self, message: &str, code: Option<u32>) {
        let line = self.log_line(message, code);
        if code.filter(|c| *c > 0).is_some() {
            warn!("{}", line);
        } else {
            info!("{}", line);
        }
    }
}

/// Substitute the `WIDTH`/`HEIGHT` tokens (first occurrence each). A missing
/// height falls back to a 4:3 aspect derived from the width.
fn fill_dimension_tokens(template: &str, width: u32, height: u32) -> String {
    let height = if height > 0 {
        height
    } else {
        (width as f64 * 0.75).ceil() as u32
    };

    template
        .replacen("WIDTH", &width.to_string(), 1)
        .replacen("HEIGHT", &height.to_string(), 1)
}

/// Unset and negative max-age values both resolve to 0.
fn clamp_max_age(max_age_minutes: Option<i64>) -> i64 {
    max_age_minutes.unwrap_or(0).max(0)
}
