//! Authenticated HTTP download of attachment binaries.
//!
//! Attachment metadata carries a direct URL; content is fetched with HTTP basic
//! auth using the session credentials. Credentials are read-only and shared.

use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::config::{ClientConfig, Credentials};
use crate::error::{AppError, AppResult};
use crate::services::AttachmentSource;

/// Blocking HTTP client for attachment content.
#[derive(Clone)]
pub struct HttpAttachmentClient {
    credentials: Credentials,
    http_client: reqwest::blocking::Client,
}

impl HttpAttachmentClient {
    /// Create a new client from configuration.
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::HttpClient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials: config.credentials.clone(),
            http_client,
        })
    }
}

impl AttachmentSource for HttpAttachmentClient {
    fn fetch(&self, file_name: &str, url: &str) -> AppResult<Vec<u8>> {
        debug!("Downloading attachment '{}' from {}", file_name, url);

        let failed = |reason: String| AppError::AttachmentDownloadFailed {
            file_name: file_name.to_string(),
            reason,
        };

        let response = self
            .http_client
            .get(url)
            .basic_auth(
                &self.credentials.user,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .map_err(|e| {
                warn!("Attachment request for '{}' failed: {}", file_name, e);
                failed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Attachment download for '{}' returned HTTP {}",
                file_name, status
            );
            return Err(failed(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().map_err(|e| failed(e.to_string()))?;
        debug!("Downloaded attachment '{}' ({} bytes)", file_name, bytes.len());
        Ok(bytes.to_vec())
    }
}
