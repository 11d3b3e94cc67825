use std::time::Duration;

use wreq::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, ORIGIN, REFERER},
    Client, StatusCode,
};
use wreq_util::Emulation;

use crate::credentials::Credentials;
use crate::error::{AdLensError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The service validates this alongside the browser fingerprint; the value
/// is constant across sessions.
const ASBD_ID: &str = "129477";

/// HTTP transport for the Ad Library. Browser identity (user agent,
/// sec-ch-* hints, TLS fingerprint) comes from Chrome-131 emulation; the
/// cookie bundle and the library-specific headers are layered on top.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(credentials: &Credentials, base_url: &str) -> Result<Self> {
        Self::with_timeout(credentials, base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(
        credentials: &Credentials,
        base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(base_url)
                .map_err(|_| AdLensError::ValidationError("Invalid base URL".to_string()))?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&format!("{}/ads/library/", base_url))
                .map_err(|_| AdLensError::ValidationError("Invalid base URL".to_string()))?,
        );
        headers.insert("x-asbd-id", HeaderValue::from_static(ASBD_ID));

        let cookie_str = credentials.cookies.to_header_string();
        if !cookie_str.is_empty() {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&cookie_str)
                    // Avoid echoing cookie content in errors/logs.
                    .map_err(|_| AdLensError::ValidationError("Invalid cookies".to_string()))?,
            );
        }

        let client = Client::builder()
            .emulation(Emulation::Chrome131)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AdLensError::NetworkError(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET a page body as text. Used by the session bootstrap, so an HTML
    /// body is the expected case here, not an error.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdLensError::NetworkError(e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(self.status_to_error(status, &body))
        }
    }

    /// POST a form-encoded GraphQL request. `friendly_name` and `lsd` ride
    /// along as per-request headers the service matches against the body.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, String)],
        friendly_name: &str,
        lsd: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header("x-fb-friendly-name", friendly_name)
            .header("x-fb-lsd", lsd)
            .form(fields)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdLensError::NetworkError(e.to_string()))?;

        if status.is_success() {
            if looks_like_html(&body) {
                // A 200 with markup means we were bounced to the login page.
                return Err(AdLensError::LoginRequired);
            }
            Ok(body)
        } else {
            Err(self.status_to_error(status, &body))
        }
    }

    fn classify_error(&self, error: wreq::Error) -> AdLensError {
        if error.is_timeout() {
            AdLensError::Timeout(error.to_string())
        } else if error.is_connect() {
            AdLensError::NetworkError(format!("Connection failed: {}", error))
        } else {
            AdLensError::NetworkError(error.to_string())
        }
    }

    fn status_to_error(&self, status: StatusCode, body: &str) -> AdLensError {
        match status.as_u16() {
            401 | 403 => {
                if body.trim().is_empty() {
                    AdLensError::Unauthorized(
                        "Session rejected. Provide fresh cookies from a logged-in browser."
                            .to_string(),
                    )
                } else if looks_like_html(body) {
                    AdLensError::LoginRequired
                } else {
                    AdLensError::Unauthorized(body.to_string())
                }
            }
            429 => AdLensError::RateLimited(60),
            _ => {
                if looks_like_html(body) {
                    AdLensError::LoginRequired
                } else {
                    AdLensError::NetworkError(format!("HTTP {}: {}", status, body))
                }
            }
        }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with("<!DOCTYPE") || head.starts_with("<html")
}
