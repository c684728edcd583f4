//! HTTP transport for the Cloudflare API
//!
//! Owns the `reqwest::Client`, the call-level timeout, and the immutable
//! header set (content type, user agent, credentials). Knows nothing about
//! retries.

use crate::models::{ApiEnvelope, Zone};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use seedsync_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Records or zones requested per page on list endpoints
const PER_PAGE: u32 = 100;

/// Hard stop for pagination loops on misbehaving backends
const MAX_PAGES: u32 = 100;

/// Cloudflare credentials
#[derive(Clone)]
pub enum CloudflareAuth {
    /// Scoped API token, sent as `Authorization: Bearer`
    Token(String),
    /// Account email plus global API key, sent as `X-Auth-Email` / `X-Auth-Key`
    GlobalKey { email: String, key: String },
}

// Secrets never reach Debug output
impl std::fmt::Debug for CloudflareAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudflareAuth::Token(_) => f.debug_tuple("Token").field(&"<REDACTED>").finish(),
            CloudflareAuth::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

impl CloudflareAuth {
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        match self {
            CloudflareAuth::Token(token) => {
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    sensitive(&format!("Bearer {}", token))?,
                );
            }
            CloudflareAuth::GlobalKey { email, key } => {
                headers.insert(
                    HeaderName::from_static("x-auth-email"),
                    HeaderValue::from_str(email).map_err(|_| {
                        Error::config("Cloudflare API email is not a valid header value")
                    })?,
                );
                headers.insert(HeaderName::from_static("x-auth-key"), sensitive(key)?);
            }
        }
        Ok(headers)
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| Error::config("Cloudflare credential is not a valid header value"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Thin JSON client over one API base URL
#[derive(Clone)]
pub(crate) struct Transport {
    client: reqwest::Client,
    api_base: String,
}

impl Transport {
    pub(crate) fn new(
        api_base: &str,
        auth: &CloudflareAuth,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = auth.headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Perform one request and decode the envelope
    ///
    /// Non-2xx statuses map onto the error taxonomy; an explicit
    /// `success: false` in a 2xx body is a provider error as well.
    pub(crate) async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        action: &str,
    ) -> Result<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method, self.url(path)).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::http(format!("{}: request timed out", action))
            } else {
                Error::http(format!("{}: HTTP request failed: {}", action, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, action));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("{}: failed to parse response: {}", action, e)))?;

        if envelope.success == Some(false) {
            return Err(Error::provider(
                "cloudflare",
                format!("{} rejected: {}", action, envelope.error_text()),
            ));
        }

        Ok(envelope)
    }

    /// GET every page of a list endpoint
    pub(crate) async fn get_all<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        action: &str,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let mut paged: Vec<(&str, String)> = query.to_vec();
            paged.push(("page", page.to_string()));
            paged.push(("per_page", PER_PAGE.to_string()));

            let envelope: ApiEnvelope<Vec<T>> = self
                .request::<_, ()>(Method::GET, path, &paged, None, action)
                .await?;

            let total_pages = envelope
                .result_info
                .as_ref()
                .map(|info| info.total_pages)
                .unwrap_or(1);

            let result = envelope
                .result
                .ok_or_else(|| Error::malformed(format!("{}: response has no result", action)))?;
            items.extend(result);

            if page >= total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    /// List every zone visible to the credentials
    pub(crate) async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.get_all("/zones", &[], "Zone listing").await
    }
}

/// Map a non-2xx status onto the error taxonomy
fn status_error(status: StatusCode, error_text: &str, action: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid Cloudflare credentials or insufficient permissions (status {})",
            action, status
        )),
        429 => Error::rate_limited(format!(
            "{}: Cloudflare rate limit exceeded (status {})",
            action, status
        )),
        500..=599 => Error::provider(
            "cloudflare",
            format!(
                "{}: Cloudflare server error (transient): {} - {}",
                action, status, error_text
            ),
        ),
        _ => Error::provider(
            "cloudflare",
            format!("{} failed: {} - {}", action, status, error_text),
        ),
    }
}

/// Exact, case-sensitive zone lookup; the first match wins
pub fn find_zone_id<'a>(zones: &'a [Zone], domain_name: &str) -> Option<&'a str> {
    zones
        .iter()
        .find(|zone| zone.name == domain_name)
        .map(|zone| zone.id.as_str())
}
