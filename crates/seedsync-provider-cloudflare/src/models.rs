//! Cloudflare API v4 wire types

use serde::{Deserialize, Serialize};

/// Response envelope shared by every Cloudflare endpoint
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Explicit success flag; absent on malformed payloads
    #[serde(default)]
    pub success: Option<bool>,

    pub result: Option<T>,

    #[serde(default)]
    pub errors: Vec<ApiMessage>,

    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

impl<T> ApiEnvelope<T> {
    /// Error messages joined for logging, or a placeholder when there are none
    pub fn error_text(&self) -> String {
        if self.errors.is_empty() {
            return "no error details".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("[{}] {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Pagination block of list endpoints
#[derive(Debug, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
}

/// Body of `POST /zones/{zone_id}/dns_records`
#[derive(Debug, Serialize)]
pub struct CreateRecord<'a> {
    pub name: &'a str,
    pub content: String,
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub ttl: u32,
}

/// Result of `DELETE /zones/{zone_id}/dns_records/{id}`
#[derive(Debug, Deserialize)]
pub struct DeletedRecord {
    #[serde(default)]
    pub id: Option<String>,
}
