use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

/// SQLSTATE codes surfaced by PostgREST that callers map onto domain errors.
pub mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const EXCLUSION_VIOLATION: &str = "23P01";
}

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Constraint violation ({code}): {message}")]
    Constraint { code: String, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SupabaseError {
    pub fn is_constraint(&self, expected: &str) -> bool {
        matches!(self, SupabaseError::Constraint { code, .. } if code == expected)
    }

    pub fn constraint_message(&self) -> Option<&str> {
        match self {
            SupabaseError::Constraint { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// An object read back from Supabase storage.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    /// Headers asking PostgREST to echo the written rows back.
    pub fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Self::classify_error(status.as_u16(), &text));
        }

        // DELETE/PATCH without representation answer with an empty body
        let payload = if text.trim().is_empty() { "null" } else { text.as_str() };
        let data = serde_json::from_str::<T>(payload)?;
        Ok(data)
    }

    /// Writes raw bytes to `bucket/object`, replacing any previous version.
    pub async fn upload_object(
        &self,
        bucket: &str,
        object: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SupabaseError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, object);
        debug!("Uploading {} bytes to {}", bytes.len(), url);

        let mut headers = self.get_headers()?;
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?;
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert("x-upsert", HeaderValue::from_static("true"));

        let response = self.client.post(&url)
            .headers(headers)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(Self::classify_error(status.as_u16(), &text));
        }

        Ok(())
    }

    pub async fn download_object(&self, bucket: &str, object: &str) -> Result<StoredObject, SupabaseError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, object);
        debug!("Downloading {}", url);

        let response = self.client.get(&url)
            .headers(self.get_headers()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(Self::classify_error(status.as_u16(), &text));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        Ok(StoredObject { bytes, content_type })
    }

    fn classify_error(status: u16, body: &str) -> SupabaseError {
        let parsed = serde_json::from_str::<PostgrestErrorBody>(body).ok();

        if let Some(PostgrestErrorBody { code: Some(code), message, details }) = &parsed {
            // Class 23: integrity constraint violation
            if code.starts_with("23") {
                let message = message.clone()
                    .or_else(|| details.clone())
                    .unwrap_or_else(|| body.to_string());
                warn!("Constraint violation ({}): {}", code, message);
                return SupabaseError::Constraint { code: code.clone(), message };
            }
        }

        error!("API error ({}): {}", status, body);

        match status {
            401 | 403 => SupabaseError::Auth(body.to_string()),
            404 => SupabaseError::NotFound(body.to_string()),
            _ => SupabaseError::Api { status, message: body.to_string() },
        }
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_classify_exclusion_violation() {
        let body = r#"{"code":"23P01","details":null,"hint":null,"message":"conflicting key value violates exclusion constraint"}"#;
        let err = SupabaseClient::classify_error(409, body);

        assert!(err.is_constraint(sqlstate::EXCLUSION_VIOLATION));
        assert!(!err.is_constraint(sqlstate::UNIQUE_VIOLATION));
        assert_eq!(
            err.constraint_message(),
            Some("conflicting key value violates exclusion constraint")
        );
    }

    #[test]
    fn test_classify_status_codes() {
        assert_matches!(SupabaseClient::classify_error(401, "nope"), SupabaseError::Auth(_));
        assert_matches!(SupabaseClient::classify_error(404, "{}"), SupabaseError::NotFound(_));
        assert_matches!(
            SupabaseClient::classify_error(500, r#"{"code":"XX000","message":"boom"}"#),
            SupabaseError::Api { status: 500, .. }
        );
    }
}
