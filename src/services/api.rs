use crate::config::ApiSettings;
use crate::models::{
    Candidate, CandidatesQuery, Credential, ErrorResponse, GeoScope, MatchSummary,
    ProfileLocation, SwipeRequest, SwipeResponse, UpdateLocationRequest,
};
use crate::services::{MatchingBackend, ProfileLocationStore};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// Error codes the backend uses when a swipe on the same candidate already exists
const ALREADY_DECIDED_CODES: [&str; 2] = ["ALREADY_SWIPED", "ALREADY_DECIDED"];

/// Errors that can occur when talking to the Roomie backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("API returned {status}: {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Whether the backend reported the swipe as already recorded
    ///
    /// Only the error code is consulted, message text and status are not.
    pub fn is_already_decided(&self) -> bool {
        match self {
            ApiError::Rejected { code: Some(code), .. } => ALREADY_DECIDED_CODES
                .iter()
                .any(|known| code.eq_ignore_ascii_case(known)),
            _ => false,
        }
    }

    pub fn already_decided() -> Self {
        ApiError::Rejected {
            status: 409,
            code: Some(ALREADY_DECIDED_CODES[0].to_string()),
            message: "swipe already recorded".to_string(),
        }
    }
}

/// Roomie backend client
///
/// Handles the endpoints the matching core needs:
/// - Potential candidates around a scope
/// - Recording swipes
/// - Reading and updating the profile location
/// - Listing established matches
pub struct ApiClient {
    base_url: String,
    client: Client,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl ApiClient {
    /// Create a new backend client
    pub fn new(base_url: String, read_timeout: Duration, write_timeout: Duration) -> Self {
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            read_timeout,
            write_timeout,
        }
    }

    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self::new(
            settings.base_url.clone(),
            Duration::from_secs(settings.read_timeout_secs),
            Duration::from_secs(settings.write_timeout_secs),
        )
    }

    /// Absolute URL for a stored avatar reference
    ///
    /// References that are already absolute URLs are returned unchanged.
    pub fn avatar_url(&self, avatar_ref: &str) -> String {
        if avatar_ref.starts_with("http://") || avatar_ref.starts_with("https://") {
            return avatar_ref.to_string();
        }
        format!("{}/profiles/avatar/{}", self.base_url, avatar_ref.trim_start_matches('/'))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
        timeout: Duration,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        self.client
            .request(method, url)
            .bearer_auth(credential.expose())
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string())
            .timeout(timeout)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::RequestError(e)
            }
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorResponse = serde_json::from_str(&body).unwrap_or_default();

        tracing::error!("Backend rejected request: {} - {}", status, body);

        Err(ApiError::Rejected {
            status,
            code: parsed.code.clone(),
            message: parsed.message_text(),
        })
    }

    async fn read_json(response: Response) -> Result<Value, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// Some endpoints wrap their payload in `{ data: ... }`
fn unwrap_data(json: Value) -> Value {
    match json {
        Value::Object(mut obj) if obj.contains_key("data") => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl MatchingBackend for ApiClient {
    async fn candidates(
        &self,
        scope: &GeoScope,
        radius_km: u16,
        credential: &Credential,
    ) -> Result<Vec<Candidate>, ApiError> {
        let query = CandidatesQuery::new(scope, radius_km);
        let builder = self
            .request(Method::GET, "/matches/potential", credential, self.read_timeout)
            .query(&query);

        let json = unwrap_data(Self::read_json(self.send(builder).await?).await?);

        let documents = json
            .as_array()
            .ok_or_else(|| ApiError::InvalidResponse("Expected candidate array".into()))?;

        let candidates: Vec<Candidate> = documents
            .iter()
            .filter_map(|doc| match serde_json::from_value(doc.clone()) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    tracing::warn!("Skipping malformed candidate: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Fetched {} candidates around {} ({} returned)",
            candidates.len(),
            scope.label,
            documents.len()
        );

        Ok(candidates)
    }

    async fn swipe(
        &self,
        request: &SwipeRequest,
        credential: &Credential,
    ) -> Result<SwipeResponse, ApiError> {
        request
            .validate()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let builder = self
            .request(Method::POST, "/matches/swipe", credential, self.write_timeout)
            .json(request);

        let json = Self::read_json(self.send(builder).await?).await?;

        serde_json::from_value(json)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse swipe response: {}", e)))
    }

    async fn matches(&self, credential: &Credential) -> Result<Vec<MatchSummary>, ApiError> {
        let builder = self.request(Method::GET, "/matches", credential, self.read_timeout);
        let json = unwrap_data(Self::read_json(self.send(builder).await?).await?);

        serde_json::from_value(json)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse matches: {}", e)))
    }

    async fn match_detail(
        &self,
        match_id: &str,
        credential: &Credential,
    ) -> Result<MatchSummary, ApiError> {
        let path = format!("/matches/{}", urlencoding::encode(match_id));
        let builder = self.request(Method::GET, &path, credential, self.read_timeout);
        let json = unwrap_data(Self::read_json(self.send(builder).await?).await?);

        serde_json::from_value(json)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse match: {}", e)))
    }
}

#[async_trait]
impl ProfileLocationStore for ApiClient {
    async fn profile_location(
        &self,
        credential: &Credential,
    ) -> Result<Option<ProfileLocation>, ApiError> {
        let builder = self.request(Method::GET, "/profiles/location", credential, self.read_timeout);
        let response = self.send(builder).await?;

        // An empty body means no location was ever stored
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse location: {}", e)))?;

        match unwrap_data(json) {
            Value::Null => Ok(None),
            data => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse location: {}", e))),
        }
    }

    async fn update_profile_location(
        &self,
        request: &UpdateLocationRequest,
        credential: &Credential,
    ) -> Result<(), ApiError> {
        request
            .validate()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let builder = self
            .request(Method::PATCH, "/profiles/location", credential, self.write_timeout)
            .json(request);

        self.send(builder).await?;
        tracing::debug!("Stored profile location: {}", request.preferred_district_text);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_creation() {
        let client = ApiClient::new(
            "https://api.roomie.test/".to_string(),
            Duration::from_secs(10),
            Duration::from_secs(30),
        );

        assert_eq!(client.base_url, "https://api.roomie.test");
        assert_eq!(client.read_timeout, Duration::from_secs(10));
        assert_eq!(
            client.avatar_url("u1/photo.jpg"),
            "https://api.roomie.test/profiles/avatar/u1/photo.jpg"
        );
        assert_eq!(client.avatar_url("https://cdn.test/a.png"), "https://cdn.test/a.png");
    }

    #[test]
    fn test_already_decided_uses_code_only() {
        assert!(ApiError::already_decided().is_already_decided());

        let by_message = ApiError::Rejected {
            status: 400,
            code: None,
            message: "already swiped this user".to_string(),
        };
        assert!(!by_message.is_already_decided());

        let lowercase = ApiError::Rejected {
            status: 400,
            code: Some("already_swiped".to_string()),
            message: String::new(),
        };
        assert!(lowercase.is_already_decided());

        assert!(!ApiError::Timeout.is_already_decided());
    }

    #[test]
    fn test_unwrap_data() {
        let wrapped = serde_json::json!({ "data": [1, 2] });
        assert_eq!(unwrap_data(wrapped), serde_json::json!([1, 2]));

        let bare = serde_json::json!([1]);
        assert_eq!(unwrap_data(bare), serde_json::json!([1]));
    }
}
