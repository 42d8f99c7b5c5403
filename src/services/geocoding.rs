use crate::config::GeocodingSettings;
use crate::models::responses::{CityRecord, CityTownsRecord, GeoEnvelope, TownDetailRecord};
use crate::models::{City, District, DistrictDetail};
use crate::services::cache::{CacheKey, ReferenceCache};
use crate::services::Geocoder;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when resolving cities and districts
#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Geolocation service returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Client for the city / district geolocation service
///
/// City and district lists are cached in memory; district coordinates are
/// cached too since the same district is usually picked more than once.
pub struct GeocodingClient {
    base_url: String,
    client: Client,
    cache: ReferenceCache,
}

impl GeocodingClient {
    pub fn new(base_url: String, timeout: Duration, cache: ReferenceCache) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            cache,
        }
    }

    pub fn from_settings(settings: &GeocodingSettings) -> Self {
        Self::new(
            settings.base_url.clone(),
            Duration::from_secs(settings.timeout_secs),
            ReferenceCache::new(settings.cache_capacity, settings.cache_ttl_secs),
        )
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GeocodingError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Fetching geolocation data from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(GeocodingError::ApiError(format!(
                "Failed to fetch {}: {}",
                path,
                response.status()
            )));
        }

        let envelope: GeoEnvelope<T> = response
            .json()
            .await
            .map_err(|e| GeocodingError::InvalidResponse(e.to_string()))?;

        if !envelope.status {
            return Err(GeocodingError::ApiError(format!("{} reported status=false", path)));
        }

        Ok(envelope.data)
    }

    async fn cached<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.cache.get(key).await.ok()
    }

    async fn remember<T: serde::Serialize>(&self, key: &str, value: &T) {
        match self.cache.set(key, value).await {
            Ok(()) => tracing::trace!("Cached {} ({} entries)", key, self.cache.entry_count().await),
            Err(e) => tracing::warn!("Failed to cache {}: {}", key, e),
        }
    }

    pub async fn cached_entries(&self) -> u64 {
        self.cache.entry_count().await
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn cities(&self) -> Result<Vec<City>, GeocodingError> {
        let key = CacheKey::cities();
        if let Some(cities) = self.cached(&key).await {
            return Ok(cities);
        }

        let cities: Vec<City> = self
            .fetch::<CityRecord>("/cities")
            .await?
            .into_iter()
            .map(City::from)
            .collect();

        self.remember(&key, &cities).await;
        Ok(cities)
    }

    async fn districts(&self, city_id: u32) -> Result<Vec<District>, GeocodingError> {
        let key = CacheKey::districts(city_id);
        if let Some(districts) = self.cached(&key).await {
            return Ok(districts);
        }

        let path = format!("/cities/{}?fields=city,towns", city_id);
        let districts: Vec<District> = self
            .fetch::<CityTownsRecord>(&path)
            .await?
            .into_iter()
            .next()
            .map(|record| record.towns.into_iter().map(District::from).collect())
            .unwrap_or_default();

        self.remember(&key, &districts).await;
        Ok(districts)
    }

    async fn district_detail(&self, district_id: u32) -> Result<DistrictDetail, GeocodingError> {
        let key = CacheKey::district_detail(district_id);
        if let Some(detail) = self.cached(&key).await {
            return Ok(detail);
        }

        let path = format!("/towns/{}?fields=town,lat,lon", district_id);
        let record = self
            .fetch::<TownDetailRecord>(&path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GeocodingError::NotFound(format!("District {} not found", district_id)))?;

        let detail = record.into_detail().ok_or_else(|| {
            GeocodingError::InvalidResponse(format!("District {} has no usable coordinates", district_id))
        })?;

        self.remember(&key, &detail).await;
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cities_are_served_from_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/cities")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":true,"data":[{"_id":34,"city":"Istanbul"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = GeocodingClient::new(server.url(), Duration::from_secs(5), ReferenceCache::new(16, 60));

        let first = client.cities().await.unwrap();
        let second = client.cities().await.unwrap();

        assert_eq!(first, vec![City { id: 34, name: "Istanbul".to_string() }]);
        assert_eq!(first, second);
        assert_eq!(client.cached_entries().await, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_false_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/cities")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":false,"data":[]}"#)
            .create_async()
            .await;

        let client = GeocodingClient::new(server.url(), Duration::from_secs(5), ReferenceCache::new(16, 60));

        assert!(matches!(client.cities().await, Err(GeocodingError::ApiError(_))));
        assert_eq!(client.cached_entries().await, 0);

        let error = crate::core::MatchingError::from(GeocodingError::ApiError("x".into()));
        assert!(matches!(error, crate::core::MatchingError::GeocodingFailure(_)));
    }

    #[tokio::test]
    async fn test_missing_district_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/towns/99")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":true,"data":[]}"#)
            .create_async()
            .await;

        let client = GeocodingClient::new(server.url(), Duration::from_secs(5), ReferenceCache::new(16, 60));

        let result = client.district_detail(99).await;
        assert!(matches!(result, Err(GeocodingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/cities/6")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = GeocodingClient::new(server.url(), Duration::from_secs(5), ReferenceCache::new(16, 60));

        assert!(matches!(client.districts(6).await, Err(GeocodingError::ApiError(_))));
    }
}
