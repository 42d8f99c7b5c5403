// Service exports
pub mod api;
pub mod cache;
pub mod geocoding;

pub use api::{ApiClient, ApiError};
pub use cache::{CacheKey, ReferenceCache};
pub use geocoding::{GeocodingClient, GeocodingError};

use async_trait::async_trait;
use crate::models::{
    Candidate, City, Credential, District, DistrictDetail, GeoScope, MatchSummary,
    ProfileLocation, SwipeRequest, SwipeResponse, UpdateLocationRequest,
};

/// Remote matching endpoints of the Roomie backend
#[async_trait]
pub trait MatchingBackend: Send + Sync + 'static {
    /// Candidates around `scope`, in server-determined order
    async fn candidates(
        &self,
        scope: &GeoScope,
        radius_km: u16,
        credential: &Credential,
    ) -> Result<Vec<Candidate>, ApiError>;

    async fn swipe(
        &self,
        request: &SwipeRequest,
        credential: &Credential,
    ) -> Result<SwipeResponse, ApiError>;

    async fn matches(&self, credential: &Credential) -> Result<Vec<MatchSummary>, ApiError>;

    async fn match_detail(
        &self,
        match_id: &str,
        credential: &Credential,
    ) -> Result<MatchSummary, ApiError>;
}

/// Location stored on the user's own profile
#[async_trait]
pub trait ProfileLocationStore: Send + Sync + 'static {
    /// `Ok(None)` when the profile has never stored a location
    async fn profile_location(
        &self,
        credential: &Credential,
    ) -> Result<Option<ProfileLocation>, ApiError>;

    async fn update_profile_location(
        &self,
        request: &UpdateLocationRequest,
        credential: &Credential,
    ) -> Result<(), ApiError>;
}

/// City / district lookup service
#[async_trait]
pub trait Geocoder: Send + Sync + 'static {
    async fn cities(&self) -> Result<Vec<City>, GeocodingError>;

    async fn districts(&self, city_id: u32) -> Result<Vec<District>, GeocodingError>;

    async fn district_detail(&self, district_id: u32) -> Result<DistrictDetail, GeocodingError>;
}
