use crate::core::error::MatchingError;
use crate::models::{City, Credential, District, GeoScope, UpdateLocationRequest};
use crate::services::{Geocoder, ProfileLocationStore};
use std::sync::Arc;

/// Resolves the search origin for the candidate queue
///
/// Resolving a scope never fetches candidates; the caller sequences
/// activation and fetch.
pub struct GeoScopeResolver<P: ?Sized, G: ?Sized> {
    profile: Arc<P>,
    geocoder: Arc<G>,
}

impl<P: ?Sized, G: ?Sized> Clone for GeoScopeResolver<P, G> {
    fn clone(&self) -> Self {
        Self {
            profile: Arc::clone(&self.profile),
            geocoder: Arc::clone(&self.geocoder),
        }
    }
}

impl<P, G> GeoScopeResolver<P, G>
where
    P: ProfileLocationStore + ?Sized,
    G: Geocoder + ?Sized,
{
    pub fn new(profile: Arc<P>, geocoder: Arc<G>) -> Self {
        Self { profile, geocoder }
    }

    /// Scope from the location stored on the profile
    ///
    /// `Ok(None)` when the profile has no usable location; the caller should
    /// prompt for a manual pick. No scope is ever made up.
    pub async fn load_default_scope(
        &self,
        credential: &Credential,
    ) -> Result<Option<GeoScope>, MatchingError> {
        let location = self.profile.profile_location(credential).await?;

        let scope = location.as_ref().and_then(|l| l.to_scope());
        match &scope {
            Some(scope) => tracing::info!("Default scope from profile: {}", scope.label),
            None => tracing::info!("Profile has no stored location"),
        }

        Ok(scope)
    }

    /// Scope for a manually picked district
    ///
    /// The pick is written back to the profile on a best-effort basis; a
    /// failed write is logged and the scope is still returned.
    pub async fn set_manual_scope(
        &self,
        city: &City,
        district: &District,
        credential: &Credential,
    ) -> Result<GeoScope, MatchingError> {
        let detail = self.geocoder.district_detail(district.id).await?;
        let scope = GeoScope::from(detail);

        let request = UpdateLocationRequest::from(&scope);
        if let Err(e) = self.profile.update_profile_location(&request, credential).await {
            tracing::warn!(
                "Could not store {} / {} on profile: {}",
                city.name,
                district.name,
                e
            );
        }

        tracing::info!(
            "Manual scope {} ({}, {})",
            scope.label,
            scope.latitude,
            scope.longitude
        );

        Ok(scope)
    }

    pub async fn cities(&self) -> Result<Vec<City>, MatchingError> {
        Ok(self.geocoder.cities().await?)
    }

    pub async fn districts(&self, city_id: u32) -> Result<Vec<District>, MatchingError> {
        Ok(self.geocoder.districts(city_id).await?)
    }
}

/// City / district picker state
///
/// Independent of the active scope: activating a scope does not touch the
/// selection, and changing the selection does not activate a scope.
#[derive(Debug, Clone, Default)]
pub struct LocationSelection {
    cities: Vec<City>,
    districts: Vec<District>,
    selected_city: Option<City>,
    selected_district: Option<District>,
}

impl LocationSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cities(&mut self, cities: Vec<City>) {
        self.cities = cities;
    }

    /// Pick a city; clears any district pick and the district list
    pub fn select_city(&mut self, city: City) {
        self.selected_city = Some(city);
        self.selected_district = None;
        self.districts.clear();
    }

    /// Install districts for `city_id`
    ///
    /// Ignored when the user has since picked another city.
    pub fn set_districts(&mut self, city_id: u32, districts: Vec<District>) -> bool {
        if self.selected_city.as_ref().map(|c| c.id) != Some(city_id) {
            tracing::debug!("Discarding districts for city {} (selection moved on)", city_id);
            return false;
        }
        self.districts = districts;
        true
    }

    /// Pick a district of the selected city
    pub fn select_district(&mut self, district: District) -> bool {
        if self.selected_city.is_none() {
            return false;
        }
        self.selected_district = Some(district);
        true
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.selected_city.as_ref()
    }

    pub fn selected_district(&self) -> Option<&District> {
        self.selected_district.as_ref()
    }

    /// Both halves of a complete pick
    pub fn selection(&self) -> Option<(&City, &District)> {
        Some((self.selected_city.as_ref()?, self.selected_district.as_ref()?))
    }
}
