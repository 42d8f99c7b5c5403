use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{GeoScope, SwipeAction, SwipeDecision};

/// Query for the potential-matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "rad")]
    pub radius_km: u16,
}

impl CandidatesQuery {
    pub fn new(scope: &GeoScope, radius_km: u16) -> Self {
        Self {
            lat: scope.latitude,
            lng: scope.longitude,
            radius_km,
        }
    }
}

/// Request to record a swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "swipedUserId")]
    pub swiped_user_id: String,
    pub action: SwipeAction,
    #[serde(rename = "houseId", default, skip_serializing_if = "Option::is_none")]
    pub house_id: Option<String>,
}

impl From<&SwipeDecision> for SwipeRequest {
    fn from(decision: &SwipeDecision) -> Self {
        Self {
            swiped_user_id: decision.candidate_id.clone(),
            action: decision.action,
            house_id: None,
        }
    }
}

/// Request to persist the chosen district on the user's profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1))]
    pub preferred_district_text: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl From<&GeoScope> for UpdateLocationRequest {
    fn from(scope: &GeoScope) -> Self {
        Self {
            preferred_district_text: scope.label.clone(),
            latitude: scope.latitude,
            longitude: scope.longitude,
        }
    }
}
