use serde::{Deserialize, Serialize};
use crate::models::domain::{City, District, DistrictDetail, SwipeAction};

/// Stored swipe record echoed by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeRecord {
    pub id: String,
    pub swiper_id: String,
    pub swiped_id: String,
    pub action: SwipeAction,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Match created by a swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Response for the swipe endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    #[serde(default)]
    pub swipe: Option<SwipeRecord>,
    #[serde(rename = "isMatch", default)]
    pub is_match: bool,
    #[serde(rename = "match", default)]
    pub matched: Option<MatchRecord>,
}

impl SwipeResponse {
    pub fn no_match() -> Self {
        Self {
            swipe: None,
            is_match: false,
            matched: None,
        }
    }

    pub fn matched(match_id: impl Into<String>) -> Self {
        Self {
            swipe: None,
            is_match: true,
            matched: Some(MatchRecord {
                id: match_id.into(),
                user1_id: String::new(),
                user2_id: String::new(),
                created_at: None,
            }),
        }
    }
}

/// Error body returned by the Roomie backend
///
/// `message` may be a string or a list of validation messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn message_text(&self) -> String {
        match &self.message {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => self.error.clone().unwrap_or_else(|| "request failed".to_string()),
        }
    }
}

/// `{ status, data: [...] }` envelope used by the geolocation service
#[derive(Debug, Clone, Deserialize)]
pub struct GeoEnvelope<T> {
    #[serde(default = "status_ok")]
    pub status: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

fn status_ok() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityRecord {
    #[serde(rename = "_id")]
    pub id: u32,
    pub city: String,
}

impl From<CityRecord> for City {
    fn from(record: CityRecord) -> Self {
        City {
            id: record.id,
            name: record.city,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TownRecord {
    #[serde(rename = "_id")]
    pub id: u32,
    pub name: String,
}

impl From<TownRecord> for District {
    fn from(record: TownRecord) -> Self {
        District {
            id: record.id,
            name: record.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityTownsRecord {
    #[serde(default)]
    pub towns: Vec<TownRecord>,
}

/// Coordinates arrive as numbers or numeric strings depending on the record
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    pub fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Number(n) => Some(*n),
            Coordinate::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TownDetailRecord {
    pub town: String,
    pub lat: Coordinate,
    pub lon: Coordinate,
}

impl TownDetailRecord {
    pub fn into_detail(self) -> Option<DistrictDetail> {
        Some(DistrictDetail {
            latitude: self.lat.value()?,
            longitude: self.lon.value()?,
            label: self.town,
        })
    }
}
