use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Whether a candidate is studying or working
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupationKind {
    Student,
    Professional,
}

/// Lifestyle preference chip shown under a candidate card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceTag {
    pub icon: String,
    pub label: String,
}

impl PreferenceTag {
    pub fn new(icon: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            label: label.into(),
        }
    }
}

/// Prospective roommate profile as returned by the potential-matches endpoint
///
/// Candidates are immutable once fetched; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(rename = "full_name", default)]
    pub display_name: Option<String>,
    #[serde(rename = "avatar_url", default)]
    pub avatar_ref: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(rename = "occupation", default)]
    pub occupation_label: Option<String>,
    #[serde(rename = "university", default)]
    pub affiliation_label: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(rename = "occupation_status", default)]
    pub occupation_kind: Option<OccupationKind>,
    #[serde(rename = "match_score", default, deserialize_with = "de_score")]
    pub compatibility_score: u8,
    #[serde(rename = "preference_tags", default)]
    pub preference_tags: Vec<PreferenceTag>,
}

impl Candidate {
    /// Name to render, falling back for profiles that never filled one in
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unnamed")
    }

    /// Tags to render on the card
    ///
    /// Server-provided tags win. Profiles without any get a single tag
    /// derived from their occupation kind.
    pub fn lifestyle_tags(&self) -> Vec<PreferenceTag> {
        if !self.preference_tags.is_empty() {
            return self.preference_tags.clone();
        }

        match self.occupation_kind {
            Some(OccupationKind::Student) => vec![PreferenceTag::new("🎓", "Student")],
            Some(OccupationKind::Professional) => vec![PreferenceTag::new("💼", "Professional")],
            None => Vec::new(),
        }
    }

    pub fn compatibility_tier(&self) -> CompatibilityTier {
        CompatibilityTier::from_score(self.compatibility_score)
    }
}

/// Coarse band of a compatibility score, used for the score badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityTier {
    High,
    Good,
    Low,
}

impl CompatibilityTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => CompatibilityTier::High,
            60..=79 => CompatibilityTier::Good,
            _ => CompatibilityTier::Low,
        }
    }
}

fn de_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

/// Geographic origin the candidate queue is drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoScope {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl GeoScope {
    pub fn new(latitude: f64, longitude: f64, label: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            label: label.into(),
        }
    }
}

impl From<DistrictDetail> for GeoScope {
    fn from(detail: DistrictDetail) -> Self {
        Self::new(detail.latitude, detail.longitude, detail.label)
    }
}

/// Swipe action as understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    Like,
    Dislike,
    Superlike,
}

impl SwipeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeAction::Like => "like",
            SwipeAction::Dislike => "dislike",
            SwipeAction::Superlike => "superlike",
        }
    }
}

/// A committed decision on one candidate, consumed once by the resolution coordinator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwipeDecision {
    pub candidate_id: String,
    pub action: SwipeAction,
}

impl SwipeDecision {
    pub fn new(candidate_id: impl Into<String>, action: SwipeAction) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            action,
        }
    }
}

/// Result of an accepted swipe
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeOutcome {
    pub decision: SwipeDecision,
    pub is_mutual_match: bool,
    pub match_id: Option<String>,
}

/// City entry from the geolocation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub name: String,
}

/// District (town) entry within a city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: u32,
    pub name: String,
}

/// Coordinates of a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictDetail {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Location stored on the user's own profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLocation {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "districtText", alias = "preferred_district_text", default)]
    pub district_text: Option<String>,
}

impl ProfileLocation {
    /// Resolve to a scope if the profile carries usable coordinates
    ///
    /// Zero coordinates are treated as unset, the backend stores 0 for
    /// profiles that never picked a district.
    pub fn to_scope(&self) -> Option<GeoScope> {
        let latitude = self.latitude.filter(|v| *v != 0.0)?;
        let longitude = self.longitude.filter(|v| *v != 0.0)?;
        let label = self.district_text.clone().unwrap_or_default();
        Some(GeoScope::new(latitude, longitude, label))
    }
}

/// The other side of an established match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedUser {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
}

/// An established mutual match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(rename = "matchId")]
    pub match_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "houseId", default)]
    pub house_id: Option<String>,
    pub user: MatchedUser,
}

/// Bearer credential for the Roomie backend
///
/// Debug output never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
