// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Candidate, City, CompatibilityTier, Credential, District, DistrictDetail, GeoScope,
    MatchSummary, MatchedUser, OccupationKind, PreferenceTag, ProfileLocation, SwipeAction, SwipeDecision, SwipeOutcome,
};
pub use requests::{CandidatesQuery, SwipeRequest, UpdateLocationRequest};
pub use responses::{ErrorResponse, GeoEnvelope, MatchRecord, SwipeRecord, SwipeResponse};
