//! Roomie - candidate stack and swipe resolution for the Roomie roommate matching client
//!
//! This library keeps the ordered stack of roommate candidates for a geographic
//! scope, interprets swipe gestures into decisions, and reconciles those
//! decisions with the backend (including mutual-match detection).

pub mod config;
pub mod core;
pub mod engine;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    classify_release, CandidateQueue, GestureConfig, MatchingError, MatchingSession, SessionEvent,
    SwipeDirection,
};
pub use crate::engine::{EngineHandle, EngineNotice, MatchingEngine};
pub use crate::models::{Candidate, GeoScope, SwipeAction, SwipeDecision, SwipeOutcome};
