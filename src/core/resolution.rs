use crate::core::error::{ErrorSlot, MatchingError};
use crate::core::queue::CandidateQueue;
use crate::models::{SwipeDecision, SwipeOutcome, SwipeResponse};
use crate::services::ApiError;
use std::collections::HashMap;

/// Lifecycle of one submitted decision
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Sent, no reply yet
    Pending,
    /// Backend recorded the swipe
    Accepted(SwipeOutcome),
    /// Backend already had a swipe for this candidate
    Conflicted,
    /// Anything else; the candidate stays in the queue
    Failed(MatchingError),
}

impl Resolution {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Resolution::Pending)
    }
}

/// A decision handed to the network, with what is needed to settle it later
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub ticket: u64,
    pub decision: SwipeDecision,
    /// Captured at submit time, the candidate may be gone when the reply lands
    pub counterpart_name: String,
}

/// Reconciles swipe decisions with the backend
///
/// Tracks one resolution per candidate. Submitting a candidate that already
/// has a pending submission is refused, so at most one request per candidate
/// is in flight.
#[derive(Debug, Default)]
pub struct ResolutionCoordinator {
    resolutions: HashMap<String, Resolution>,
    in_flight: HashMap<String, u64>,
    next_ticket: u64,
}

impl ResolutionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `decision` as submitted
    ///
    /// Returns `None` when a submission for the same candidate is still pending.
    pub fn submit(&mut self, decision: SwipeDecision, queue: &CandidateQueue) -> Option<Submission> {
        if self.in_flight.contains_key(&decision.candidate_id) {
            tracing::debug!("Ignoring duplicate submission for {}", decision.candidate_id);
            return None;
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;

        let counterpart_name = queue
            .get(&decision.candidate_id)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| decision.candidate_id.clone());

        self.in_flight.insert(decision.candidate_id.clone(), ticket);
        self.resolutions
            .insert(decision.candidate_id.clone(), Resolution::Pending);

        tracing::debug!(
            "Submitting {} on {} (ticket {})",
            decision.action.as_str(),
            decision.candidate_id,
            ticket
        );

        Some(Submission {
            ticket,
            decision,
            counterpart_name,
        })
    }

    /// Settle `submission` with the backend's reply
    ///
    /// - success: the candidate leaves the queue and any stale error is cleared
    /// - already-decided conflict: the candidate leaves the queue, no match, no error
    /// - any other failure: the candidate stays, the error slot is set, no retry
    ///
    /// Removal is by id, so a reply that lands after the queue was replaced
    /// only touches the new queue if the decided candidate reappeared in it.
    pub fn resolve(
        &mut self,
        submission: &Submission,
        reply: Result<SwipeResponse, ApiError>,
        queue: &mut CandidateQueue,
        errors: &mut ErrorSlot,
    ) -> Resolution {
        let candidate_id = &submission.decision.candidate_id;

        if self.in_flight.get(candidate_id) == Some(&submission.ticket) {
            self.in_flight.remove(candidate_id);
        }

        let resolution = match reply {
            Ok(response) => {
                queue.remove_by_id(candidate_id);
                errors.clear();
                Resolution::Accepted(SwipeOutcome {
                    decision: submission.decision.clone(),
                    is_mutual_match: response.is_match,
                    match_id: response.matched.map(|m| m.id),
                })
            }
            Err(error) => match MatchingError::from(error) {
                MatchingError::AlreadyDecidedConflict => {
                    tracing::debug!("Swipe on {} was already recorded", candidate_id);
                    queue.remove_by_id(candidate_id);
                    Resolution::Conflicted
                }
                other => {
                    tracing::error!("Swipe on {} failed: {}", candidate_id, other);
                    errors.set(other.clone());
                    Resolution::Failed(other)
                }
            },
        };

        self.resolutions
            .insert(candidate_id.clone(), resolution.clone());
        resolution
    }

    pub fn status(&self, candidate_id: &str) -> Option<&Resolution> {
        self.resolutions.get(candidate_id)
    }

    pub fn is_in_flight(&self, candidate_id: &str) -> bool {
        self.in_flight.contains_key(candidate_id)
    }

    pub fn is_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Drop settled entries, keeping only those still in flight
    pub fn forget_settled(&mut self) {
        self.resolutions.retain(|_, r| !r.is_settled());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, SwipeAction};

    fn queue_of(ids: &[&str]) -> CandidateQueue {
        let mut queue = CandidateQueue::new();
        queue.replace_all(ids.iter().map(|id| {
            serde_json::from_value::<Candidate>(serde_json::json!({ "id": id, "full_name": id.to_uppercase() }))
                .unwrap()
        }));
        queue
    }

    #[test]
    fn test_success_removes_and_clears_error() {
        let mut coordinator = ResolutionCoordinator::new();
        let mut queue = queue_of(&["a", "b", "c"]);
        let mut errors = ErrorSlot::default();
        errors.set(MatchingError::NetworkUnavailable("earlier".into()));

        let submission = coordinator
            .submit(SwipeDecision::new("a", SwipeAction::Like), &queue)
            .unwrap();
        assert_eq!(coordinator.status("a"), Some(&Resolution::Pending));
        assert_eq!(submission.counterpart_name, "A");

        let resolution = coordinator.resolve(&submission, Ok(SwipeResponse::matched("m1")), &mut queue, &mut errors);

        assert_eq!(queue.ids(), vec!["b", "c"]);
        assert!(!errors.is_set());
        match resolution {
            Resolution::Accepted(outcome) => {
                assert!(outcome.is_mutual_match);
                assert_eq!(outcome.match_id.as_deref(), Some("m1"));
            }
            other => panic!("expected accepted, got {:?}", other),
        }
        assert!(!coordinator.is_pending());
    }

    #[test]
    fn test_failure_keeps_candidate() {
        let mut coordinator = ResolutionCoordinator::new();
        let mut queue = queue_of(&["a", "b"]);
        let mut errors = ErrorSlot::default();

        let submission = coordinator
            .submit(SwipeDecision::new("a", SwipeAction::Dislike), &queue)
            .unwrap();
        let resolution = coordinator.resolve(&submission, Err(ApiError::Timeout), &mut queue, &mut errors);

        assert!(matches!(resolution, Resolution::Failed(MatchingError::NetworkUnavailable(_))));
        assert_eq!(queue.ids(), vec!["a", "b"]);
        assert!(errors.is_set());
    }

    #[test]
    fn test_conflict_removes_without_error() {
        let mut coordinator = ResolutionCoordinator::new();
        let mut queue = queue_of(&["a", "b"]);
        let mut errors = ErrorSlot::default();

        let submission = coordinator
            .submit(SwipeDecision::new("a", SwipeAction::Like), &queue)
            .unwrap();
        let resolution =
            coordinator.resolve(&submission, Err(ApiError::already_decided()), &mut queue, &mut errors);

        assert_eq!(resolution, Resolution::Conflicted);
        assert_eq!(queue.ids(), vec!["b"]);
        assert!(!errors.is_set());
    }

    #[test]
    fn test_duplicate_pending_submission_refused() {
        let mut coordinator = ResolutionCoordinator::new();
        let queue = queue_of(&["a"]);

        assert!(coordinator.submit(SwipeDecision::new("a", SwipeAction::Like), &queue).is_some());
        assert!(coordinator.submit(SwipeDecision::new("a", SwipeAction::Like), &queue).is_none());
        assert_eq!(coordinator.pending_count(), 1);
    }

    #[test]
    fn test_reply_after_queue_replaced_leaves_other_entries() {
        let mut coordinator = ResolutionCoordinator::new();
        let mut queue = queue_of(&["a", "b"]);
        let mut errors = ErrorSlot::default();

        let submission = coordinator.submit(SwipeDecision::new("a", SwipeAction::Like), &queue).unwrap();
        queue.replace_all(queue_of(&["x", "y"]).iter().cloned());

        let resolution = coordinator.resolve(&submission, Ok(SwipeResponse::no_match()), &mut queue, &mut errors);

        assert!(matches!(resolution, Resolution::Accepted(_)));
        assert_eq!(queue.ids(), vec!["x", "y"]);
    }

    #[test]
    fn test_accepted_candidate_leaves_refetched_queue() {
        let mut coordinator = ResolutionCoordinator::new();
        let mut queue = queue_of(&["a", "b"]);
        let mut errors = ErrorSlot::default();

        let submission = coordinator.submit(SwipeDecision::new("a", SwipeAction::Like), &queue).unwrap();
        queue.replace_all(queue_of(&["a", "b"]).iter().cloned());

        coordinator.resolve(&submission, Ok(SwipeResponse::no_match()), &mut queue, &mut errors);
        assert_eq!(queue.ids(), vec!["b"]);
    }

    #[test]
    fn test_forget_settled_keeps_pending() {
        let mut coordinator = ResolutionCoordinator::new();
        let mut queue = queue_of(&["a", "b"]);
        let mut errors = ErrorSlot::default();

        let first = coordinator.submit(SwipeDecision::new("a", SwipeAction::Like), &queue).unwrap();
        coordinator.submit(SwipeDecision::new("b", SwipeAction::Like), &queue).unwrap();
        coordinator.resolve(&first, Ok(SwipeResponse::no_match()), &mut queue, &mut errors);

        coordinator.forget_settled();
        assert!(coordinator.status("a").is_none());
        assert_eq!(coordinator.status("b"), Some(&Resolution::Pending));
    }
}
