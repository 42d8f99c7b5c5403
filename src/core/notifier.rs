use crate::models::SwipeOutcome;
use std::collections::HashSet;

/// One-shot celebration payload for a new mutual match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSignal {
    pub candidate_id: String,
    pub match_id: Option<String>,
    pub counterpart_name: String,
}

/// Edge-triggered match detector
///
/// Fires once per match. The same outcome observed again, or any outcome
/// without a mutual match, produces nothing.
#[derive(Debug, Default)]
pub struct MatchNotifier {
    announced: HashSet<String>,
}

impl MatchNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, outcome: &SwipeOutcome, counterpart_name: &str) -> Option<MatchSignal> {
        if !outcome.is_mutual_match {
            return None;
        }

        let key = outcome
            .match_id
            .clone()
            .unwrap_or_else(|| format!("candidate:{}", outcome.decision.candidate_id));

        if !self.announced.insert(key) {
            return None;
        }

        tracing::info!("New match with {}", counterpart_name);

        Some(MatchSignal {
            candidate_id: outcome.decision.candidate_id.clone(),
            match_id: outcome.match_id.clone(),
            counterpart_name: counterpart_name.to_string(),
        })
    }

    pub fn announced_count(&self) -> usize {
        self.announced.len()
    }
}
