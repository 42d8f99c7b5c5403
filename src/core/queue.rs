use crate::models::Candidate;
use std::collections::HashSet;

/// Number of cards rendered on the stack at once
pub const VISIBLE_STACK_DEPTH: usize = 3;

/// Render metadata for one card in the visible stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackSlot<'a> {
    pub candidate: &'a Candidate,
    /// 0 for the head, increasing towards the back
    pub depth: usize,
    pub scale: f64,
    pub offset_y: f64,
    /// Only the head accepts gestures
    pub interactive: bool,
}

/// Ordered, de-duplicated list of candidates
///
/// Display order is insertion order and the head is the card currently
/// shown. The queue only grows through [`CandidateQueue::replace_all`] and only
/// shrinks through [`CandidateQueue::remove_by_id`]; candidates themselves are
/// never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct CandidateQueue {
    entries: Vec<Candidate>,
    generation: u64,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current queue and install `candidates` in order
    ///
    /// A repeated id keeps its first occurrence. The backend should never send
    /// duplicates; when it does, the later copies are dropped and logged.
    /// Returns the number of dropped duplicates.
    pub fn replace_all<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut seen = HashSet::new();
        let mut dropped = 0;

        let entries: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                if seen.insert(candidate.id.clone()) {
                    true
                } else {
                    tracing::warn!("Dropping duplicate candidate {}", candidate.id);
                    dropped += 1;
                    false
                }
            })
            .collect();

        self.entries = entries;
        self.generation += 1;
        dropped
    }

    pub fn peek_head(&self) -> Option<&Candidate> {
        self.entries.first()
    }

    /// Remove the candidate with `id` wherever it sits
    ///
    /// Absent ids are a no-op: a swipe completion may arrive after a fresh
    /// fetch already replaced the queue.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Candidate> {
        let position = self.entries.iter().position(|c| c.id == id)?;
        Some(self.entries.remove(position))
    }

    pub fn is_exhausted(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.id.as_str()).collect()
    }

    /// Incremented on every `replace_all`
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cards to render, head first
    pub fn visible_stack(&self) -> Vec<StackSlot<'_>> {
        self.visible_stack_filtered(|_| true)
    }

    /// Cards to render, skipping entries rejected by `keep`
    pub fn visible_stack_filtered<F>(&self, keep: F) -> Vec<StackSlot<'_>>
    where
        F: Fn(&Candidate) -> bool,
    {
        self.entries
            .iter()
            .filter(|c| keep(c))
            .take(VISIBLE_STACK_DEPTH)
            .enumerate()
            .map(|(depth, candidate)| StackSlot {
                candidate,
                depth,
                scale: 1.0 - depth as f64 * 0.05,
                offset_y: depth as f64 * 10.0,
                interactive: depth == 0,
            })
            .collect()
    }
}
