use crate::core::error::{ErrorSlot, MatchingError};
use crate::core::gesture::{DragRelease, GestureConfig, GestureId, GestureInterpreter};
use crate::core::notifier::{MatchNotifier, MatchSignal};
use crate::core::queue::{CandidateQueue, StackSlot};
use crate::core::resolution::{Resolution, ResolutionCoordinator, Submission};
use crate::core::scope::LocationSelection;
use crate::models::{
    Candidate, City, District, GeoScope, MatchSummary, SwipeAction, SwipeOutcome, SwipeResponse,
};
use crate::services::ApiError;

/// Everything that can happen to a matching session
///
/// UI input, animation callbacks and network completions all arrive as
/// events and are applied one at a time, in order.
#[derive(Debug)]
pub enum SessionEvent {
    /// A new search origin is active
    ScopeActivated(GeoScope),
    /// The profile has no stored location
    LocationMissing,
    ScopeFailed(MatchingError),

    /// Load candidates for the active scope
    FetchRequested,
    CandidatesLoaded {
        fetch_id: u64,
        result: Result<Vec<Candidate>, MatchingError>,
    },

    CitiesLoaded(Result<Vec<City>, MatchingError>),
    CitySelected(City),
    DistrictsLoaded {
        city_id: u32,
        result: Result<Vec<District>, MatchingError>,
    },
    DistrictSelected(District),

    DragStarted,
    DragMoved { dx: f64, dy: f64 },
    DragEnded { velocity_x: f64 },
    ButtonPressed(SwipeAction),
    AnimationFinished(GestureId),

    SwipeCompleted {
        submission: Submission,
        reply: Result<SwipeResponse, ApiError>,
    },
    MatchesLoaded(Result<Vec<MatchSummary>, MatchingError>),

    ErrorCleared,
}

impl SessionEvent {
    /// Events posted back by a finished network task
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            SessionEvent::ScopeActivated(_)
                | SessionEvent::LocationMissing
                | SessionEvent::ScopeFailed(_)
                | SessionEvent::CandidatesLoaded { .. }
                | SessionEvent::CitiesLoaded(_)
                | SessionEvent::DistrictsLoaded { .. }
                | SessionEvent::SwipeCompleted { .. }
                | SessionEvent::MatchesLoaded(_)
        )
    }
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchCandidates { scope: GeoScope, fetch_id: u64 },
    FetchDistricts(u32),
    SubmitSwipe(Submission),
    Animate(DragRelease),
    Announce(MatchSignal),
}

/// The single owned state of a matching session
///
/// All mutation goes through [`MatchingSession::apply`], which returns the
/// side effects the driver must perform. Nothing here does I/O.
#[derive(Debug)]
pub struct MatchingSession {
    queue: CandidateQueue,
    scope: Option<GeoScope>,
    errors: ErrorSlot,
    coordinator: ResolutionCoordinator,
    gesture: GestureInterpreter,
    notifier: MatchNotifier,
    selection: LocationSelection,
    matches: Vec<MatchSummary>,
    last_outcome: Option<SwipeOutcome>,
    announced: Vec<MatchSignal>,
    latest_fetch: u64,
    is_fetching: bool,
    needs_location: bool,
}

impl MatchingSession {
    pub fn new(gesture: GestureConfig) -> Self {
        Self {
            queue: CandidateQueue::new(),
            scope: None,
            errors: ErrorSlot::default(),
            coordinator: ResolutionCoordinator::new(),
            gesture: GestureInterpreter::new(gesture),
            notifier: MatchNotifier::new(),
            selection: LocationSelection::new(),
            matches: Vec::new(),
            last_outcome: None,
            announced: Vec::new(),
            latest_fetch: 0,
            is_fetching: false,
            needs_location: false,
        }
    }

    /// Apply one event and return the resulting commands
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Command> {
        match event {
            SessionEvent::ScopeActivated(scope) => {
                tracing::info!("Scope activated: {}", scope.label);
                self.scope = Some(scope);
                self.needs_location = false;
                Vec::new()
            }
            SessionEvent::LocationMissing => {
                self.needs_location = true;
                Vec::new()
            }
            SessionEvent::ScopeFailed(error) => {
                self.errors.set(error);
                Vec::new()
            }

            SessionEvent::FetchRequested => self.request_fetch(),
            SessionEvent::CandidatesLoaded { fetch_id, result } => {
                self.candidates_loaded(fetch_id, result);
                Vec::new()
            }

            SessionEvent::CitiesLoaded(result) => {
                match result {
                    Ok(cities) => self.selection.set_cities(cities),
                    Err(error) => self.errors.set(error),
                }
                Vec::new()
            }
            SessionEvent::CitySelected(city) => {
                let city_id = city.id;
                self.selection.select_city(city);
                vec![Command::FetchDistricts(city_id)]
            }
            SessionEvent::DistrictsLoaded { city_id, result } => {
                match result {
                    Ok(districts) => {
                        self.selection.set_districts(city_id, districts);
                    }
                    Err(error) => self.errors.set(error),
                }
                Vec::new()
            }
            SessionEvent::DistrictSelected(district) => {
                self.selection.select_district(district);
                Vec::new()
            }

            SessionEvent::DragStarted => {
                let head = self.head().cloned();
                self.gesture.begin_drag(head.as_ref());
                Vec::new()
            }
            SessionEvent::DragMoved { dx, dy } => {
                self.gesture.update_drag(dx, dy);
                Vec::new()
            }
            SessionEvent::DragEnded { velocity_x } => self
                .gesture
                .end_drag(velocity_x)
                .map(Command::Animate)
                .into_iter()
                .collect(),
            SessionEvent::ButtonPressed(action) => {
                let head = self.head().cloned();
                self.gesture
                    .press(action, head.as_ref())
                    .map(Command::Animate)
                    .into_iter()
                    .collect()
            }
            SessionEvent::AnimationFinished(id) => {
                let Some(decision) = self.gesture.complete_animation(id) else {
                    return Vec::new();
                };
                self.coordinator
                    .submit(decision, &self.queue)
                    .map(Command::SubmitSwipe)
                    .into_iter()
                    .collect()
            }

            SessionEvent::SwipeCompleted { submission, reply } => {
                self.swipe_completed(&submission, reply)
            }
            SessionEvent::MatchesLoaded(result) => {
                match result {
                    Ok(matches) => self.matches = matches,
                    Err(error) => self.errors.set(error),
                }
                Vec::new()
            }

            SessionEvent::ErrorCleared => {
                self.errors.clear();
                Vec::new()
            }
        }
    }

    fn request_fetch(&mut self) -> Vec<Command> {
        let Some(scope) = self.scope.clone() else {
            tracing::debug!("Fetch requested without an active scope");
            self.needs_location = true;
            return Vec::new();
        };

        self.latest_fetch += 1;
        self.is_fetching = true;
        vec![Command::FetchCandidates {
            scope,
            fetch_id: self.latest_fetch,
        }]
    }

    fn candidates_loaded(&mut self, fetch_id: u64, result: Result<Vec<Candidate>, MatchingError>) {
        if fetch_id != self.latest_fetch {
            tracing::debug!("Discarding superseded candidate fetch {}", fetch_id);
            return;
        }

        self.is_fetching = false;
        match result {
            Ok(candidates) => {
                let dropped = self.queue.replace_all(candidates);
                self.coordinator.forget_settled();

                if let Some(dragged) = self.gesture.dragged_candidate() {
                    if !self.queue.contains(dragged) {
                        tracing::debug!("Cancelling drag on {}, no longer queued", dragged);
                        self.gesture.reset();
                    }
                }
                tracing::info!(
                    "Queue loaded with {} candidates ({} duplicates dropped)",
                    self.queue.len(),
                    dropped
                );
            }
            Err(error) => self.errors.set(error),
        }
    }

    fn swipe_completed(
        &mut self,
        submission: &Submission,
        reply: Result<SwipeResponse, ApiError>,
    ) -> Vec<Command> {
        let resolution =
            self.coordinator
                .resolve(submission, reply, &mut self.queue, &mut self.errors);

        let Resolution::Accepted(outcome) = resolution else {
            return Vec::new();
        };

        let signal = self.notifier.observe(&outcome, &submission.counterpart_name);
        if let Some(signal) = &signal {
            self.announced.push(signal.clone());
        }
        self.last_outcome = Some(outcome);
        signal.map(Command::Announce).into_iter().collect()
    }

    /// First queued candidate without a pending submission
    ///
    /// A card whose swipe is in flight has already left the screen; it stays
    /// in the queue until the backend confirms, but is no longer shown.
    pub fn head(&self) -> Option<&Candidate> {
        self.queue
            .iter()
            .find(|c| !self.coordinator.is_in_flight(&c.id))
    }

    /// Cards to render, excluding those with a swipe in flight
    pub fn visible_stack(&self) -> Vec<StackSlot<'_>> {
        self.queue
            .visible_stack_filtered(|c| !self.coordinator.is_in_flight(&c.id))
    }

    pub fn queue(&self) -> &CandidateQueue {
        &self.queue
    }

    pub fn scope(&self) -> Option<&GeoScope> {
        self.scope.as_ref()
    }

    pub fn current_error(&self) -> Option<&MatchingError> {
        self.errors.current()
    }

    pub fn resolution(&self, candidate_id: &str) -> Option<&Resolution> {
        self.coordinator.status(candidate_id)
    }

    pub fn gesture(&self) -> &GestureInterpreter {
        &self.gesture
    }

    pub fn selection(&self) -> &LocationSelection {
        &self.selection
    }

    pub fn matches(&self) -> &[MatchSummary] {
        &self.matches
    }

    pub fn last_outcome(&self) -> Option<&SwipeOutcome> {
        self.last_outcome.as_ref()
    }

    /// Every match signal raised this session, oldest first
    pub fn announced_matches(&self) -> &[MatchSignal] {
        &self.announced
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn is_swiping(&self) -> bool {
        self.coordinator.is_pending()
    }

    /// The profile had no location and no scope was picked yet
    pub fn needs_location(&self) -> bool {
        self.needs_location
    }

    /// Nothing left to show for the active scope
    pub fn is_exhausted(&self) -> bool {
        self.head().is_none()
    }
}

impl Default for MatchingSession {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
