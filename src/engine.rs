use crate::core::gesture::DragRelease;
use crate::core::notifier::MatchSignal;
use crate::core::scope::GeoScopeResolver;
use crate::core::session::{Command, MatchingSession, SessionEvent};
use crate::core::MatchingError;
use crate::models::{Credential, SwipeRequest};
use crate::services::{Geocoder, MatchingBackend, ProfileLocationStore};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Notices for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotice {
    /// Play this animation, then post `AnimationFinished`
    Animate(DragRelease),
    /// A new mutual match, sent once per match
    ///
    /// Signals raised while nobody is subscribed are kept, see
    /// [`MatchingEngine::take_undelivered_matches`].
    Matched(MatchSignal),
}

#[derive(Debug)]
struct Posted {
    event: SessionEvent,
    /// Sent by a task spawned from this engine
    from_task: bool,
}

/// Cloneable sender for posting events into an engine
#[derive(Debug, Clone)]
pub struct EngineHandle {
    events: mpsc::UnboundedSender<Posted>,
}

impl EngineHandle {
    /// Returns false once the engine is gone
    pub fn post(&self, event: SessionEvent) -> bool {
        self.events
            .send(Posted {
                event,
                from_task: false,
            })
            .is_ok()
    }
}

/// Drives a [`MatchingSession`] from a single ordered event queue
///
/// UI events and network completions share one channel and are applied in
/// arrival order. Network calls run as tasks that post their result back,
/// so completions may interleave with input and with each other.
pub struct MatchingEngine<B: ?Sized, P: ?Sized, G: ?Sized> {
    session: MatchingSession,
    backend: Arc<B>,
    resolver: GeoScopeResolver<P, G>,
    credential: Credential,
    radius_km: u16,
    events_tx: mpsc::UnboundedSender<Posted>,
    events_rx: mpsc::UnboundedReceiver<Posted>,
    notices: broadcast::Sender<EngineNotice>,
    undelivered: Vec<MatchSignal>,
    outstanding: usize,
}

impl<B, P, G> MatchingEngine<B, P, G>
where
    B: MatchingBackend + ?Sized,
    P: ProfileLocationStore + ?Sized,
    G: Geocoder + ?Sized,
{
    pub fn new(
        session: MatchingSession,
        backend: Arc<B>,
        resolver: GeoScopeResolver<P, G>,
        credential: Credential,
        radius_km: u16,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices, _) = broadcast::channel(64);

        Self {
            session,
            backend,
            resolver,
            credential,
            radius_km,
            events_tx,
            events_rx,
            notices,
            undelivered: Vec::new(),
            outstanding: 0,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            events: self.events_tx.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineNotice> {
        self.notices.subscribe()
    }

    pub fn session(&self) -> &MatchingSession {
        &self.session
    }

    /// Match signals raised while no receiver was subscribed
    ///
    /// A receiver that lagged behind can recover from
    /// [`MatchingSession::announced_matches`] instead.
    pub fn take_undelivered_matches(&mut self) -> Vec<MatchSignal> {
        std::mem::take(&mut self.undelivered)
    }

    /// Network tasks whose completion has not been applied yet
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Resolve the profile's stored location
    ///
    /// Posts `ScopeActivated` (followed by a fetch), `LocationMissing`, or
    /// `ScopeFailed`.
    pub fn load_default_scope(&mut self) {
        let resolver = self.resolver.clone();
        let credential = self.credential.clone();

        self.spawn(async move {
            match resolver.load_default_scope(&credential).await {
                Ok(Some(scope)) => SessionEvent::ScopeActivated(scope),
                Ok(None) => SessionEvent::LocationMissing,
                Err(error) => SessionEvent::ScopeFailed(error),
            }
        });
    }

    /// Activate the city / district currently picked in the selector
    ///
    /// Returns false when the pick is incomplete.
    pub fn activate_selected_location(&mut self) -> bool {
        let Some((city, district)) = self.session.selection().selection() else {
            return false;
        };
        let (city, district) = (city.clone(), district.clone());
        let resolver = self.resolver.clone();
        let credential = self.credential.clone();

        self.spawn(async move {
            match resolver.set_manual_scope(&city, &district, &credential).await {
                Ok(scope) => SessionEvent::ScopeActivated(scope),
                Err(error) => SessionEvent::ScopeFailed(error),
            }
        });
        true
    }

    pub fn load_cities(&mut self) {
        let resolver = self.resolver.clone();
        self.spawn(async move { SessionEvent::CitiesLoaded(resolver.cities().await) });
    }

    pub fn refresh_matches(&mut self) {
        let backend = Arc::clone(&self.backend);
        let credential = self.credential.clone();

        self.spawn(async move {
            let result = backend
                .matches(&credential)
                .await
                .map_err(MatchingError::from);
            SessionEvent::MatchesLoaded(result)
        });
    }

    /// Apply one event and carry out the commands it produced
    pub fn dispatch(&mut self, event: SessionEvent) {
        let activated = matches!(event, SessionEvent::ScopeActivated(_));

        for command in self.session.apply(event) {
            self.execute(command);
        }

        // a new scope invalidates the queue
        if activated {
            self.dispatch(SessionEvent::FetchRequested);
        }
    }

    /// Apply every event already queued, without waiting
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(posted) = self.events_rx.try_recv() {
            self.receive(posted);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event and apply it
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(posted) => {
                self.receive(posted);
                true
            }
            None => false,
        }
    }

    /// Apply events until no network task is outstanding
    pub async fn run_until_idle(&mut self) {
        loop {
            self.drain();
            if self.outstanding == 0 {
                break;
            }
            if !self.step().await {
                break;
            }
        }
    }

    fn receive(&mut self, posted: Posted) {
        if posted.from_task {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
        self.dispatch(posted.event);
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::FetchCandidates { scope, fetch_id } => {
                let backend = Arc::clone(&self.backend);
                let credential = self.credential.clone();
                let radius_km = self.radius_km;

                self.spawn(async move {
                    let result = backend
                        .candidates(&scope, radius_km, &credential)
                        .await
                        .map_err(MatchingError::from);
                    SessionEvent::CandidatesLoaded { fetch_id, result }
                });
            }
            Command::FetchDistricts(city_id) => {
                let resolver = self.resolver.clone();
                self.spawn(async move {
                    let result = resolver.districts(city_id).await;
                    SessionEvent::DistrictsLoaded { city_id, result }
                });
            }
            Command::SubmitSwipe(submission) => {
                let backend = Arc::clone(&self.backend);
                let credential = self.credential.clone();

                self.spawn(async move {
                    let request = SwipeRequest::from(&submission.decision);
                    let reply = backend.swipe(&request, &credential).await;
                    SessionEvent::SwipeCompleted { submission, reply }
                });
            }
            Command::Animate(release) => {
                let _ = self.notices.send(EngineNotice::Animate(release));
            }
            Command::Announce(signal) => {
                if let Err(broadcast::error::SendError(EngineNotice::Matched(signal))) =
                    self.notices.send(EngineNotice::Matched(signal))
                {
                    tracing::warn!(
                        "No subscriber for match with {}, keeping it",
                        signal.counterpart_name
                    );
                    self.undelivered.push(signal);
                }
            }
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = SessionEvent> + Send + 'static,
    {
        let events = self.events_tx.clone();
        self.outstanding += 1;

        tokio::spawn(async move {
            let event = task.await;
            if events.send(Posted { event, from_task: true }).is_err() {
                tracing::debug!("Engine dropped before task completed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GestureConfig, GesturePhase};
    use crate::models::{
        Candidate, City, District, DistrictDetail, GeoScope, MatchSummary, ProfileLocation,
        SwipeAction, SwipeResponse, UpdateLocationRequest,
    };
    use crate::services::{ApiError, GeocodingError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBackend {
        fetches: AtomicUsize,
        swipes: AtomicUsize,
    }

    #[async_trait]
    impl MatchingBackend for FakeBackend {
        async fn candidates(
            &self,
            scope: &GeoScope,
            _radius_km: u16,
            _credential: &Credential,
        ) -> Result<Vec<Candidate>, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let ids = if scope.label == "Kadıköy" { ["a", "b"] } else { ["x", "y"] };
            Ok(ids
                .iter()
                .map(|id| serde_json::from_value(serde_json::json!({ "id": id })).unwrap())
                .collect())
        }

        async fn swipe(
            &self,
            _request: &SwipeRequest,
            _credential: &Credential,
        ) -> Result<SwipeResponse, ApiError> {
            self.swipes.fetch_add(1, Ordering::SeqCst);
            Ok(SwipeResponse::matched("m1"))
        }

        async fn matches(&self, _credential: &Credential) -> Result<Vec<MatchSummary>, ApiError> {
            Ok(Vec::new())
        }

        async fn match_detail(
            &self,
            match_id: &str,
            _credential: &Credential,
        ) -> Result<MatchSummary, ApiError> {
            Err(ApiError::Rejected {
                status: 404,
                code: None,
                message: format!("no match {}", match_id),
            })
        }
    }

    struct NoLocation;

    #[async_trait]
    impl ProfileLocationStore for NoLocation {
        async fn profile_location(
            &self,
            _credential: &Credential,
        ) -> Result<Option<ProfileLocation>, ApiError> {
            Ok(None)
        }

        async fn update_profile_location(
            &self,
            _request: &UpdateLocationRequest,
            _credential: &Credential,
        ) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Geocoder for NoLocation {
        async fn cities(&self) -> Result<Vec<City>, GeocodingError> {
            Ok(Vec::new())
        }

        async fn districts(&self, _city_id: u32) -> Result<Vec<District>, GeocodingError> {
            Ok(Vec::new())
        }

        async fn district_detail(&self, district_id: u32) -> Result<DistrictDetail, GeocodingError> {
            Err(GeocodingError::NotFound(district_id.to_string()))
        }
    }

    fn engine() -> (MatchingEngine<FakeBackend, NoLocation, NoLocation>, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend {
            fetches: AtomicUsize::new(0),
            swipes: AtomicUsize::new(0),
        });
        let engine = MatchingEngine::new(
            MatchingSession::new(GestureConfig::default()),
            Arc::clone(&backend),
            GeoScopeResolver::new(Arc::new(NoLocation), Arc::new(NoLocation)),
            Credential::new("t"),
            50,
        );
        (engine, backend)
    }

    #[tokio::test]
    async fn test_scope_activation_triggers_fetch() {
        let (mut engine, backend) = engine();

        engine.dispatch(SessionEvent::ScopeActivated(GeoScope::new(40.99, 29.03, "Kadıköy")));
        assert_eq!(engine.outstanding(), 1);
        assert!(engine.session().is_fetching());

        engine.run_until_idle().await;
        assert_eq!(engine.session().queue().ids(), vec!["a", "b"]);
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(engine.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_only_latest_scope_fills_queue() {
        let (mut engine, backend) = engine();

        engine.dispatch(SessionEvent::ScopeActivated(GeoScope::new(40.99, 29.03, "Kadıköy")));
        engine.dispatch(SessionEvent::ScopeActivated(GeoScope::new(39.92, 32.85, "Çankaya")));
        engine.run_until_idle().await;

        assert_eq!(backend.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(engine.session().queue().ids(), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_missing_location_does_not_fetch() {
        let (mut engine, backend) = engine();

        engine.load_default_scope();
        engine.run_until_idle().await;

        assert!(engine.session().needs_location());
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 0);
        assert!(!engine.activate_selected_location());
    }

    #[tokio::test]
    async fn test_repeated_animation_callback_submits_once() {
        let (mut engine, backend) = engine();
        engine.dispatch(SessionEvent::ScopeActivated(GeoScope::new(40.99, 29.03, "Kadıköy")));
        engine.run_until_idle().await;

        let mut notices = engine.subscribe();
        engine.dispatch(SessionEvent::ButtonPressed(SwipeAction::Like));
        let Ok(EngineNotice::Animate(DragRelease::Commit { id, .. })) = notices.try_recv() else {
            panic!("expected commit animation");
        };

        let handle = engine.handle();
        assert!(handle.post(SessionEvent::AnimationFinished(id)));
        assert!(handle.post(SessionEvent::AnimationFinished(id)));
        engine.run_until_idle().await;

        assert_eq!(backend.swipes.load(Ordering::SeqCst), 1);
        assert_eq!(engine.session().queue().ids(), vec!["b"]);
        assert!(matches!(notices.try_recv(), Ok(EngineNotice::Matched(_))));
        assert!(notices.try_recv().is_err());
        assert!(engine.take_undelivered_matches().is_empty());
    }

    #[tokio::test]
    async fn test_match_before_any_subscriber_is_kept() {
        let (mut engine, _backend) = engine();
        engine.dispatch(SessionEvent::ScopeActivated(GeoScope::new(40.99, 29.03, "Kadıköy")));
        engine.run_until_idle().await;

        engine.dispatch(SessionEvent::ButtonPressed(SwipeAction::Like));
        let id = match engine.session().gesture().phase() {
            GesturePhase::Committing { id, .. } => *id,
            other => panic!("expected committing, got {:?}", other),
        };
        engine.dispatch(SessionEvent::AnimationFinished(id));
        engine.run_until_idle().await;

        let mut late = engine.subscribe();
        assert!(late.try_recv().is_err());

        let undelivered = engine.take_undelivered_matches();
        assert_eq!(undelivered.len(), 1);
        assert_eq!(undelivered[0].candidate_id, "a");
        assert_eq!(undelivered[0].match_id.as_deref(), Some("m1"));
        assert_eq!(engine.session().announced_matches(), undelivered.as_slice());
        assert!(engine.take_undelivered_matches().is_empty());
    }
}
