use crate::models::{Candidate, SwipeAction, SwipeDecision};

/// Tunables for drag classification and card animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub viewport_width: f64,
    /// Fraction of the viewport a drag must cross to commit
    pub threshold_fraction: f64,
    /// Release velocity (points/s) that commits regardless of offset
    pub velocity_threshold: f64,
    /// Exit target as a multiple of the viewport width
    pub exit_multiplier: f64,
    pub exit_duration_ms: u64,
    pub max_rotation_deg: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            viewport_width: 390.0,
            threshold_fraction: 0.25,
            velocity_threshold: 800.0,
            exit_multiplier: 1.5,
            exit_duration_ms: 300,
            max_rotation_deg: 15.0,
        }
    }
}

impl GestureConfig {
    /// Horizontal offset a drag must exceed to commit
    pub fn threshold(&self) -> f64 {
        self.viewport_width * self.threshold_fraction
    }
}

/// Direction a committed card leaves the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
}

impl SwipeDirection {
    pub fn action(self) -> SwipeAction {
        match self {
            SwipeDirection::Right => SwipeAction::Like,
            SwipeDirection::Left => SwipeAction::Dislike,
            SwipeDirection::Up => SwipeAction::Superlike,
        }
    }

    pub fn from_action(action: SwipeAction) -> Self {
        match action {
            SwipeAction::Like => SwipeDirection::Right,
            SwipeAction::Dislike => SwipeDirection::Left,
            SwipeAction::Superlike => SwipeDirection::Up,
        }
    }
}

/// Identifies one interaction, so stale animation callbacks can be ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GestureId(u64);

/// Phase of the card interaction
#[derive(Debug, Clone, PartialEq)]
pub enum GesturePhase {
    Idle,
    Dragging {
        id: GestureId,
        candidate_id: String,
        dx: f64,
        dy: f64,
    },
    Committing {
        id: GestureId,
        candidate_id: String,
        direction: SwipeDirection,
    },
    Returning {
        id: GestureId,
    },
}

/// What the card should animate to after a drag ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragRelease {
    /// Fly off-screen towards `target` over `duration_ms`, then report completion
    Commit {
        id: GestureId,
        direction: SwipeDirection,
        target: (f64, f64),
        duration_ms: u64,
    },
    /// Spring back to the origin, then report completion
    Return { id: GestureId },
}

/// Classify a finished drag
///
/// Offset past the threshold commits in the offset's direction. Otherwise a
/// fast enough fling commits in the velocity's direction. Anything else
/// returns to the origin.
pub fn classify_release(config: &GestureConfig, dx: f64, velocity_x: f64) -> Option<SwipeDirection> {
    let direction_of = |v: f64| if v > 0.0 { SwipeDirection::Right } else { SwipeDirection::Left };

    if dx.abs() > config.threshold() {
        Some(direction_of(dx))
    } else if velocity_x.abs() > config.velocity_threshold {
        Some(direction_of(velocity_x))
    } else {
        None
    }
}

/// Linear interpolation of `x` from `[x0, x1]` onto `[y0, y1]`, clamped
fn interpolate_clamped(x: f64, (x0, x1): (f64, f64), (y0, y1): (f64, f64)) -> f64 {
    if x1 == x0 {
        return y0;
    }
    let t = ((x - x0) / (x1 - x0)).clamp(0.0, 1.0);
    y0 + (y1 - y0) * t
}

/// Turns a drag (or a button press) on the head card into a single decision
///
/// `Idle -> Dragging -> {Committing, Returning} -> Idle`. The decision is
/// emitted when the exit animation reports completion, and at most once per
/// interaction no matter how often that callback fires.
#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    config: GestureConfig,
    phase: GesturePhase,
    next_id: u64,
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: GesturePhase::Idle,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn phase(&self) -> &GesturePhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, GesturePhase::Idle)
    }

    fn next_gesture_id(&mut self) -> GestureId {
        self.next_id += 1;
        GestureId(self.next_id)
    }

    /// Start dragging `head`
    ///
    /// Only the queue head is draggable, and only while no other interaction
    /// is in progress.
    pub fn begin_drag(&mut self, head: Option<&Candidate>) -> Option<GestureId> {
        let head = head?;
        if !self.is_idle() {
            return None;
        }

        let id = self.next_gesture_id();
        self.phase = GesturePhase::Dragging {
            id,
            candidate_id: head.id.clone(),
            dx: 0.0,
            dy: 0.0,
        };
        Some(id)
    }

    /// Track the pointer's translation since drag start
    pub fn update_drag(&mut self, new_dx: f64, new_dy: f64) {
        if let GesturePhase::Dragging { dx, dy, .. } = &mut self.phase {
            *dx = new_dx;
            *dy = new_dy;
        }
    }

    /// Finish the drag with the release velocity
    pub fn end_drag(&mut self, velocity_x: f64) -> Option<DragRelease> {
        let GesturePhase::Dragging { id, candidate_id, dx, dy } = &self.phase else {
            return None;
        };
        let (id, dx, dy) = (*id, *dx, *dy);

        match classify_release(&self.config, dx, velocity_x) {
            Some(direction) => {
                let candidate_id = candidate_id.clone();
                self.phase = GesturePhase::Committing { id, candidate_id, direction };
                Some(DragRelease::Commit {
                    id,
                    direction,
                    target: self.exit_target(direction, dy),
                    duration_ms: self.config.exit_duration_ms,
                })
            }
            None => {
                self.phase = GesturePhase::Returning { id };
                Some(DragRelease::Return { id })
            }
        }
    }

    /// Button-originated decision on `head`
    ///
    /// Skips the drag phases but goes through the same exit animation and
    /// emits the same decision shape as a drag would.
    pub fn press(&mut self, action: SwipeAction, head: Option<&Candidate>) -> Option<DragRelease> {
        let head = head?;
        if !self.is_idle() {
            return None;
        }

        let id = self.next_gesture_id();
        let direction = SwipeDirection::from_action(action);
        self.phase = GesturePhase::Committing {
            id,
            candidate_id: head.id.clone(),
            direction,
        };
        Some(DragRelease::Commit {
            id,
            direction,
            target: self.exit_target(direction, 0.0),
            duration_ms: self.config.exit_duration_ms,
        })
    }

    /// Animation for interaction `id` finished
    ///
    /// Returns the decision the first time a commit animation completes.
    /// Repeated or stale callbacks return `None`.
    pub fn complete_animation(&mut self, id: GestureId) -> Option<SwipeDecision> {
        match &self.phase {
            GesturePhase::Committing { id: current, candidate_id, direction } if *current == id => {
                let decision = SwipeDecision::new(candidate_id.clone(), direction.action());
                self.phase = GesturePhase::Idle;
                Some(decision)
            }
            GesturePhase::Returning { id: current } if *current == id => {
                self.phase = GesturePhase::Idle;
                None
            }
            _ => None,
        }
    }

    /// Abandon the interaction in progress
    pub fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
    }

    /// Candidate under the finger, while a drag is still undecided
    pub fn dragged_candidate(&self) -> Option<&str> {
        match &self.phase {
            GesturePhase::Dragging { candidate_id, .. } => Some(candidate_id),
            _ => None,
        }
    }

    /// Current card translation
    pub fn offset(&self) -> (f64, f64) {
        match self.phase {
            GesturePhase::Dragging { dx, dy, .. } => (dx, dy),
            _ => (0.0, 0.0),
        }
    }

    fn exit_target(&self, direction: SwipeDirection, dy: f64) -> (f64, f64) {
        let distance = self.config.viewport_width * self.config.exit_multiplier;
        match direction {
            SwipeDirection::Right => (distance, dy),
            SwipeDirection::Left => (-distance, dy),
            SwipeDirection::Up => (0.0, -distance),
        }
    }

    /// Card rotation in degrees for a horizontal offset
    pub fn rotation_degrees(&self, dx: f64) -> f64 {
        let half = self.config.viewport_width / 2.0;
        let max = self.config.max_rotation_deg;
        interpolate_clamped(dx, (-half, half), (-max, max))
    }

    /// Opacity of the "like" badge
    pub fn like_opacity(&self, dx: f64) -> f64 {
        interpolate_clamped(dx, (0.0, self.config.threshold()), (0.0, 1.0))
    }

    /// Opacity of the "pass" badge
    pub fn dislike_opacity(&self, dx: f64) -> f64 {
        interpolate_clamped(dx, (-self.config.threshold(), 0.0), (1.0, 0.0))
    }
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
