// Core engine exports
pub mod error;
pub mod gesture;
pub mod notifier;
pub mod queue;
pub mod resolution;
pub mod scope;
pub mod session;

pub use error::{ErrorSlot, MatchingError};
pub use gesture::{classify_release, DragRelease, GestureConfig, GestureId, GestureInterpreter, GesturePhase, SwipeDirection};
pub use notifier::{MatchNotifier, MatchSignal};
pub use queue::{CandidateQueue, StackSlot};
pub use resolution::{Resolution, ResolutionCoordinator, Submission};
pub use scope::{GeoScopeResolver, LocationSelection};
pub use session::{Command, MatchingSession, SessionEvent};
