//! Interactive move sessions.
//!
//! A user who sends `/move` without arguments is asked for a pattern and
//! then a destination. The per-user record lives in a `SessionStore` and is
//! discarded on completion, cancellation, or when a new flow starts.

mod interactive;
mod store;
mod types;

pub use interactive::InteractiveSession;
pub use store::SessionStore;
pub use types::{SessionPhase, SessionState, StepOutcome};
