//! Verification session state.

mod phase;
mod state;

pub use phase::SessionPhase;
pub use state::SessionState;
