//! App layer - central state management and command processing
//!
//! The App actor receives UI events, network responses and session
//! changes, updates state, and emits network commands and render state.

pub mod actor;
pub mod commands;
pub mod form;
pub mod state;

pub use actor::AppActor;
pub use state::AppState;
