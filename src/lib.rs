//! # GoBarber TUI
//!
//! Terminal client for the GoBarber appointment service.
//!
//! ## Features
//! - Sign in, sign up and sign out, with the session kept between runs
//! - Provider list and day availability split into morning and afternoon
//! - Booking an appointment and a confirmation screen
//! - Profile editing and avatar upload
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine, owns the session store)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod availability;
pub mod config;
pub mod constants;
pub mod error;
pub mod messages;
pub mod models;
pub mod network;
pub mod session;
pub mod storage;
pub mod ui;
pub mod validation;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use config::{load_config, AppConfig};
pub use error::{Alert, AppError};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{Appointment, Provider, Session, UserProfile};
pub use network::{ApiClient, NetworkActor};
pub use session::{SessionState, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
