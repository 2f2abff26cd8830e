//! Network layer - typed API calls run off the app loop
//!
//! The Network actor receives API commands and sends back responses.

pub mod actor;
pub mod client;

pub use actor::NetworkActor;
pub use client::ApiClient;
