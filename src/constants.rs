//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default base URL of the booking API
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Storage key holding the session token
pub const TOKEN_KEY: &str = "@Gobarber:token";

/// Storage key holding the serialized user record
pub const USER_KEY: &str = "@Gobarber:user";

/// First hour that belongs to the afternoon bucket
pub const AFTERNOON_START_HOUR: u8 = 12;

/// Minimum length of a new password
pub const MIN_PASSWORD_LEN: usize = 6;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "GOBARBER_API_URL";

/// Environment variable overriding the data directory
pub const HOME_ENV: &str = "GOBARBER_HOME";

/// Application name
pub const APP_NAME: &str = "GoBarber";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
