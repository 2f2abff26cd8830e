//! App state - pure data structure, the only I/O is through the session store

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate};

use crate::app::form::FormState;
use crate::availability::DayAvailability;
use crate::error::Alert;
use crate::messages::ui_events::Screen;
use crate::messages::RenderState;
use crate::models::Provider;
use crate::session::SessionStore;

/// What a pending request was for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingOp {
    SignUp,
    Providers,
    Availability,
    Appointment,
    Profile,
    Avatar,
}

/// Shown on the confirmation screen
#[derive(Clone, Debug, PartialEq)]
pub struct AppointmentSummary {
    pub provider_name: String,
    pub at: DateTime<Local>,
}

impl AppointmentSummary {
    /// e.g. "Monday, June 15 at 14:00"
    pub fn describe(&self) -> String {
        self.at.format("%A, %B %-d at %H:%M").to_string()
    }
}

/// Main application state
pub struct AppState {
    pub session: SessionStore,
    pub screen: Screen,

    // Form screens
    pub form: FormState,
    pub signing_in: bool,

    // Providers (dashboard cursor, booking selection)
    pub providers: Vec<Provider>,
    pub provider_cursor: usize,
    pub selected_provider_id: Option<String>,

    // Booking
    pub date: NaiveDate,
    pub availability: DayAvailability,
    pub availability_loaded: bool,
    pub selected_hour: Option<u8>,
    pub created: Option<AppointmentSummary>,

    // Requests in flight
    pub next_request_id: u64,
    pub pending: HashMap<u64, PendingOp>,

    // Popups
    pub alert: Option<Alert>,
    pub show_help: bool,
    pub show_avatar_input: bool,
    pub avatar_path_input: String,
}

impl AppState {
    pub fn new(session: SessionStore) -> Self {
        AppState {
            session,
            screen: Screen::SignIn,
            form: FormState::sign_in(),
            signing_in: false,
            providers: Vec::new(),
            provider_cursor: 0,
            selected_provider_id: None,
            date: today(),
            availability: DayAvailability::default(),
            availability_loaded: false,
            selected_hour: None,
            created: None,
            next_request_id: 1,
            pending: HashMap::new(),
            alert: None,
            show_help: false,
            show_avatar_input: false,
            avatar_path_input: String::new(),
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn is_busy(&self) -> bool {
        self.signing_in || !self.pending.is_empty()
    }

    /// True while a request of this kind is in flight
    pub fn is_pending(&self, op: PendingOp) -> bool {
        self.pending.values().any(|p| *p == op)
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            screen: self.screen,
            session_loading: self.session.is_loading(),
            user: self.session.user(),
            busy: self.is_busy(),
            form: self.form.clone(),
            providers: self.providers.clone(),
            provider_cursor: self.provider_cursor,
            selected_provider_id: self.selected_provider_id.clone(),
            date: self.date,
            availability: self.availability.clone(),
            availability_loaded: self.availability_loaded,
            selected_hour: self.selected_hour,
            created: self.created.clone(),
            alert: self.alert.clone(),
            show_help: self.show_help,
            show_avatar_input: self.show_avatar_input,
            avatar_path_input: self.avatar_path_input.clone(),
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
