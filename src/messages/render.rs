//! Render state - data structure sent from App layer to UI for rendering

use chrono::{Local, NaiveDate};

use crate::app::form::FormState;
use crate::app::state::AppointmentSummary;
use crate::availability::DayAvailability;
use crate::error::Alert;
use crate::messages::ui_events::{Overlays, Screen};
use crate::models::{Provider, UserProfile};

/// Complete state needed by the UI to render
#[derive(Debug, Clone)]
pub struct RenderState {
    pub screen: Screen,

    // Session
    pub session_loading: bool,
    pub user: Option<UserProfile>,

    // Requests in flight
    pub busy: bool,

    // Form screens
    pub form: FormState,

    // Providers
    pub providers: Vec<Provider>,
    pub provider_cursor: usize,
    pub selected_provider_id: Option<String>,

    // Booking
    pub date: NaiveDate,
    pub availability: DayAvailability,
    pub availability_loaded: bool,
    pub selected_hour: Option<u8>,
    pub created: Option<AppointmentSummary>,

    // Popups
    pub alert: Option<Alert>,
    pub show_help: bool,
    pub show_avatar_input: bool,
    pub avatar_path_input: String,
}

impl RenderState {
    pub fn overlays(&self) -> Overlays {
        Overlays {
            show_help: self.show_help,
            show_alert: self.alert.is_some(),
            show_avatar_input: self.show_avatar_input,
        }
    }

    pub fn selected_provider(&self) -> Option<&Provider> {
        let id = self.selected_provider_id.as_deref()?;
        self.providers.iter().find(|p| p.id == id)
    }
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            screen: Screen::SignIn,
            session_loading: true,
            user: None,
            busy: false,
            form: FormState::sign_in(),
            providers: Vec::new(),
            provider_cursor: 0,
            selected_provider_id: None,
            date: Local::now().date_naive(),
            availability: DayAvailability::default(),
            availability_loaded: false,
            selected_hour: None,
            created: None,
            alert: None,
            show_help: false,
            show_avatar_input: false,
            avatar_path_input: String::new(),
        }
    }
}
