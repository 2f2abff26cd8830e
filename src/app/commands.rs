//! Command handlers - business logic for processing UI events

use std::path::PathBuf;

use crate::app::form::FormState;
use crate::app::state::{today, AppState, AppointmentSummary, PendingOp};
use crate::availability::{appointment_datetime, DayAvailability};
use crate::error::{Alert, AppError};
use crate::messages::ui_events::Screen;
use crate::messages::{ApiRequest, NetworkCommand, NetworkResponse};
use crate::models::{AppointmentRequest, SignInCredentials};
use crate::session::SessionState;

impl AppState {
    // ========================
    // Navigation
    // ========================

    /// Enter a screen, resetting its local state and starting its fetches
    pub fn go_to(&mut self, screen: Screen) -> Vec<NetworkCommand> {
        tracing::debug!(from = ?self.screen, to = ?screen, "Navigating");
        self.screen = screen;
        self.show_help = false;
        self.show_avatar_input = false;
        self.avatar_path_input.clear();

        match screen {
            Screen::SignIn => {
                self.form = FormState::sign_in();
                Vec::new()
            }
            Screen::SignUp => {
                self.form = FormState::sign_up();
                Vec::new()
            }
            Screen::Profile => {
                self.form = FormState::profile(self.session.user().as_ref());
                Vec::new()
            }
            Screen::Dashboard => {
                self.providers.clear();
                self.provider_cursor = 0;
                self.request_providers().into_iter().collect()
            }
            Screen::CreateAppointment => {
                // Providers are fetched again for this screen
                self.date = today();
                self.reset_availability();
                let mut commands: Vec<NetworkCommand> = self.request_providers().into_iter().collect();
                commands.extend(self.request_availability());
                commands
            }
            Screen::AppointmentCreated => Vec::new(),
        }
    }

    pub fn back(&mut self) -> Vec<NetworkCommand> {
        match self.screen {
            Screen::SignUp => self.go_to(Screen::SignIn),
            Screen::CreateAppointment | Screen::AppointmentCreated | Screen::Profile => {
                self.go_to(Screen::Dashboard)
            }
            Screen::SignIn | Screen::Dashboard => Vec::new(),
        }
    }

    /// Route between public and auth-gated screens after a session change
    pub fn on_session_changed(&mut self) -> Vec<NetworkCommand> {
        match self.session.state() {
            SessionState::Loading => Vec::new(),
            SessionState::Unauthenticated => {
                if self.screen.requires_auth() {
                    self.providers.clear();
                    self.selected_provider_id = None;
                    self.created = None;
                    self.pending.clear();
                    self.go_to(Screen::SignIn)
                } else {
                    Vec::new()
                }
            }
            SessionState::Authenticated(_) => {
                if self.screen.requires_auth() {
                    Vec::new()
                } else {
                    self.go_to(Screen::Dashboard)
                }
            }
        }
    }

    // ========================
    // Form editing
    // ========================

    pub fn field_char(&mut self, c: char) {
        self.form.push_char(c);
    }

    pub fn field_backspace(&mut self) {
        self.form.backspace();
    }

    pub fn next_field(&mut self) {
        self.form.next_field();
    }

    pub fn prev_field(&mut self) {
        self.form.prev_field();
    }

    // ========================
    // Submission
    // ========================

    /// Validate the sign-in form. The caller runs the session call.
    pub fn prepare_sign_in(&mut self) -> Option<SignInCredentials> {
        if self.signing_in {
            return None;
        }
        self.form.clear_errors();
        match self.form.to_sign_in().validate() {
            Ok(credentials) => {
                self.signing_in = true;
                Some(credentials)
            }
            Err(errors) => {
                self.reject("Authentication error", "", errors.into());
                None
            }
        }
    }

    /// Apply the outcome of a sign-in. Success is routed by `on_session_changed`.
    pub fn finish_sign_in(&mut self, result: Result<(), AppError>) {
        self.signing_in = false;
        if let Err(error) = result {
            tracing::warn!(error = %error, "Sign-in failed");
            self.reject(
                "Authentication error",
                "Could not sign in, check your credentials.",
                error,
            );
        }
    }

    /// Field errors stay on the form, anything else becomes an alert
    fn reject(&mut self, title: &str, fallback: &str, error: AppError) {
        match error {
            AppError::Validation(errors) => self.form.set_errors(errors),
            other => self.alert = Some(Alert::from_error(title, fallback, &other)),
        }
    }

    /// Submit the form or booking of the current screen
    pub fn submit(&mut self) -> Vec<NetworkCommand> {
        match self.screen {
            Screen::SignUp => self.submit_sign_up().into_iter().collect(),
            Screen::Profile => self.submit_profile().into_iter().collect(),
            Screen::CreateAppointment => self.submit_appointment().into_iter().collect(),
            Screen::AppointmentCreated => self.go_to(Screen::Dashboard),
            Screen::SignIn | Screen::Dashboard => Vec::new(),
        }
    }

    fn submit_sign_up(&mut self) -> Option<NetworkCommand> {
        if self.is_pending(PendingOp::SignUp) {
            return None;
        }
        self.form.clear_errors();
        match self.form.to_sign_up().validate() {
            Ok(request) => Some(self.issue(PendingOp::SignUp, ApiRequest::SignUp(request))),
            Err(errors) => {
                self.reject("Sign-up error", "", errors.into());
                None
            }
        }
    }

    fn submit_profile(&mut self) -> Option<NetworkCommand> {
        if self.is_pending(PendingOp::Profile) {
            return None;
        }
        self.form.clear_errors();
        let update = match self.form.to_profile().validate() {
            Ok(update) => update,
            Err(errors) => {
                self.reject("Profile update error", "", errors.into());
                return None;
            }
        };
        let token = self.session.token()?;
        Some(self.issue(PendingOp::Profile, ApiRequest::UpdateProfile { token, update }))
    }

    fn submit_appointment(&mut self) -> Option<NetworkCommand> {
        if self.is_pending(PendingOp::Appointment) {
            return None;
        }
        let provider_id = self.selected_provider_id.clone()?;
        let hour = match self.selected_hour {
            Some(hour) if self.availability.is_available(hour) => hour,
            _ => {
                self.alert = Some(Alert::new(
                    "Pick a time",
                    "Choose one of the available hours before confirming.",
                ));
                return None;
            }
        };
        let Some(date) = appointment_datetime(self.date, hour) else {
            self.alert = Some(Alert::new("Pick a time", "That hour does not exist on this day."));
            return None;
        };
        let token = self.session.token()?;
        Some(self.issue(
            PendingOp::Appointment,
            ApiRequest::CreateAppointment {
                token,
                request: AppointmentRequest { provider_id, date },
            },
        ))
    }

    // ========================
    // Session
    // ========================

    pub fn sign_out(&mut self) {
        if let Err(error) = self.session.sign_out() {
            tracing::error!(error = %error, "Sign-out failed");
            self.alert = Some(Alert::from_error("Sign-out error", "Could not sign out.", &error));
        }
    }

    // ========================
    // Providers
    // ========================

    pub fn refresh_providers(&mut self) -> Vec<NetworkCommand> {
        if self.is_pending(PendingOp::Providers) {
            return Vec::new();
        }
        self.request_providers().into_iter().collect()
    }

    pub fn next_provider(&mut self) -> Vec<NetworkCommand> {
        self.move_provider(1)
    }

    pub fn prev_provider(&mut self) -> Vec<NetworkCommand> {
        self.move_provider(-1)
    }

    fn move_provider(&mut self, step: isize) -> Vec<NetworkCommand> {
        let len = self.providers.len();
        if len == 0 {
            return Vec::new();
        }
        match self.screen {
            Screen::Dashboard => {
                self.provider_cursor = wrap_index(self.provider_cursor, step, len);
                Vec::new()
            }
            Screen::CreateAppointment => {
                let current = self
                    .selected_provider_id
                    .as_deref()
                    .and_then(|id| self.providers.iter().position(|p| p.id == id))
                    .unwrap_or(0);
                let next = wrap_index(current, step, len);
                self.select_provider_id(self.providers[next].id.clone())
            }
            _ => Vec::new(),
        }
    }

    /// Open the booking screen for the provider under the dashboard cursor
    pub fn select_provider(&mut self) -> Vec<NetworkCommand> {
        let Some(provider) = self.providers.get(self.provider_cursor) else {
            return Vec::new();
        };
        self.selected_provider_id = Some(provider.id.clone());
        self.go_to(Screen::CreateAppointment)
    }

    fn select_provider_id(&mut self, id: String) -> Vec<NetworkCommand> {
        if self.selected_provider_id.as_deref() == Some(id.as_str()) {
            return Vec::new();
        }
        self.selected_provider_id = Some(id);
        self.reset_availability();
        self.request_availability().into_iter().collect()
    }

    // ========================
    // Booking
    // ========================

    pub fn next_day(&mut self) -> Vec<NetworkCommand> {
        match self.date.succ_opt() {
            Some(next) => self.change_date(next),
            None => Vec::new(),
        }
    }

    /// Days before today are not bookable
    pub fn prev_day(&mut self) -> Vec<NetworkCommand> {
        match self.date.pred_opt() {
            Some(prev) if prev >= today() => self.change_date(prev),
            _ => Vec::new(),
        }
    }

    fn change_date(&mut self, date: chrono::NaiveDate) -> Vec<NetworkCommand> {
        self.date = date;
        self.reset_availability();
        self.request_availability().into_iter().collect()
    }

    pub fn next_hour(&mut self) {
        if let Some(hour) = self.availability.next_available(self.selected_hour) {
            self.selected_hour = Some(hour);
        }
    }

    pub fn prev_hour(&mut self) {
        if let Some(hour) = self.availability.prev_available(self.selected_hour) {
            self.selected_hour = Some(hour);
        }
    }

    fn reset_availability(&mut self) {
        self.availability = DayAvailability::default();
        self.availability_loaded = false;
        self.selected_hour = None;
    }

    // ========================
    // Avatar
    // ========================

    pub fn open_avatar_input(&mut self) {
        self.show_avatar_input = true;
    }

    pub fn avatar_path_char(&mut self, c: char) {
        self.avatar_path_input.push(c);
    }

    pub fn avatar_path_backspace(&mut self) {
        self.avatar_path_input.pop();
    }

    pub fn cancel_avatar_input(&mut self) {
        self.show_avatar_input = false;
        self.avatar_path_input.clear();
    }

    pub fn upload_avatar(&mut self) -> Option<NetworkCommand> {
        let input = self.avatar_path_input.trim().to_string();
        if input.is_empty() {
            return None;
        }
        self.cancel_avatar_input();
        let session = self.session.session()?;
        let path = expand_home(&input);
        Some(self.issue(
            PendingOp::Avatar,
            ApiRequest::UpdateAvatar {
                token: session.token,
                user_id: session.user.id,
                path,
            },
        ))
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // ========================
    // Requests
    // ========================

    fn issue(&mut self, op: PendingOp, request: ApiRequest) -> NetworkCommand {
        let id = self.next_id();
        self.pending.insert(id, op);
        NetworkCommand::Execute { id, request }
    }

    fn request_providers(&mut self) -> Option<NetworkCommand> {
        let token = self.session.token()?;
        Some(self.issue(PendingOp::Providers, ApiRequest::ListProviders { token }))
    }

    fn request_availability(&mut self) -> Option<NetworkCommand> {
        let provider_id = self.selected_provider_id.clone()?;
        let token = self.session.token()?;
        // Only the latest selection matters
        self.pending.retain(|_, op| *op != PendingOp::Availability);
        Some(self.issue(
            PendingOp::Availability,
            ApiRequest::DayAvailability {
                token,
                provider_id,
                date: self.date,
            },
        ))
    }

    // ========================
    // Response handling
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) -> Vec<NetworkCommand> {
        // Anything no longer pending is stale
        let Some(op) = self.pending.remove(&response.id()) else {
            tracing::debug!(id = response.id(), "Dropping stale response");
            return Vec::new();
        };

        match response {
            NetworkResponse::SignedUp { user, .. } => {
                tracing::info!(user_id = %user.id, "Account created");
                self.alert = Some(Alert::new(
                    "Account created",
                    "Your account is ready. You can sign in now.",
                ));
                if self.screen == Screen::SignUp {
                    return self.go_to(Screen::SignIn);
                }
                Vec::new()
            }
            NetworkResponse::Providers { providers, .. } => {
                self.providers = providers;
                if self.provider_cursor >= self.providers.len() {
                    self.provider_cursor = 0;
                }
                Vec::new()
            }
            NetworkResponse::DayAvailability {
                provider_id,
                date,
                slots,
                ..
            } => {
                if self.screen == Screen::CreateAppointment
                    && self.selected_provider_id.as_deref() == Some(provider_id.as_str())
                    && self.date == date
                {
                    self.availability = DayAvailability::partition(&slots);
                    self.availability_loaded = true;
                    if !self.selected_hour.is_some_and(|h| self.availability.is_available(h)) {
                        self.selected_hour = None;
                    }
                }
                Vec::new()
            }
            NetworkResponse::AppointmentCreated { appointment, .. } => {
                tracing::info!(appointment_id = %appointment.id, "Appointment created");
                let provider_name = self
                    .selected_provider_id
                    .as_deref()
                    .and_then(|id| self.providers.iter().find(|p| p.id == id))
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                self.created = Some(AppointmentSummary {
                    provider_name,
                    at: appointment.date.with_timezone(&chrono::Local),
                });
                self.go_to(Screen::AppointmentCreated)
            }
            NetworkResponse::ProfileUpdated { user, .. } => {
                if let Err(error) = self.session.update_user(user) {
                    self.alert = Some(Alert::from_error(
                        "Profile update error",
                        "Your profile was saved but could not be stored locally.",
                        &error,
                    ));
                    return Vec::new();
                }
                self.alert = Some(Alert::new("Profile updated", "Your changes were saved."));
                if self.screen == Screen::Profile {
                    return self.go_to(Screen::Dashboard);
                }
                Vec::new()
            }
            NetworkResponse::AvatarUpdated { user, .. } => {
                if let Err(error) = self.session.update_user(user) {
                    self.alert = Some(Alert::from_error(
                        "Avatar update error",
                        "Your avatar was saved but could not be stored locally.",
                        &error,
                    ));
                } else {
                    self.alert = Some(Alert::new("Avatar updated", "Your new avatar is live."));
                }
                Vec::new()
            }
            NetworkResponse::Failed { error, .. } => {
                tracing::warn!(op = ?op, error = %error, "Request failed");
                self.alert = Some(failure_alert(op, &error));
                if op == PendingOp::Availability {
                    self.availability_loaded = true;
                }
                Vec::new()
            }
        }
    }
}

fn failure_alert(op: PendingOp, error: &AppError) -> Alert {
    let (title, fallback) = match op {
        PendingOp::SignUp => ("Sign-up error", "Could not create your account, try again."),
        PendingOp::Providers => ("Could not load providers", "Try again in a moment."),
        PendingOp::Availability => ("Could not load availability", "Try another day or provider."),
        PendingOp::Appointment => (
            "Could not create appointment",
            "Something went wrong while booking, try again.",
        ),
        PendingOp::Profile => ("Profile update error", "Could not update your profile, try again."),
        PendingOp::Avatar => ("Avatar update error", "Could not update your avatar."),
    };
    Alert::from_error(title, fallback, error)
}

fn wrap_index(current: usize, step: isize, len: usize) -> usize {
    let len = len as isize;
    (((current as isize + step) % len + len) % len) as usize
}

/// Expand a leading `~` to the home directory
fn expand_home(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TOKEN_KEY, USER_KEY};
    use crate::models::{Appointment, AvailabilitySlot, Provider, UserProfile};
    use crate::session::SessionStore;
    use crate::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;

    fn user(name: &str) -> UserProfile {
        serde_json::from_value(json!({
            "id": "u1", "name": name, "email": "ana@example.com", "avatar_url": null
        }))
        .unwrap()
    }

    fn signed_out_state() -> AppState {
        let mut session = SessionStore::new(Box::new(MemoryStore::new()));
        session.restore();
        AppState::new(session)
    }

    fn signed_in_state() -> AppState {
        let mut storage = MemoryStore::new();
        let user_json = serde_json::to_string(&user("Ana")).unwrap();
        storage
            .multi_set(&[(TOKEN_KEY, "t0k"), (USER_KEY, user_json.as_str())])
            .unwrap();
        let mut session = SessionStore::new(Box::new(storage));
        session.restore();
        let mut state = AppState::new(session);
        state.on_session_changed();
        state
    }

    fn providers() -> Vec<Provider> {
        vec![
            Provider { id: "p1".into(), name: "Bruno".into(), avatar_url: None },
            Provider { id: "p2".into(), name: "Carla".into(), avatar_url: None },
        ]
    }

    fn type_into(state: &mut AppState, field: &str, value: &str) {
        state.form.set(field, value);
    }

    fn only_request(commands: &[NetworkCommand]) -> (u64, &ApiRequest) {
        assert_eq!(commands.len(), 1, "expected one command, got {:?}", commands);
        match &commands[0] {
            NetworkCommand::Execute { id, request } => (*id, request),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    /// Drive the booking screen to loaded providers and availability
    fn booking_state() -> AppState {
        let mut state = signed_in_state();
        let dashboard_fetch = state.pending.keys().copied().next().unwrap();
        state.handle_response(NetworkResponse::Providers { id: dashboard_fetch, providers: providers() });
        state.select_provider();

        let ids: Vec<(u64, PendingOp)> = state.pending.iter().map(|(k, v)| (*k, *v)).collect();
        for (id, op) in ids {
            let response = match op {
                PendingOp::Providers => NetworkResponse::Providers { id, providers: providers() },
                PendingOp::Availability => NetworkResponse::DayAvailability {
                    id,
                    provider_id: "p1".into(),
                    date: state.date,
                    slots: vec![
                        AvailabilitySlot { hour: 9, available: true },
                        AvailabilitySlot { hour: 10, available: false },
                        AvailabilitySlot { hour: 14, available: true },
                    ],
                },
                other => panic!("unexpected pending op {:?}", other),
            };
            state.handle_response(response);
        }
        state
    }

    #[test]
    fn test_signed_in_restore_routes_to_dashboard() {
        let state = signed_in_state();
        assert_eq!(state.screen, Screen::Dashboard);
        assert!(state.is_pending(PendingOp::Providers));
    }

    #[test]
    fn test_sign_up_with_invalid_email_issues_nothing() {
        let mut state = signed_out_state();
        state.go_to(Screen::SignUp);
        type_into(&mut state, "name", "Ana");
        type_into(&mut state, "email", "ana-at-example");
        type_into(&mut state, "password", "123456");

        let commands = state.submit();
        assert!(commands.is_empty());
        assert!(state.pending.is_empty());
        assert_eq!(state.form.error("email"), Some("Enter a valid email"));
        assert!(state.alert.is_none());
    }

    #[test]
    fn test_sign_up_success_returns_to_sign_in() {
        let mut state = signed_out_state();
        state.go_to(Screen::SignUp);
        type_into(&mut state, "name", "Ana");
        type_into(&mut state, "email", "ana@example.com");
        type_into(&mut state, "password", "123456");

        let commands = state.submit();
        let (id, request) = only_request(&commands);
        assert!(matches!(request, ApiRequest::SignUp(r) if r.email == "ana@example.com"));

        state.handle_response(NetworkResponse::SignedUp { id, user: user("Ana") });
        assert_eq!(state.screen, Screen::SignIn);
        assert_eq!(state.alert.as_ref().unwrap().title, "Account created");
    }

    #[test]
    fn test_sign_in_validation_blocks_call() {
        let mut state = signed_out_state();
        assert!(state.prepare_sign_in().is_none());
        assert_eq!(state.form.error("email"), Some("Email is required"));
        assert!(!state.signing_in);

        type_into(&mut state, "email", "ana@example.com");
        type_into(&mut state, "password", "123456");
        assert!(state.prepare_sign_in().is_some());
        assert!(state.signing_in);
        // A second submit while the first is in flight is ignored
        assert!(state.prepare_sign_in().is_none());
    }

    #[test]
    fn test_validation_errors_stay_on_form() {
        let mut state = signed_out_state();
        let errors = state.form.to_sign_in().validate().unwrap_err();
        state.reject("Authentication error", "", AppError::from(errors));
        assert!(state.alert.is_none());
        assert_eq!(state.form.error("email"), Some("Email is required"));

        state.reject("Authentication error", "Try again.", AppError::Network("down".into()));
        assert_eq!(state.alert.as_ref().unwrap().title, "Authentication error");
    }

    #[test]
    fn test_failed_sign_in_shows_alert() {
        let mut state = signed_out_state();
        state.signing_in = true;
        state.finish_sign_in(Err(AppError::Authentication("Incorrect email/password combination.".into())));
        assert!(!state.signing_in);
        assert_eq!(state.alert.as_ref().unwrap().title, "Authentication error");
        assert_eq!(state.screen, Screen::SignIn);
    }

    #[test]
    fn test_sign_out_routes_to_sign_in() {
        let mut state = signed_in_state();
        state.sign_out();
        state.on_session_changed();
        assert_eq!(state.screen, Screen::SignIn);
        assert!(state.pending.is_empty());
        assert!(state.session.session().is_none());
    }

    #[test]
    fn test_booking_partitions_and_selects_hours() {
        let mut state = booking_state();
        assert_eq!(state.screen, Screen::CreateAppointment);
        assert!(state.availability_loaded);
        assert_eq!(state.availability.morning.len(), 2);
        assert_eq!(state.availability.afternoon.len(), 1);

        state.next_hour();
        assert_eq!(state.selected_hour, Some(9));
        state.next_hour();
        assert_eq!(state.selected_hour, Some(14));
    }

    #[test]
    fn test_booking_requires_available_hour() {
        let mut state = booking_state();
        let commands = state.submit();
        assert!(commands.is_empty());
        assert_eq!(state.alert.as_ref().unwrap().title, "Pick a time");
    }

    #[test]
    fn test_booking_submits_and_confirms() {
        let mut state = booking_state();
        state.next_hour();
        let commands = state.submit();
        let (id, request) = only_request(&commands);
        let ApiRequest::CreateAppointment { token, request } = request else {
            panic!("unexpected request {:?}", request);
        };
        assert_eq!(token, "t0k");
        assert_eq!(request.provider_id, "p1");
        assert_eq!(request.date.naive_local().date(), state.date);

        let appointment = Appointment {
            id: "a1".into(),
            provider_id: Some("p1".into()),
            date: request.date.with_timezone(&chrono::Utc),
            extra: Default::default(),
        };
        state.handle_response(NetworkResponse::AppointmentCreated { id, appointment });
        assert_eq!(state.screen, Screen::AppointmentCreated);
        assert_eq!(state.created.as_ref().unwrap().provider_name, "Bruno");
    }

    #[test]
    fn test_changing_provider_refetches_and_drops_stale_slots() {
        let mut state = booking_state();
        state.next_hour();
        let stale_id = 999;
        state.pending.insert(stale_id, PendingOp::Availability);

        let commands = state.next_provider();
        let (_, request) = only_request(&commands);
        assert!(matches!(request, ApiRequest::DayAvailability { provider_id, .. } if provider_id == "p2"));
        assert_eq!(state.selected_hour, None);
        assert!(!state.availability_loaded);

        // The earlier request for p1 was superseded
        let old = NetworkResponse::DayAvailability {
            id: stale_id,
            provider_id: "p1".into(),
            date: state.date,
            slots: vec![AvailabilitySlot { hour: 8, available: true }],
        };
        state.handle_response(old);
        assert!(state.availability.is_empty());
    }

    #[test]
    fn test_cannot_go_before_today() {
        let mut state = booking_state();
        assert!(state.prev_day().is_empty());
        assert_eq!(state.date, today());
        assert_eq!(state.next_day().len(), 1);
        assert_eq!(state.prev_day().len(), 1);
        assert_eq!(state.date, today());
    }

    #[test]
    fn test_profile_update_changes_only_user() {
        let mut state = signed_in_state();
        state.go_to(Screen::Profile);
        assert_eq!(state.form.value("name"), "Ana");
        type_into(&mut state, "name", "Ana Souza");

        let commands = state.submit();
        let (id, request) = only_request(&commands);
        assert!(matches!(request, ApiRequest::UpdateProfile { update, .. } if update.old_password.is_none()));

        state.handle_response(NetworkResponse::ProfileUpdated { id, user: user("Ana Souza") });
        assert_eq!(state.session.token().as_deref(), Some("t0k"));
        assert_eq!(state.session.user().unwrap().name, "Ana Souza");
        assert_eq!(state.screen, Screen::Dashboard);
    }

    #[test]
    fn test_avatar_upload_command() {
        let mut state = signed_in_state();
        state.go_to(Screen::Profile);
        state.open_avatar_input();
        for c in "/tmp/me.jpg".chars() {
            state.avatar_path_char(c);
        }
        let command = state.upload_avatar().unwrap();
        let NetworkCommand::Execute {
            request: ApiRequest::UpdateAvatar { user_id, path, .. },
            ..
        } = command
        else {
            panic!("expected an avatar upload");
        };
        assert_eq!(user_id, "u1");
        assert_eq!(path, PathBuf::from("/tmp/me.jpg"));
        assert!(!state.show_avatar_input);
    }

    #[test]
    fn test_failure_shows_alert() {
        let mut state = signed_in_state();
        let id = state.pending.keys().copied().next().unwrap();
        state.handle_response(NetworkResponse::Failed {
            id,
            error: AppError::Network("Connection failed".into()),
        });
        let alert = state.alert.unwrap();
        assert_eq!(alert.title, "Could not load providers");
        assert!(alert.message.contains("Connection failed"));
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(0, -1, 3), 2);
        assert_eq!(wrap_index(2, 1, 3), 0);
    }
}
