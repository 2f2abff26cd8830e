//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Screens of the application
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Screen {
    #[default]
    SignIn,
    SignUp,
    Dashboard,
    CreateAppointment,
    AppointmentCreated,
    Profile,
}

impl Screen {
    /// Screens that need a signed-in user
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Screen::SignIn | Screen::SignUp)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::SignIn => "Sign in",
            Screen::SignUp => "Create your account",
            Screen::Dashboard => "Providers",
            Screen::CreateAppointment => "New appointment",
            Screen::AppointmentCreated => "Appointment booked",
            Screen::Profile => "My profile",
        }
    }
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Forms
    FieldChar(char),
    FieldBackspace,
    NextField,
    PrevField,
    Submit,

    // Navigation
    Back,
    OpenSignUp,
    OpenProfile,
    SignOut,

    // Providers
    NextProvider,
    PrevProvider,
    SelectProvider,
    RefreshProviders,

    // Booking
    NextDay,
    PrevDay,
    NextHour,
    PrevHour,

    // Avatar
    OpenAvatarInput,
    AvatarPathChar(char),
    AvatarPathBackspace,
    UploadAvatar,
    CancelAvatarInput,

    // Popups
    ToggleHelp,
    CloseHelp,
    DismissAlert,

    // System
    Quit,
}

/// Popups that capture the keyboard
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Overlays {
    pub show_help: bool,
    pub show_alert: bool,
    pub show_avatar_input: bool,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(key: KeyEvent, screen: Screen, overlays: Overlays) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global Ctrl shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('n') if screen == Screen::SignIn => return Some(UiEvent::OpenSignUp),
            KeyCode::Char('u') if screen == Screen::Profile && !overlays.show_avatar_input => {
                return Some(UiEvent::OpenAvatarInput)
            }
            _ => {}
        }
    }

    // Popups first
    if overlays.show_alert {
        return Some(UiEvent::DismissAlert);
    }

    if overlays.show_help {
        return Some(UiEvent::CloseHelp);
    }

    if overlays.show_avatar_input {
        return match key.code {
            KeyCode::Esc => Some(UiEvent::CancelAvatarInput),
            KeyCode::Enter => Some(UiEvent::UploadAvatar),
            KeyCode::Backspace => Some(UiEvent::AvatarPathBackspace),
            KeyCode::Char(c) => Some(UiEvent::AvatarPathChar(c)),
            _ => None,
        };
    }

    match screen {
        Screen::SignIn | Screen::SignUp | Screen::Profile => handle_form_keys(key, screen),
        Screen::Dashboard => handle_dashboard_keys(key),
        Screen::CreateAppointment => handle_booking_keys(key),
        Screen::AppointmentCreated => match key.code {
            KeyCode::Enter | KeyCode::Esc => Some(UiEvent::Back),
            KeyCode::Char('q') => Some(UiEvent::Quit),
            _ => None,
        },
    }
}

/// Forms capture every printable key, so help lives on F1
fn handle_form_keys(key: KeyEvent, screen: Screen) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc if screen == Screen::SignIn => Some(UiEvent::Quit),
        KeyCode::Esc => Some(UiEvent::Back),
        KeyCode::F(1) => Some(UiEvent::ToggleHelp),
        KeyCode::Tab | KeyCode::Down => Some(UiEvent::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(UiEvent::PrevField),
        KeyCode::Enter => Some(UiEvent::Submit),
        KeyCode::Backspace => Some(UiEvent::FieldBackspace),
        KeyCode::Char(c) => Some(UiEvent::FieldChar(c)),
        _ => None,
    }
}

fn handle_dashboard_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::PrevProvider),
        KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::NextProvider),
        KeyCode::Enter => Some(UiEvent::SelectProvider),
        KeyCode::Char('p') => Some(UiEvent::OpenProfile),
        KeyCode::Char('r') => Some(UiEvent::RefreshProviders),
        KeyCode::Char('o') => Some(UiEvent::SignOut),
        _ => None,
    }
}

fn handle_booking_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Esc | KeyCode::Backspace => Some(UiEvent::Back),
        KeyCode::Left => Some(UiEvent::PrevProvider),
        KeyCode::Right => Some(UiEvent::NextProvider),
        KeyCode::Char('[') => Some(UiEvent::PrevDay),
        KeyCode::Char(']') => Some(UiEvent::NextDay),
        KeyCode::Up => Some(UiEvent::PrevHour),
        KeyCode::Down => Some(UiEvent::NextHour),
        KeyCode::Enter => Some(UiEvent::Submit),
        _ => None,
    }
}
