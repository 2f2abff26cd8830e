//! GoBarber TUI - Actor-based appointment client
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async API calls

use std::io;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;

use gobarber_tui::availability::format_hour;
use gobarber_tui::config::load_config;
use gobarber_tui::constants::{APP_NAME, APP_VERSION};
use gobarber_tui::messages::ui_events::{key_to_ui_event, Screen};
use gobarber_tui::storage::{FileStore, KeyValueStore, MemoryStore};
use gobarber_tui::ui::{centered_rect, render_input, render_provider_list, render_slots};
use gobarber_tui::{
    ApiClient, AppActor, NetworkActor, NetworkCommand, NetworkResponse, RenderState, SessionStore,
    UiEvent,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let data_dir = config.storage.resolved_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(&data_dir, &config.logging.file);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(config.logging.max_level())
        .init();

    tracing::info!(version = APP_VERSION, api = %config.api.base_url, "Starting");

    let storage: Box<dyn KeyValueStore> = match FileStore::open(&data_dir) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Session storage unavailable, using memory");
            Box::new(MemoryStore::new())
        }
    };
    let session = SessionStore::new(storage);
    let api = ApiClient::new(&config.api);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(api.clone(), net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(session, api, net_cmd_tx, render_tx);
    let app_handle = tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    let ui_result = run_ui_loop(&mut terminal, ui_tx, &mut render_rx);

    // Give the terminal back before waiting on the app actor
    drop(terminal);
    drop(guard);
    ui_result?;

    // Let the app actor flush the shutdown command
    if tokio::time::timeout(Duration::from_secs(2), app_handle).await.is_err() {
        tracing::warn!("App actor did not stop in time");
    }
    tracing::info!("Exiting");

    Ok(())
}

/// Run the synchronous UI rendering loop
fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        terminal.draw(|f| draw_ui(f, &current_state))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(key, current_state.screen, current_state.overlays()) {
                    let quit = event == UiEvent::Quit;
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_header(f, state, main_chunks[0]);

    if state.session_loading {
        draw_loading(f, main_chunks[1]);
    } else {
        match state.screen {
            Screen::SignIn | Screen::SignUp | Screen::Profile => draw_form_screen(f, state, main_chunks[1]),
            Screen::Dashboard => draw_dashboard(f, state, main_chunks[1]),
            Screen::CreateAppointment => draw_booking(f, state, main_chunks[1]),
            Screen::AppointmentCreated => draw_created(f, state, main_chunks[1]),
        }
    }

    draw_status_bar(f, state, main_chunks[2]);

    // Popups
    if state.show_help {
        draw_help_popup(f, state.screen, area);
    }

    if state.show_avatar_input {
        draw_avatar_input_popup(f, state, area);
    }

    if state.alert.is_some() {
        draw_alert_popup(f, state, area);
    }
}

fn draw_header(f: &mut Frame, state: &RenderState, area: Rect) {
    let mut spans = vec![
        Span::styled(format!(" {} ", APP_NAME), Style::default().fg(Color::Black).bg(Color::Rgb(255, 144, 0)).bold()),
        Span::raw(" "),
        Span::styled(state.screen.title(), Style::default().fg(Color::Gray)),
    ];
    if let Some(user) = &state.user {
        spans.push(Span::styled(format!("  | {}", user.name), Style::default().fg(Color::Cyan)));
    }
    if state.busy {
        spans.push(Span::styled("  [...]", Style::default().fg(Color::Yellow)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_loading(f: &mut Frame, area: Rect) {
    let popup = centered_rect(30, 20, area);
    let loading = Paragraph::new("Loading...")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(loading, popup);
}

fn draw_form_screen(f: &mut Frame, state: &RenderState, area: Rect) {
    let form = &state.form;
    let extra_rows = if state.screen == Screen::Profile { 3 } else { 2 };
    let height = (form.fields.len() as u16) * 3 + extra_rows + 2;
    let width = area.width.min(60);
    let form_area = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height.min(area.height),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(255, 144, 0)))
        .title(format!(" {} ", state.screen.title()));
    let inner = block.inner(form_area);
    f.render_widget(block, form_area);

    let mut constraints: Vec<Constraint> = form.fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focused;
        f.render_widget(render_input(field, focused, form.error(field.name)), rows[i]);

        if focused && state.alert.is_none() && !state.show_help && !state.show_avatar_input {
            let row = rows[i];
            let max_x = row.x + row.width.saturating_sub(2);
            let cursor_x = (row.x + field.value.chars().count() as u16 + 1).min(max_x);
            f.set_cursor_position(Position::new(cursor_x, row.y + 1));
        }
    }

    let hint = match state.screen {
        Screen::SignIn => "Enter: sign in | Ctrl+N: create account",
        Screen::SignUp => "Enter: create account | Esc: back to sign in",
        _ => "Enter: save | Ctrl+U: change avatar | Esc: back",
    };
    let mut footer = vec![Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))];
    if state.screen == Screen::Profile {
        let avatar = state
            .user
            .as_ref()
            .and_then(|u| u.avatar_url.as_deref())
            .unwrap_or("no avatar");
        footer.insert(0, Line::from(Span::styled(format!("Avatar: {}", avatar), Style::default().fg(Color::Gray))));
    }
    f.render_widget(Paragraph::new(footer), rows[form.fields.len()]);
}

fn draw_dashboard(f: &mut Frame, state: &RenderState, area: Rect) {
    let greeting = state
        .user
        .as_ref()
        .map(|u| format!(" Welcome, {} ", u.name))
        .unwrap_or_default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);
    f.render_widget(Paragraph::new(greeting).style(Style::default().bold()), chunks[0]);

    if state.providers.is_empty() {
        let text = if state.busy { "Loading providers..." } else { "No providers yet. Press 'r' to refresh." };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Providers "));
        f.render_widget(empty, chunks[1]);
        return;
    }

    let list = render_provider_list(&state.providers, " Providers (Enter to book) ");
    let mut list_state = ListState::default();
    list_state.select(Some(state.provider_cursor));
    f.render_stateful_widget(list, chunks[1], &mut list_state);
}

fn draw_booking(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Provider strip
            Constraint::Length(3), // Date
            Constraint::Length(3), // Morning
            Constraint::Length(3), // Afternoon
            Constraint::Min(0),
        ])
        .split(area);

    // Provider strip
    let spans: Vec<Span> = state
        .providers
        .iter()
        .flat_map(|p| {
            let selected = state.selected_provider_id.as_deref() == Some(p.id.as_str());
            let style = if selected {
                Style::default().fg(Color::Black).bg(Color::Rgb(255, 144, 0)).bold()
            } else {
                Style::default().fg(Color::Gray)
            };
            [Span::styled(format!(" {} ", p.name), style), Span::raw(" ")]
        })
        .collect();
    let providers = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Provider (Left/Right) "));
    f.render_widget(providers, chunks[0]);

    let date = Paragraph::new(state.date.format("%A, %B %-d %Y").to_string())
        .block(Block::default().borders(Borders::ALL).title(" Day ([ / ]) "));
    f.render_widget(date, chunks[1]);

    if !state.availability_loaded {
        let loading = Paragraph::new("Loading availability...").style(Style::default().fg(Color::DarkGray));
        f.render_widget(loading, chunks[2]);
        return;
    }

    f.render_widget(render_slots(" Morning ", &state.availability.morning, state.selected_hour), chunks[2]);
    f.render_widget(render_slots(" Afternoon ", &state.availability.afternoon, state.selected_hour), chunks[3]);

    let summary = match (state.selected_provider(), state.selected_hour) {
        (Some(provider), Some(hour)) => format!("Enter to book {} at {}", provider.name, format_hour(hour)),
        _ => "Pick an hour with Up/Down".to_string(),
    };
    f.render_widget(Paragraph::new(summary).style(Style::default().fg(Color::DarkGray)), chunks[4]);
}

fn draw_created(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup = centered_rect(60, 40, area);
    let mut lines = vec![
        Line::from(Span::styled("Appointment booked", Style::default().fg(Color::Green).bold())),
        Line::from(""),
    ];
    if let Some(created) = &state.created {
        if !created.provider_name.is_empty() {
            lines.push(Line::from(format!("With {}", created.provider_name)));
        }
        lines.push(Line::from(created.describe()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Enter: back to providers", Style::default().fg(Color::DarkGray))));

    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Green)));
    f.render_widget(body, popup);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = if state.busy {
        " Loading... "
    } else {
        match state.screen {
            Screen::SignIn => " Tab:next field | Enter:sign in | Ctrl+N:sign up | F1:help | Esc:quit ",
            Screen::SignUp => " Tab:next field | Enter:submit | F1:help | Esc:back ",
            Screen::Profile => " Tab:next field | Enter:save | Ctrl+U:avatar | F1:help | Esc:back ",
            Screen::Dashboard => " j/k:move | Enter:book | p:profile | r:refresh | o:sign out | ?:help | q:quit ",
            Screen::CreateAppointment => " Left/Right:provider | [/]:day | Up/Down:hour | Enter:book | Esc:back ",
            Screen::AppointmentCreated => " Enter:continue | q:quit ",
        }
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, screen: Screen, area: Rect) {
    let popup_area = centered_rect(60, 60, area);

    let help_text = match screen {
        Screen::SignIn | Screen::SignUp | Screen::Profile => {
            r#"
 FORMS

   Tab / Down         Next field
   Shift+Tab / Up     Previous field
   Enter              Submit
   Esc                Back (quit on sign in)
   Ctrl+N             Create account (sign in)
   Ctrl+U             Change avatar (profile)
   Ctrl+C             Quit

 Press any key to close...
"#
        }
        Screen::Dashboard => {
            r#"
 PROVIDERS

   j / Down           Next provider
   k / Up             Previous provider
   Enter              Book with provider
   p                  My profile
   r                  Refresh list
   o                  Sign out
   q / Ctrl+C         Quit

 Press any key to close...
"#
        }
        Screen::CreateAppointment | Screen::AppointmentCreated => {
            r#"
 BOOKING

   Left / Right       Change provider
   [ / ]              Previous / next day
   Up / Down          Pick an hour
   Enter              Confirm appointment
   Esc                Back to providers
   q / Ctrl+C         Quit

 Press any key to close...
"#
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text).block(block).wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn draw_alert_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(alert) = &state.alert else {
        return;
    };
    let popup_area = centered_rect(50, 30, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(255, 144, 0)))
        .title(format!(" {} ", alert.title))
        .title_bottom(Line::from(" any key to close ").right_aligned())
        .style(Style::default().bg(Color::Black));

    let body = Paragraph::new(alert.message.as_str()).block(block).wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(body, popup_area);
}

fn draw_avatar_input_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(60, 20, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Change avatar (Enter to upload, Esc to cancel) ")
        .style(Style::default().bg(Color::Black));

    let content = if state.avatar_path_input.is_empty() {
        "Enter the path of a JPEG image...\n\nExample: ~/Pictures/me.jpg"
    } else {
        state.avatar_path_input.as_str()
    };

    let input = Paragraph::new(content).block(block).wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}
