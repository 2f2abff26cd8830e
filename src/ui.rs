use ratatui::{prelude::*, widgets::*};

use crate::app::form::FormField;
use crate::availability::{format_hour, HourSlot};
use crate::models::Provider;

/// Renders a form field; a validation error turns the border red and is shown
/// on the bottom edge
pub fn render_input<'a>(field: &'a FormField, is_focused: bool, error: Option<&'a str>) -> Paragraph<'a> {
    let style = if error.is_some() {
        Style::default().fg(Color::Red)
    } else if is_focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(format!(" {} ", field.label));

    if let Some(message) = error {
        block = block.title_bottom(Line::from(format!(" {} ", message)).style(Style::default().fg(Color::Red)));
    }

    Paragraph::new(field.display_value()).block(block)
}

/// Renders the provider list with the cursor highlighted
pub fn render_provider_list<'a>(providers: &'a [Provider], title: &'a str) -> List<'a> {
    let items: Vec<ListItem> = providers
        .iter()
        .map(|p| {
            let avatar = if p.avatar_url.is_some() { "[img]" } else { "[ - ]" };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", avatar), Style::default().fg(Color::DarkGray)),
                Span::raw(p.name.as_str()),
            ]))
        })
        .collect();

    List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .highlight_symbol("> ")
}

/// Style of an hour slot: unavailable dimmed, selected inverted
pub fn slot_style(slot: &HourSlot, selected: bool) -> Style {
    if !slot.available {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else if selected {
        Style::default().fg(Color::Black).bg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::Green)
    }
}

/// One row of hour chips for a period of the day
pub fn render_slots<'a>(title: &'a str, slots: &'a [HourSlot], selected: Option<u8>) -> Paragraph<'a> {
    let spans: Vec<Span> = if slots.is_empty() {
        vec![Span::styled("No hours", Style::default().fg(Color::DarkGray))]
    } else {
        slots
            .iter()
            .flat_map(|slot| {
                [
                    Span::styled(
                        format!(" {} ", format_hour(slot.hour)),
                        slot_style(slot, selected == Some(slot.hour)),
                    ),
                    Span::raw(" "),
                ]
            })
            .collect()
    };

    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(title))
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
