//! Screens that are not lists: main menu, add-target form, login prompt.

use crate::app::AppState;
use crate::views::add_target::{AddTargetView, FormOutcome, FormPhase, FIELD_LABELS};
use crate::views::auth::{AuthPhase, AuthView};
use crate::views::main_menu::{MainMenuView, MENU_ITEMS};
use crate::views::ViewId;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

const PLACEHOLDERS: [&str; 3] = ["my-target", "https://concourse.example.com", "main"];

fn title(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    ))
}

fn styled(text: impl Into<String>, color: Color) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(color)))
}

fn main_menu_lines(view: &MainMenuView) -> Vec<Line<'static>> {
    let mut lines = vec![title("Welcome to FlyBy"), Line::raw("")];
    for (i, item) in MENU_ITEMS.iter().enumerate() {
        if i == view.selected() {
            lines.push(Line::from(Span::styled(
                format!("> {item}"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
        } else {
            lines.push(Line::raw(format!("  {item}")));
        }
    }
    lines
}

fn add_target_lines(view: &AddTargetView) -> Vec<Line<'static>> {
    let mut lines = vec![title("Add New Target"), Line::raw("")];
    let editing = *view.phase() == FormPhase::Editing;
    for (i, label) in FIELD_LABELS.iter().enumerate() {
        let focused = editing && i == view.focused();
        let value = &view.values()[i];
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let value_span = if value.is_empty() {
            Span::styled(PLACEHOLDERS[i], Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(value.clone())
        };
        let mut spans = vec![Span::styled(format!("{label:>5}: "), label_style), value_span];
        if focused {
            spans.push(Span::styled("_", Style::default().fg(Color::Cyan)));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::raw(""));

    match view.phase() {
        FormPhase::Editing => {
            if !view.can_submit() {
                lines.push(styled("Name, URL and Team are required.", Color::DarkGray));
            }
        }
        FormPhase::Submitting => {
            lines.push(styled(format!("Executing: {}", view.manual_command()), Color::Yellow));
        }
        FormPhase::Result(FormOutcome::Success(msg)) => {
            lines.push(styled(format!("✓ {msg}"), Color::Green));
            lines.push(styled("Returning to targets...", Color::DarkGray));
        }
        FormPhase::Result(FormOutcome::HardFailure { message, command }) => {
            lines.push(styled(format!("✗ {message}"), Color::Red));
            lines.push(Line::raw(""));
            lines.push(Line::raw("Run this command in a separate terminal:"));
            lines.push(styled(command.clone(), Color::Cyan));
        }
        FormPhase::Result(FormOutcome::PendingAuth { message, command }) => {
            lines.push(styled(format!("⏳ {message}"), Color::Yellow));
            lines.push(Line::raw(""));
            lines.push(Line::raw("Command:"));
            lines.push(styled(command.clone(), Color::Cyan));
            if let Some(note) = view.clipboard_note() {
                lines.push(Line::raw(""));
                lines.push(styled(note.to_string(), Color::Green));
            }
        }
    }
    lines
}

fn auth_lines(view: &AuthView) -> Vec<Line<'static>> {
    let (name, team, api) = view
        .target()
        .map(|t| (t.name.clone(), t.team.clone(), t.api.clone()))
        .unwrap_or_default();
    match view.phase() {
        AuthPhase::Prompt => vec![
            title("Authentication Required"),
            Line::raw(""),
            Line::raw(format!("Target: {name}")),
            Line::raw(format!("Team: {team}")),
            Line::raw(format!("URL: {api}")),
            Line::raw(""),
            Line::raw("You need to log in to access this Concourse instance."),
            Line::raw("fly will take over the terminal until the login finishes."),
            Line::raw(""),
            styled("Press Enter/y to login, n to go back, or Esc to cancel", Color::Cyan),
        ],
        AuthPhase::Authenticating => vec![
            title("Authenticating..."),
            Line::raw(""),
            Line::raw("Complete the login process in your browser."),
        ],
        AuthPhase::Succeeded => vec![
            title("Authentication Successful!"),
            Line::raw(""),
            styled(format!("✓ Successfully logged in to {name}"), Color::Green),
        ],
        AuthPhase::Failed(err) => vec![
            title("Authentication Failed"),
            Line::raw(""),
            styled(format!("✗ {err}"), Color::Red),
            Line::raw(""),
            styled("Press Enter/y to retry, n to go back, or Esc to cancel", Color::Cyan),
        ],
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let lines = match state.view() {
        ViewId::MainMenu => main_menu_lines(&state.main_menu),
        ViewId::AddTarget => add_target_lines(&state.add_target),
        ViewId::Auth => auth_lines(&state.auth),
        _ => return,
    };
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}
