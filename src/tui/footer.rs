use crate::app::AppState;
use crate::input::FormMode;
use crate::views::ViewId;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Key hints for the current view and mode.
pub fn hints(state: &AppState) -> &'static [(&'static str, &'static str)] {
    let ctx = state.input_context();
    if ctx.searching {
        return &[("type", "filter"), ("Enter", "keep"), ("Esc", "cancel"), ("^U", "clear")];
    }
    match ctx.view {
        ViewId::MainMenu => &[("↑↓", "navigate"), ("Enter", "select"), ("q", "quit")],
        ViewId::Targets => &[
            ("↑↓", "navigate"),
            ("Enter", "select"),
            ("a", "add target"),
            ("d", "delete"),
            ("i", "details"),
            ("/", "search"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        ViewId::Pipelines => &[
            ("↑↓", "navigate"),
            ("j", "jobs"),
            ("r", "resources"),
            ("p", "pause/unpause"),
            ("/", "search"),
            ("F5", "refresh"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        ViewId::Jobs => &[
            ("↑↓", "navigate"),
            ("Enter", "trigger"),
            ("b", "builds"),
            ("/", "search"),
            ("F5", "refresh"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        ViewId::Resources => &[
            ("↑↓", "navigate"),
            ("Enter", "check"),
            ("/", "search"),
            ("F5", "refresh"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        ViewId::Builds => &[
            ("↑↓", "navigate"),
            ("Enter", "rerun build"),
            ("/", "search"),
            ("F5", "refresh"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        ViewId::AddTarget => match ctx.form {
            FormMode::Editing => &[("Tab", "next field"), ("Enter", "save"), ("Esc", "cancel")],
            FormMode::Busy => &[("Esc", "cancel")],
            FormMode::Result { pending_auth: true } => &[
                ("r", "retry"),
                ("c", "copy command"),
                ("Esc", "back"),
                ("q", "quit"),
            ],
            FormMode::Result { pending_auth: false } => &[("Enter/Esc", "back"), ("q", "quit")],
        },
        ViewId::Auth => &[("Enter/y", "login"), ("n", "cancel"), ("Esc", "back"), ("q", "quit")],
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints(state).iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(format!(" {desc}"), Style::default().fg(Color::DarkGray)));
    }

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}
