//! The five list views share one layout: heading, optional search line,
//! scrolling rows, a detail box for the selected entity and a status line.

use crate::app::AppState;
use crate::concourse::executor::manual_check_command;
use crate::config::Target;
use crate::model::{Build, BuildStatus, Job, Pipeline, Resource};
use crate::tui::format::{build_duration, compact_ago, long_ago, timestamp, truncate};
use crate::tui::spinner;
use crate::views::{Activity, BannerKind, ListItem, ListState, LoadPhase, SearchState, ViewId};
use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// Everything needed to draw one list view, detached from the state so the
/// viewport can be measured before drawing.
pub struct Panel {
    heading: String,
    search: Option<(String, bool)>,
    rows: Vec<Line<'static>>,
    selected: Option<usize>,
    scroll: usize,
    placeholder: Option<(String, Color)>,
    details: Vec<(String, String)>,
    status: Vec<Line<'static>>,
}

struct Areas {
    heading: Rect,
    search: Option<Rect>,
    list: Rect,
    details: Option<Rect>,
    status: Option<Rect>,
}

impl Panel {
    fn areas(&self, area: Rect) -> Areas {
        let mut constraints = vec![Constraint::Length(1)];
        if self.search.is_some() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Min(1));
        if !self.details.is_empty() {
            constraints.push(Constraint::Length(self.details.len() as u16 + 2));
        }
        if !self.status.is_empty() {
            constraints.push(Constraint::Length(self.status.len() as u16));
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut next = chunks.iter().copied();
        let heading = next.next().unwrap_or_default();
        let search = self.search.as_ref().and_then(|_| next.next());
        let list = next.next().unwrap_or_default();
        let details = (!self.details.is_empty()).then(|| next.next()).flatten();
        let status = (!self.status.is_empty()).then(|| next.next()).flatten();
        Areas {
            heading,
            search,
            list,
            details,
            status,
        }
    }

    /// Rows the list area can show inside `area`.
    pub fn list_rows(&self, area: Rect) -> usize {
        self.areas(area).list.height as usize
    }

    pub fn render(self, f: &mut Frame, area: Rect) {
        let areas = self.areas(area);

        f.render_widget(
            Paragraph::new(Span::styled(
                self.heading,
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
            areas.heading,
        );

        if let (Some(rect), Some((query, active))) = (areas.search, &self.search) {
            let style = if *active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let cursor = if *active { "_" } else { "" };
            f.render_widget(Paragraph::new(Span::styled(format!("Search: {query}{cursor}"), style)), rect);
        }

        if let Some((text, color)) = self.placeholder {
            f.render_widget(
                Paragraph::new(text)
                    .style(Style::default().fg(color))
                    .wrap(Wrap { trim: true }),
                areas.list,
            );
        } else {
            let height = areas.list.height as usize;
            let width = areas.list.width.saturating_sub(2) as usize;
            let lines: Vec<Line> = self
                .rows
                .into_iter()
                .enumerate()
                .skip(self.scroll)
                .take(height)
                .map(|(i, line)| select_line(line, Some(i) == self.selected, width))
                .collect();
            f.render_widget(Paragraph::new(lines), areas.list);
        }

        if let Some(rect) = areas.details {
            render_details(f, rect, &self.details);
        }

        if let Some(rect) = areas.status {
            f.render_widget(Paragraph::new(self.status).wrap(Wrap { trim: true }), rect);
        }
    }
}

fn select_line(line: Line<'static>, selected: bool, width: usize) -> Line<'static> {
    let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
    if selected {
        Line::from(Span::styled(
            format!("> {}", truncate(&text, width)),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        let mut spans = vec![Span::raw("  ")];
        spans.extend(line.spans);
        Line::from(spans)
    }
}

fn render_details(f: &mut Frame, area: Rect, details: &[(String, String)]) {
    let label_width = details
        .iter()
        .map(|(l, _)| unicode_width::UnicodeWidthStr::width(l.as_str()))
        .max()
        .unwrap_or(0);
    let value_max = (area.width as usize).saturating_sub(label_width + 4);
    let lines: Vec<Line> = details
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(
                    format!("{label:>label_width$}  "),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(truncate(value, value_max), Style::default().fg(Color::White)),
            ])
        })
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn search_line(search: &SearchState) -> Option<(String, bool)> {
    (search.active || !search.query.is_empty()).then(|| (search.query.clone(), search.active))
}

fn placeholder<T: ListItem>(
    list: &ListState<T>,
    phase: LoadPhase,
    error: Option<String>,
    noun: &str,
) -> Option<(String, Color)> {
    if let Some(e) = error {
        return Some((format!("Error: {e}"), Color::Red));
    }
    if list.is_empty() {
        if phase == LoadPhase::Loading {
            return Some((format!("Loading {noun}..."), Color::DarkGray));
        }
        if !list.search().query.is_empty() {
            return Some((format!("No {noun} match the search"), Color::DarkGray));
        }
        return Some((format!("No {noun} found"), Color::DarkGray));
    }
    None
}

/// Banner, or the in-flight line when an operation is running.
fn status_lines(activity: &Activity, in_flight: impl FnOnce(&str) -> Vec<String>) -> Vec<Line<'static>> {
    if let Some(label) = activity.in_flight() {
        return in_flight(label)
            .into_iter()
            .map(|text| Line::from(Span::styled(text, Style::default().fg(Color::Yellow))))
            .collect();
    }
    let Some(banner) = activity.banner() else {
        return Vec::new();
    };
    let (marker, style) = match banner.kind {
        BannerKind::Success => ("✓", Style::default().fg(Color::Green)),
        BannerKind::Rejected => ("✗", Style::default().fg(Color::Yellow)),
        BannerKind::Error => ("✗", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
    };
    vec![Line::from(Span::styled(format!("{marker} {}", banner.text), style))]
}

fn rows<T: ListItem>(list: &ListState<T>, row: impl Fn(&T) -> Line<'static>) -> Vec<Line<'static>> {
    list.visible().map(row).collect()
}

pub fn pipeline_label(pipeline: &Pipeline) -> String {
    let mut label = pipeline.name.clone();
    if pipeline.paused {
        label.push_str(" [PAUSED]");
    }
    if pipeline.archived {
        label.push_str(" [ARCHIVED]");
    }
    label
}

/// `#name [STATUS] <relative start> (<duration>)`
fn build_line(build: &Build, now: DateTime<Utc>) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("#{} ", build.name)),
        Span::styled(
            format!("[{}]", build.status.label()),
            Style::default()
                .fg(status_color(build.status))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} ({})",
            compact_ago(now, build.start_time),
            build_duration(build.duration_secs())
        )),
    ])
}

fn status_color(status: BuildStatus) -> Color {
    match status {
        BuildStatus::Succeeded => Color::Green,
        BuildStatus::Failed | BuildStatus::Errored => Color::Red,
        BuildStatus::Started | BuildStatus::Pending => Color::Yellow,
        BuildStatus::Aborted => Color::Magenta,
        BuildStatus::Unknown => Color::DarkGray,
    }
}

fn build_summary(build: Option<&Build>) -> String {
    build.map_or_else(
        || "none".to_string(),
        |b| format!("#{} ({})", b.name, b.status.label().to_lowercase()),
    )
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}

fn target_details(target: &Target) -> Vec<(String, String)> {
    vec![
        ("Target".into(), target.name.clone()),
        ("Team".into(), target.team.clone()),
        ("API".into(), target.api.clone()),
        (
            "Token".into(),
            if target.has_token() { "present" } else { "not set" }.into(),
        ),
        ("Insecure".into(), yes_no(target.insecure)),
    ]
}

fn targets_panel(state: &AppState) -> Panel {
    let view = &state.targets;
    let list = view.list();
    let details = if view.show_details() {
        list.selected().map(target_details).unwrap_or_default()
    } else {
        Vec::new()
    };
    Panel {
        heading: "Manage Targets".into(),
        search: search_line(list.search()),
        rows: rows(list, |t| Line::raw(format!("{} ({} - {})", t.name, t.team, t.api))),
        selected: list.selected_index(),
        scroll: list.scroll_offset(),
        placeholder: list.is_empty().then(|| {
            if list.search().query.is_empty() {
                ("No targets configured. Press 'a' to add one.".to_string(), Color::DarkGray)
            } else {
                ("No targets match the search".to_string(), Color::DarkGray)
            }
        }),
        details,
        status: status_lines(view.activity(), |label| vec![label.to_string()]),
    }
}

fn pipelines_panel(state: &AppState) -> Panel {
    let view = &state.pipelines;
    let list = view.list();
    let details = list
        .selected()
        .map(|p| {
            vec![
                ("Pipeline".into(), p.name.clone()),
                ("Team".into(), p.team_name.clone()),
                (
                    "Status".into(),
                    if p.paused { "paused" } else { "active" }.into(),
                ),
                ("Public".into(), yes_no(p.public)),
            ]
        })
        .unwrap_or_default();
    Panel {
        heading: format!("Pipelines - {}", view.target().unwrap_or_default()),
        search: search_line(list.search()),
        rows: rows(list, |p| {
            let style = if p.paused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(Span::styled(pipeline_label(p), style))
        }),
        selected: list.selected_index(),
        scroll: list.scroll_offset(),
        placeholder: placeholder(list, view.phase(), view.error().map(ToString::to_string), "pipelines"),
        details,
        status: status_lines(view.activity(), |name| vec![format!("Updating pipeline {name}...")]),
    }
}

fn job_details(job: &Job) -> Vec<(String, String)> {
    vec![
        ("Job".into(), job.name.clone()),
        ("Pipeline".into(), job.pipeline_name.clone()),
        ("Team".into(), job.team_name.clone()),
        ("Last build".into(), build_summary(job.finished_build.as_ref())),
        ("Next build".into(), build_summary(job.next_build.as_ref())),
    ]
}

fn jobs_panel(state: &AppState) -> Panel {
    let view = &state.jobs;
    let list = view.list();
    Panel {
        heading: format!("Jobs - {}", view.pipeline().unwrap_or_default()),
        search: search_line(list.search()),
        rows: rows(list, |j| {
            let mut spans = vec![Span::raw(j.name.clone())];
            if let Some(b) = &j.finished_build {
                spans.push(Span::styled(
                    format!(" [{}]", b.status.label()),
                    Style::default().fg(status_color(b.status)),
                ));
            }
            Line::from(spans)
        }),
        selected: list.selected_index(),
        scroll: list.scroll_offset(),
        placeholder: placeholder(list, view.phase(), view.error().map(ToString::to_string), "jobs"),
        details: list.selected().map(job_details).unwrap_or_default(),
        status: status_lines(view.activity(), |label| vec![format!("Triggering job: {label}")]),
    }
}

fn resource_details(resource: &Resource, now: DateTime<Utc>) -> Vec<(String, String)> {
    let mut details = vec![
        ("Resource".into(), resource.name.clone()),
        ("Type".into(), resource.kind.clone()),
        ("Pipeline".into(), resource.pipeline_name.clone()),
        ("Team".into(), resource.team_name.clone()),
        ("Last checked".into(), long_ago(now, resource.last_checked)),
    ];
    if let Some(version) = resource.version.as_ref().filter(|v| !v.is_empty()) {
        let text = version
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        details.push(("Version".into(), text));
    }
    for meta in resource.metadata.iter().flatten() {
        details.push((meta.name.clone(), meta.value.clone()));
    }
    details
}

fn resources_panel(state: &AppState, now: DateTime<Utc>) -> Panel {
    let view = &state.resources;
    let list = view.list();
    let target = view.target().unwrap_or_default().to_string();
    Panel {
        heading: format!("Resources - {}", view.pipeline().unwrap_or_default()),
        search: search_line(list.search()),
        rows: rows(list, |r| {
            Line::from(vec![
                Span::raw(r.name.clone()),
                Span::styled(format!(" ({})", r.kind), Style::default().fg(Color::DarkGray)),
            ])
        }),
        selected: list.selected_index(),
        scroll: list.scroll_offset(),
        placeholder: placeholder(list, view.phase(), view.error().map(ToString::to_string), "resources"),
        details: list
            .selected()
            .map(|r| resource_details(r, now))
            .unwrap_or_default(),
        status: status_lines(view.activity(), |label| {
            vec![
                format!("Checking resource: {label}"),
                format!("$ {}", manual_check_command(&target, label)),
            ]
        }),
    }
}

fn build_details(build: &Build) -> Vec<(String, String)> {
    let mut details = vec![
        ("Build".into(), format!("#{}", build.name)),
        (
            "Job".into(),
            format!("{}/{}", build.pipeline_name, build.job_name),
        ),
        ("Status".into(), build.status.label().to_string()),
        ("Team".into(), build.team_name.clone()),
    ];
    if let Some(start) = build.start_time {
        details.push(("Started".into(), timestamp(start)));
    }
    if let Some(end) = build.end_time {
        details.push(("Ended".into(), timestamp(end)));
    }
    details
}

fn builds_panel(state: &AppState, now: DateTime<Utc>) -> Panel {
    let view = &state.builds;
    let list = view.list();
    let frame = view.spinner_frame();
    Panel {
        heading: format!(
            "Builds - {}/{}",
            view.pipeline().unwrap_or_default(),
            view.job().unwrap_or_default()
        ),
        search: search_line(list.search()),
        rows: rows(list, |b| build_line(b, now)),
        selected: list.selected_index(),
        scroll: list.scroll_offset(),
        placeholder: placeholder(list, view.phase(), view.error().map(ToString::to_string), "builds"),
        details: list.selected().map(build_details).unwrap_or_default(),
        status: status_lines(view.activity(), |label| vec![spinner::with_frame(frame, label)]),
    }
}

/// The panel for the active view; `None` for views that are not lists.
pub fn panel(state: &AppState, now: DateTime<Utc>) -> Option<Panel> {
    match state.view() {
        ViewId::Targets => Some(targets_panel(state)),
        ViewId::Pipelines => Some(pipelines_panel(state)),
        ViewId::Jobs => Some(jobs_panel(state)),
        ViewId::Resources => Some(resources_panel(state, now)),
        ViewId::Builds => Some(builds_panel(state, now)),
        ViewId::MainMenu | ViewId::AddTarget | ViewId::Auth => None,
    }
}
