//! Top-level router: owns every view, the target store and the active target.
//!
//! Events come in through [`AppState::handle_event`]; the returned commands
//! are the background and foreground work the event loop still has to start.
//! Navigation, target deletion and store reloads are settled here before
//! anything is returned.

use crate::command::{Command, LoginOrigin, Navigate, TimerEvent};
use crate::config::{Target, TargetStore};
use crate::concourse::Connector;
use crate::error::Result;
use crate::events::AppEvent;
use crate::input::{self, Action, InputContext};
use crate::views::add_target::AddTargetView;
use crate::views::auth::AuthView;
use crate::views::builds::BuildsView;
use crate::views::jobs::JobsView;
use crate::views::main_menu::MainMenuView;
use crate::views::pipelines::PipelinesView;
use crate::views::resources::ResourcesView;
use crate::views::targets::TargetsView;
use crate::views::{LoadPhase, ViewId};
use crossterm::event::KeyEvent;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long the global error toast stays visible.
pub const ERROR_TTL: Duration = Duration::from_secs(10);
pub const SPINNER_FRAME_COUNT: usize = 10;

pub struct AppState {
    view: ViewId,
    pub main_menu: MainMenuView,
    pub targets: TargetsView,
    pub pipelines: PipelinesView,
    pub jobs: JobsView,
    pub resources: ResourcesView,
    pub builds: BuildsView,
    pub add_target: AddTargetView,
    pub auth: AuthView,

    store: Box<dyn TargetStore>,
    connector: Arc<dyn Connector>,
    current_target: Option<String>,

    // Transient UI
    error: Option<(String, Instant)>,
    spinner_frame: usize,
    should_quit: bool,
}

impl AppState {
    pub fn new(store: Box<dyn TargetStore>, connector: Arc<dyn Connector>) -> Self {
        let mut targets = TargetsView::default();
        targets.load(store.list(), false);
        Self {
            view: ViewId::MainMenu,
            main_menu: MainMenuView::default(),
            targets,
            pipelines: PipelinesView::default(),
            jobs: JobsView::default(),
            resources: ResourcesView::default(),
            builds: BuildsView::default(),
            add_target: AddTargetView::default(),
            auth: AuthView::default(),
            store,
            connector,
            current_target: None,
            error: None,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn current_target(&self) -> Option<&str> {
        self.current_target.as_deref()
    }

    pub fn store(&self) -> &dyn TargetStore {
        self.store.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        tracing::warn!(%msg, "showing error");
        self.error = Some((msg, Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed() >= ERROR_TTL {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }

    /// Whether the active view is waiting on a list load.
    pub fn is_loading(&self) -> bool {
        let phase = match self.view {
            ViewId::Pipelines => self.pipelines.phase(),
            ViewId::Jobs => self.jobs.phase(),
            ViewId::Resources => self.resources.phase(),
            ViewId::Builds => self.builds.phase(),
            _ => LoadPhase::Idle,
        };
        phase == LoadPhase::Loading
    }

    fn searching(&self) -> bool {
        match self.view {
            ViewId::Targets => self.targets.list().search().active,
            ViewId::Pipelines => self.pipelines.list().search().active,
            ViewId::Jobs => self.jobs.list().search().active,
            ViewId::Resources => self.resources.list().search().active,
            ViewId::Builds => self.builds.list().search().active,
            ViewId::MainMenu | ViewId::AddTarget | ViewId::Auth => false,
        }
    }

    pub fn input_context(&self) -> InputContext {
        InputContext {
            view: self.view,
            searching: self.searching(),
            form: self.add_target.mode(),
            auth_busy: self.auth.is_busy(),
        }
    }

    /// Sizes page movement of the active list to what the renderer can show.
    pub fn set_viewport(&mut self, rows: usize) {
        match self.view {
            ViewId::Targets => self.targets.list_mut().set_viewport(rows),
            ViewId::Pipelines => self.pipelines.list_mut().set_viewport(rows),
            ViewId::Jobs => self.jobs.list_mut().set_viewport(rows),
            ViewId::Resources => self.resources.list_mut().set_viewport(rows),
            ViewId::Builds => self.builds.list_mut().set_viewport(rows),
            ViewId::MainMenu | ViewId::AddTarget | ViewId::Auth => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let action = input::map_key(key, &self.input_context());
        self.apply(action)
    }

    /// Routes one action to the active view and settles the resulting
    /// router-level commands.
    pub fn apply(&mut self, action: Action) -> Vec<Command> {
        let cmds = match action {
            Action::None => return Vec::new(),
            Action::Quit => vec![Command::Quit],
            Action::Back if !matches!(self.view, ViewId::AddTarget | ViewId::Auth) => {
                self.back();
                Vec::new()
            }
            _ => {
                if action == Action::ClearMessage {
                    self.clear_error();
                }
                match self.view {
                    ViewId::MainMenu => self.main_menu.handle(action),
                    ViewId::Targets => self.targets.handle(action),
                    ViewId::Pipelines => self.pipelines.handle(action),
                    ViewId::Jobs => self.jobs.handle(action),
                    ViewId::Resources => self.resources.handle(action),
                    ViewId::Builds => self.builds.handle(action),
                    ViewId::AddTarget => self.add_target.handle(action),
                    ViewId::Auth => self.auth.handle(action),
                }
            }
        };
        self.process(cmds)
    }

    /// Switches to the parent view. The parent keeps its list and cursor.
    fn back(&mut self) {
        if let Some(parent) = self.view.parent() {
            tracing::debug!(from = ?self.view, to = ?parent, "navigating back");
            self.view = parent;
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Command> {
        let cmds = match event {
            AppEvent::Key(key) => return self.handle_key(key),
            AppEvent::Tick => {
                self.prune_error();
                if self.is_loading() {
                    self.advance_spinner();
                }
                Vec::new()
            }
            AppEvent::PipelinesLoaded {
                target,
                reload,
                result,
            } => {
                let redirect = self.auth_redirect(ViewId::Pipelines, &target, &result);
                self.pipelines.on_loaded(&target, reload, result);
                redirect
            }
            AppEvent::JobsLoaded {
                target,
                pipeline,
                reload,
                result,
            } => {
                let redirect = self.auth_redirect(ViewId::Jobs, &target, &result);
                self.jobs.on_loaded(&target, &pipeline, reload, result);
                redirect
            }
            AppEvent::ResourcesLoaded {
                target,
                pipeline,
                reload,
                result,
            } => {
                let redirect = self.auth_redirect(ViewId::Resources, &target, &result);
                self.resources.on_loaded(&target, &pipeline, reload, result);
                redirect
            }
            AppEvent::BuildsLoaded {
                target,
                pipeline,
                job,
                reload,
                result,
            } => {
                let redirect = self.auth_redirect(ViewId::Builds, &target, &result);
                self.builds.on_loaded(&target, &pipeline, &job, reload, result);
                redirect
            }
            AppEvent::JobTriggered {
                target,
                pipeline,
                job,
                result,
            } => self.jobs.on_triggered(&target, &pipeline, &job, result),
            AppEvent::BuildRerun {
                target,
                pipeline,
                job,
                build_name,
                result,
            } => self
                .builds
                .on_rerun(&target, &pipeline, &job, &build_name, result),
            AppEvent::ResourceChecked {
                target,
                pipeline,
                resource,
                result,
            } => self
                .resources
                .on_checked(&target, &pipeline, &resource, result),
            AppEvent::PipelinePauseToggled {
                target,
                pipeline,
                paused,
                result,
            } => self
                .pipelines
                .on_pause_toggled(&target, &pipeline, paused, result),
            AppEvent::StatusProbed {
                target,
                purpose,
                result,
            } => self.add_target.on_status(&target, purpose, result),
            AppEvent::LoginFinished {
                origin,
                target,
                result,
            } => self.on_login_finished(origin, &target, result),
            AppEvent::ClipboardResult(result) => {
                if self.view == ViewId::AddTarget {
                    self.add_target.on_clipboard(result);
                } else if let Err(e) = result {
                    self.set_error(format!("Copy failed: {e}"));
                }
                Vec::new()
            }
            AppEvent::Timer(timer) => self.on_timer(timer),
            AppEvent::Error(msg) => {
                self.set_error(msg);
                Vec::new()
            }
        };
        self.process(cmds)
    }

    /// A load that failed for lack of credentials sends the user to the
    /// login prompt instead of showing the raw error, as long as the view
    /// that asked is still on screen.
    fn auth_redirect<T>(&self, origin: ViewId, target: &str, result: &Result<T>) -> Vec<Command> {
        let Err(e) = result else {
            return Vec::new();
        };
        if !e.requires_auth() || self.view != origin || self.current_target() != Some(target) {
            return Vec::new();
        }
        tracing::info!(target_name = target, error = %e, "load requires authentication");
        vec![Command::Navigate(Navigate::to(ViewId::Auth).target(target))]
    }

    fn on_login_finished(&mut self, origin: LoginOrigin, target: &str, result: Result<()>) -> Vec<Command> {
        // `fly login` writes the token to the same file.
        if let Err(e) = self.store.reload() {
            tracing::warn!(error = %e, "failed to reload targets after login");
        }
        match origin {
            LoginOrigin::AddTarget => {
                if result.is_ok() {
                    self.ensure_saved(target);
                }
                self.add_target.on_login_finished(target, result)
            }
            LoginOrigin::Auth => self.auth.on_login_finished(target, result),
        }
    }

    /// Adds the form's entry when the login succeeded without writing it.
    fn ensure_saved(&mut self, target: &str) {
        if self.store.get(target).is_some() {
            return;
        }
        let (name, url, team) = self.add_target.entry();
        if name != target {
            return;
        }
        let (name, url, team) = (name.to_string(), url.to_string(), team.to_string());
        if let Err(e) = self.store.add(&name, &url, &team) {
            tracing::warn!(target_name = %name, error = %e, "failed to save new target");
            self.set_error(e.to_string());
        }
    }

    fn on_timer(&mut self, timer: TimerEvent) -> Vec<Command> {
        match timer {
            TimerEvent::ClearBanner { view, id } => {
                match view {
                    ViewId::Targets => self.targets.clear_banner(id),
                    ViewId::Pipelines => self.pipelines.clear_banner(id),
                    ViewId::Jobs => self.jobs.clear_banner(id),
                    ViewId::Resources => self.resources.clear_banner(id),
                    ViewId::Builds => self.builds.clear_banner(id),
                    ViewId::MainMenu | ViewId::AddTarget | ViewId::Auth => {}
                }
                Vec::new()
            }
            TimerEvent::RerunTick { seq } => self.builds.on_tick(seq),
            TimerEvent::ReloadBuilds {
                target,
                pipeline,
                job,
            } => self.builds.on_reload_due(&target, &pipeline, &job),
            TimerEvent::ReturnToTargets => {
                if self.view == ViewId::AddTarget && self.add_target.awaiting_return() {
                    vec![Command::Navigate(Navigate::to(ViewId::Targets))]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Executes router-level commands, including any they produce in turn,
    /// and returns the rest in order.
    fn process(&mut self, cmds: Vec<Command>) -> Vec<Command> {
        let mut queue: VecDeque<Command> = cmds.into();
        let mut out = Vec::new();
        while let Some(cmd) = queue.pop_front() {
            match cmd {
                Command::Navigate(nav) => queue.extend(self.navigate(nav)),
                Command::DeleteTarget(name) => queue.extend(self.delete_target(&name)),
                Command::ReloadTargets => self.reload_targets(),
                Command::Quit => {
                    tracing::info!("quit requested");
                    self.should_quit = true;
                }
                other => out.push(other),
            }
        }
        out
    }

    fn reload_targets(&mut self) {
        if let Err(e) = self.store.reload() {
            tracing::warn!(error = %e, "failed to reload targets");
            self.set_error(e.to_string());
        }
        self.targets.load(self.store.list(), true);
    }

    fn delete_target(&mut self, name: &str) -> Vec<Command> {
        let result = self.store.remove(name).map_err(|e| e.to_string());
        if result.is_ok() {
            tracing::info!(target_name = name, "deleted target");
            if self.current_target() == Some(name) {
                self.current_target = None;
            }
        }
        self.targets.on_deleted(name, result, self.store.list())
    }

    /// Resolves the target a navigation refers to, falling back to the
    /// active one. Unknown names bounce back to the target list; the error
    /// side carries that view's banner timer.
    fn resolve_target(&mut self, requested: Option<String>) -> std::result::Result<Target, Vec<Command>> {
        let Some(name) = requested.or_else(|| self.current_target.clone()) else {
            return Err(Vec::new());
        };
        self.store.get(&name).ok_or_else(|| {
            tracing::warn!(target_name = %name, "navigation to unknown target");
            self.view = ViewId::Targets;
            self.targets.load(self.store.list(), true);
            self.targets.show_error(format!("target '{name}' does not exist"))
        })
    }

    fn navigate(&mut self, nav: Navigate) -> Vec<Command> {
        tracing::debug!(from = ?self.view, to = ?nav.view, "navigating");
        match nav.view {
            ViewId::MainMenu | ViewId::Targets => {
                if nav.view == ViewId::Targets {
                    self.targets.load(self.store.list(), true);
                }
                self.view = nav.view;
                Vec::new()
            }
            ViewId::AddTarget => {
                self.add_target.reset();
                self.view = ViewId::AddTarget;
                Vec::new()
            }
            ViewId::Auth => {
                let name = nav.target.or_else(|| self.current_target.clone()).unwrap_or_default();
                let target = self.store.get(&name).unwrap_or_else(|| Target::new(name, "", ""));
                self.auth.set_target(target);
                self.view = ViewId::Auth;
                Vec::new()
            }
            ViewId::Pipelines => match self.resolve_target(nav.target) {
                Ok(target) => {
                    let client = self.connector.connect(&target.name);
                    self.current_target = Some(target.name.clone());
                    self.view = ViewId::Pipelines;
                    self.pipelines.enter(&target.name, client)
                }
                Err(cmds) => cmds,
            },
            ViewId::Jobs | ViewId::Resources | ViewId::Builds => self.navigate_within_target(nav),
        }
    }

    fn navigate_within_target(&mut self, nav: Navigate) -> Vec<Command> {
        let Some(pipeline) = nav.pipeline else {
            return Vec::new();
        };
        let target = match self.resolve_target(nav.target) {
            Ok(target) => target,
            Err(cmds) => return cmds,
        };
        let client = self.connector.connect(&target.name);
        self.current_target = Some(target.name.clone());
        match (nav.view, nav.job) {
            (ViewId::Jobs, _) => {
                self.view = ViewId::Jobs;
                self.jobs.enter(&target.name, &pipeline, client)
            }
            (ViewId::Resources, _) => {
                self.view = ViewId::Resources;
                self.resources.enter(&target.name, &pipeline, client)
            }
            (ViewId::Builds, Some(job)) => {
                self.view = ViewId::Builds;
                self.builds.enter(&target.name, &pipeline, &job, client)
            }
            _ => Vec::new(),
        }
    }
}
