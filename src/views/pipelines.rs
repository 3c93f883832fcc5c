use crate::command::{Command, Navigate, Request};
use crate::concourse::{Client, OperationOutput};
use crate::error::{Error, Result};
use crate::input::Action;
use crate::model::Pipeline;
use crate::views::banner::{self, Activity, BannerKind};
use crate::views::list::{any_field_contains, ListItem, ListState};
use crate::views::{LoadPhase, ViewId};

impl ListItem for Pipeline {
    fn key(&self) -> &str {
        &self.name
    }

    fn matches(&self, needle: &str) -> bool {
        any_field_contains(&[self.name.as_str(), self.team_name.as_str()], needle)
    }
}

#[derive(Default)]
pub struct PipelinesView {
    target: Option<String>,
    client: Option<Client>,
    list: ListState<Pipeline>,
    phase: LoadPhase,
    error: Option<Error>,
    activity: Activity,
}

impl PipelinesView {
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn list(&self) -> &ListState<Pipeline> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListState<Pipeline> {
        &mut self.list
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Attaches the client for `target` and starts the initial load.
    pub fn enter(&mut self, target: &str, client: Client) -> Vec<Command> {
        if self.target.as_deref() != Some(target) {
            self.list.reset();
            self.activity.abandon();
            self.target = Some(target.to_string());
        }
        self.error = None;
        self.phase = LoadPhase::Loading;
        let cmd = Command::remote(&client, Request::Pipelines { reload: false });
        self.client = Some(client);
        vec![cmd]
    }

    pub fn refresh(&mut self) -> Vec<Command> {
        let Some(client) = &self.client else {
            return Vec::new();
        };
        self.phase = LoadPhase::Loading;
        vec![Command::remote(client, Request::Pipelines { reload: true })]
    }

    pub fn on_loaded(&mut self, target: &str, reload: bool, result: Result<Vec<Pipeline>>) {
        if self.target.as_deref() != Some(target) {
            tracing::debug!(target_name = target, "ignoring pipelines for inactive target");
            return;
        }
        self.phase = LoadPhase::Ready;
        match result {
            Ok(pipelines) => {
                self.error = None;
                self.list.replace(pipelines, reload);
            }
            Err(e) => self.error = Some(e),
        }
    }

    pub fn handle(&mut self, action: Action) -> Vec<Command> {
        if self.list.apply(action) {
            return Vec::new();
        }
        match action {
            Action::OpenJobs => self.open(ViewId::Jobs),
            Action::OpenResources => self.open(ViewId::Resources),
            Action::TogglePause => self.toggle_pause(),
            Action::Refresh => self.refresh(),
            Action::ClearMessage => {
                self.activity.dismiss();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn open(&self, view: ViewId) -> Vec<Command> {
        match (&self.target, self.list.selected()) {
            (Some(target), Some(pipeline)) => vec![Command::Navigate(
                Navigate::to(view).target(target).pipeline(&pipeline.name),
            )],
            _ => Vec::new(),
        }
    }

    fn toggle_pause(&mut self) -> Vec<Command> {
        let (Some(client), Some(pipeline)) = (&self.client, self.list.selected()) else {
            return Vec::new();
        };
        let request = Request::SetPaused {
            pipeline: pipeline.name.clone(),
            paused: !pipeline.paused,
        };
        if !self.activity.begin(pipeline.name.clone()) {
            return Vec::new();
        }
        vec![Command::remote(client, request)]
    }

    /// The flag is never flipped locally; success triggers a refetch instead.
    pub fn on_pause_toggled(
        &mut self,
        target: &str,
        pipeline: &str,
        paused: bool,
        result: Result<OperationOutput>,
    ) -> Vec<Command> {
        if self.target.as_deref() != Some(target) {
            return Vec::new();
        }
        let (verb, done) = if paused {
            ("pause", "paused")
        } else {
            ("unpause", "unpaused")
        };
        let (kind, text, refetch) = match result {
            Ok(out) if out.success => (BannerKind::Success, format!("Pipeline {pipeline} {done}"), true),
            Ok(out) => (
                BannerKind::Rejected,
                format!("Failed to {verb} pipeline {pipeline}: {}", out.output),
                false,
            ),
            Err(e) => (BannerKind::Error, format!("Error: {e}"), false),
        };
        let Some(id) = self.activity.finish(pipeline, kind, text) else {
            return Vec::new();
        };
        let mut cmds = vec![banner::clear_later(ViewId::Pipelines, id)];
        if refetch {
            if let Some(client) = &self.client {
                cmds.push(Command::remote(client, Request::Pipelines { reload: true }));
            }
        }
        cmds
    }

    pub fn clear_banner(&mut self, id: u64) {
        self.activity.clear_banner(id);
    }
}
