use crate::command::{Command, Navigate, Request};
use crate::concourse::{Client, OperationOutput};
use crate::error::{Error, Result};
use crate::input::Action;
use crate::model::Job;
use crate::views::banner::{self, Activity, BannerKind};
use crate::views::list::{any_field_contains, ListItem, ListState};
use crate::views::{LoadPhase, ViewId};

impl ListItem for Job {
    fn key(&self) -> &str {
        &self.name
    }

    fn matches(&self, needle: &str) -> bool {
        any_field_contains(
            &[
                self.name.as_str(),
                self.pipeline_name.as_str(),
                self.team_name.as_str(),
            ],
            needle,
        )
    }
}

/// Label used for the in-flight indicator, e.g. `deploy/build`.
pub fn job_label(pipeline: &str, job: &str) -> String {
    format!("{pipeline}/{job}")
}

#[derive(Default)]
pub struct JobsView {
    target: Option<String>,
    pipeline: Option<String>,
    client: Option<Client>,
    list: ListState<Job>,
    phase: LoadPhase,
    error: Option<Error>,
    activity: Activity,
}

impl JobsView {
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn pipeline(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    pub fn list(&self) -> &ListState<Job> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListState<Job> {
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

    fn is_current(&self, target: &str, pipeline: &str) -> bool {
        self.target.as_deref() == Some(target) && self.pipeline.as_deref() == Some(pipeline)
    }

    pub fn enter(&mut self, target: &str, pipeline: &str, client: Client) -> Vec<Command> {
        if !self.is_current(target, pipeline) {
            self.list.reset();
            self.activity.abandon();
            self.target = Some(target.to_string());
            self.pipeline = Some(pipeline.to_string());
        }
        self.error = None;
        self.phase = LoadPhase::Loading;
        let cmd = Command::remote(
            &client,
            Request::Jobs {
                pipeline: pipeline.to_string(),
                reload: false,
            },
        );
        self.client = Some(client);
        vec![cmd]
    }

    pub fn refresh(&mut self) -> Vec<Command> {
        let (Some(client), Some(pipeline)) = (&self.client, &self.pipeline) else {
            return Vec::new();
        };
        self.phase = LoadPhase::Loading;
        vec![Command::remote(
            client,
            Request::Jobs {
                pipeline: pipeline.clone(),
                reload: true,
            },
        )]
    }

    pub fn on_loaded(&mut self, target: &str, pipeline: &str, reload: bool, result: Result<Vec<Job>>) {
        if !self.is_current(target, pipeline) {
            tracing::debug!(target_name = target, pipeline, "ignoring jobs for inactive pipeline");
            return;
        }
        self.phase = LoadPhase::Ready;
        match result {
            Ok(jobs) => {
                self.error = None;
                self.list.replace(jobs, reload);
            }
            Err(e) => self.error = Some(e),
        }
    }

    pub fn handle(&mut self, action: Action) -> Vec<Command> {
        if matches!(action, Action::MoveUp | Action::MoveDown) && !self.activity.is_busy() {
            self.activity.dismiss();
        }
        if self.list.apply(action) {
            return Vec::new();
        }
        match action {
            Action::Select => self.trigger(),
            Action::OpenBuilds => match (&self.target, self.list.selected()) {
                (Some(target), Some(job)) => vec![Command::Navigate(
                    Navigate::to(ViewId::Builds)
                        .target(target)
                        .pipeline(&job.pipeline_name)
                        .job(&job.name),
                )],
                _ => Vec::new(),
            },
            Action::ClearMessage => {
                self.activity.dismiss();
                Vec::new()
            }
            Action::Refresh => self.refresh(),
            _ => Vec::new(),
        }
    }

    fn trigger(&mut self) -> Vec<Command> {
        let (Some(client), Some(job)) = (&self.client, self.list.selected()) else {
            return Vec::new();
        };
        let pipeline = if job.pipeline_name.is_empty() {
            self.pipeline.clone().unwrap_or_default()
        } else {
            job.pipeline_name.clone()
        };
        let request = Request::TriggerJob {
            job: job.name.clone(),
            pipeline: pipeline.clone(),
        };
        if !self.activity.begin(job_label(&pipeline, &job.name)) {
            return Vec::new();
        }
        tracing::info!(pipeline = %pipeline, job = %job.name, "triggering job");
        vec![Command::remote(client, request)]
    }

    /// A trigger result ends the operation; nothing is polled afterwards.
    pub fn on_triggered(
        &mut self,
        target: &str,
        pipeline: &str,
        job: &str,
        result: Result<OperationOutput>,
    ) -> Vec<Command> {
        if !self.is_current(target, pipeline) {
            tracing::debug!(target_name = target, pipeline, "dropping result for inactive pipeline");
            return Vec::new();
        }
        let (kind, text) = match result {
            Ok(out) if out.success => (BannerKind::Success, out.output),
            Ok(out) => (BannerKind::Rejected, format!("Job trigger failed: {}", out.output)),
            Err(e) => (BannerKind::Error, format!("Error: {e}")),
        };
        self.activity
            .finish(&job_label(pipeline, job), kind, text)
            .map(|id| banner::clear_later(ViewId::Jobs, id))
            .into_iter()
            .collect()
    }

    pub fn clear_banner(&mut self, id: u64) {
        self.activity.clear_banner(id);
    }
}
