use crate::command::{Command, Request, TimerEvent};
use crate::concourse::{Client, OperationOutput};
use crate::error::{Error, Result};
use crate::input::Action;
use crate::model::Build;
use crate::views::banner::{self, Activity, BannerKind};
use crate::views::list::{any_field_contains, ListItem, ListState};
use crate::views::{LoadPhase, ViewId};
use std::time::Duration;

/// Spinner cadence while a rerun is in flight.
pub const RERUN_TICK: Duration = Duration::from_millis(100);
/// Grace period before refetching, so the new sub-build exists remotely.
pub const RELOAD_AFTER_RERUN: Duration = Duration::from_secs(2);

impl ListItem for Build {
    fn key(&self) -> &str {
        &self.name
    }

    fn matches(&self, needle: &str) -> bool {
        any_field_contains(
            &[
                self.name.as_str(),
                self.status.label(),
                self.job_name.as_str(),
                self.team_name.as_str(),
            ],
            needle,
        )
    }
}

#[derive(Default)]
pub struct BuildsView {
    target: Option<String>,
    pipeline: Option<String>,
    job: Option<String>,
    client: Option<Client>,
    list: ListState<Build>,
    phase: LoadPhase,
    error: Option<Error>,
    activity: Activity,
    spinner_frame: usize,
    /// Bumped per rerun; ticks from an earlier rerun's chain carry an older
    /// value and stop.
    rerun_seq: u64,
}

impl BuildsView {
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn pipeline(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    pub fn job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    pub fn list(&self) -> &ListState<Build> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListState<Build> {
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

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn is_rerunning(&self) -> bool {
        self.activity.is_busy()
    }

    fn is_current(&self, target: &str, pipeline: &str, job: &str) -> bool {
        self.target.as_deref() == Some(target)
            && self.pipeline.as_deref() == Some(pipeline)
            && self.job.as_deref() == Some(job)
    }

    fn load_request(&self, reload: bool) -> Option<Command> {
        match (&self.client, &self.pipeline, &self.job) {
            (Some(client), Some(pipeline), Some(job)) => Some(Command::remote(
                client,
                Request::Builds {
                    pipeline: pipeline.clone(),
                    job: job.clone(),
                    reload,
                },
            )),
            _ => None,
        }
    }

    pub fn enter(&mut self, target: &str, pipeline: &str, job: &str, client: Client) -> Vec<Command> {
        if !self.is_current(target, pipeline, job) {
            self.list.reset();
            self.activity.abandon();
            self.target = Some(target.to_string());
            self.pipeline = Some(pipeline.to_string());
            self.job = Some(job.to_string());
        }
        self.client = Some(client);
        self.error = None;
        self.phase = LoadPhase::Loading;
        self.load_request(false).into_iter().collect()
    }

    pub fn refresh(&mut self) -> Vec<Command> {
        let Some(cmd) = self.load_request(true) else {
            return Vec::new();
        };
        self.phase = LoadPhase::Loading;
        vec![cmd]
    }

    pub fn on_loaded(
        &mut self,
        target: &str,
        pipeline: &str,
        job: &str,
        reload: bool,
        result: Result<Vec<Build>>,
    ) {
        if !self.is_current(target, pipeline, job) {
            tracing::debug!(target_name = target, pipeline, job, "ignoring builds for inactive job");
            return;
        }
        self.phase = LoadPhase::Ready;
        match result {
            Ok(builds) => {
                self.error = None;
                self.list.replace(builds, reload);
            }
            Err(e) => self.error = Some(e),
        }
    }

    pub fn handle(&mut self, action: Action) -> Vec<Command> {
        if self.list.apply(action) {
            return Vec::new();
        }
        match action {
            Action::Select => self.rerun(),
            Action::ClearMessage => {
                self.activity.dismiss();
                Vec::new()
            }
            Action::Refresh => self.refresh(),
            _ => Vec::new(),
        }
    }

    fn rerun(&mut self) -> Vec<Command> {
        if self.activity.is_busy() {
            return Vec::new();
        }
        let (Some(client), Some(pipeline), Some(job), Some(build)) =
            (&self.client, &self.pipeline, &self.job, self.list.selected())
        else {
            return Vec::new();
        };
        let number = match build.rerun_number() {
            Ok(n) => n,
            Err(e) => {
                let id = self.activity.show(BannerKind::Error, format!("Error: {e}"));
                return vec![banner::clear_later(ViewId::Builds, id)];
            }
        };
        let request = Request::RerunBuild {
            pipeline: pipeline.clone(),
            job: job.clone(),
            build_name: build.name.clone(),
            build: number,
        };
        let cmd = Command::remote(client, request);
        self.activity
            .begin(format!("Rerunning build {pipeline}/{job} #{number}..."));
        tracing::info!(pipeline = %pipeline, job = %job, build = number, "rerunning build");
        self.rerun_seq += 1;
        vec![cmd, self.next_tick()]
    }

    fn next_tick(&self) -> Command {
        Command::Later {
            after: RERUN_TICK,
            event: TimerEvent::RerunTick { seq: self.rerun_seq },
        }
    }

    /// Advances the spinner and keeps ticking only while the rerun that
    /// started this chain is in flight.
    pub fn on_tick(&mut self, seq: u64) -> Vec<Command> {
        if !self.activity.is_busy() || seq != self.rerun_seq {
            return Vec::new();
        }
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        vec![self.next_tick()]
    }

    pub fn on_rerun(
        &mut self,
        target: &str,
        pipeline: &str,
        job: &str,
        build_name: &str,
        result: Result<OperationOutput>,
    ) -> Vec<Command> {
        if !self.is_current(target, pipeline, job) {
            // The slot was abandoned when the view switched jobs.
            tracing::debug!(target_name = target, pipeline, job, "dropping rerun result for inactive job");
            return Vec::new();
        }
        let Some(label) = self.activity.in_flight().map(str::to_string) else {
            return Vec::new();
        };
        let (kind, text, follow_up) = match result {
            Ok(out) if out.success => (
                BannerKind::Success,
                format!("Successfully reran build {pipeline}/{job} #{build_name}: {}", out.output),
                true,
            ),
            Ok(out) => (
                BannerKind::Rejected,
                format!("Failed to rerun build {pipeline}/{job} #{build_name}: {}", out.output),
                false,
            ),
            Err(e) => (BannerKind::Error, format!("Error: {e}"), false),
        };
        let Some(id) = self.activity.finish(&label, kind, text) else {
            return Vec::new();
        };
        let mut cmds = vec![banner::clear_later(ViewId::Builds, id)];
        if follow_up {
            cmds.push(Command::Later {
                after: RELOAD_AFTER_RERUN,
                event: TimerEvent::ReloadBuilds {
                    target: target.to_string(),
                    pipeline: pipeline.to_string(),
                    job: job.to_string(),
                },
            });
        }
        cmds
    }

    /// Delayed follow-up of a successful rerun. Ignored once the user has
    /// moved on to another job.
    pub fn on_reload_due(&mut self, target: &str, pipeline: &str, job: &str) -> Vec<Command> {
        if !self.is_current(target, pipeline, job) {
            return Vec::new();
        }
        self.load_request(true).into_iter().collect()
    }

    pub fn clear_banner(&mut self, id: u64) {
        self.activity.clear_banner(id);
    }
}
