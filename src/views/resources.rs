use crate::command::{Command, Request};
use crate::concourse::{Client, OperationOutput};
use crate::error::{Error, Result};
use crate::input::Action;
use crate::model::Resource;
use crate::views::banner::{self, Activity, BannerKind};
use crate::views::list::{any_field_contains, ListItem, ListState};
use crate::views::{LoadPhase, ViewId};

impl ListItem for Resource {
    fn key(&self) -> &str {
        &self.name
    }

    fn matches(&self, needle: &str) -> bool {
        any_field_contains(
            &[
                self.name.as_str(),
                self.kind.as_str(),
                self.pipeline_name.as_str(),
                self.team_name.as_str(),
            ],
            needle,
        )
    }
}

pub fn resource_label(pipeline: &str, resource: &str) -> String {
    format!("{pipeline}/{resource}")
}

#[derive(Default)]
pub struct ResourcesView {
    target: Option<String>,
    pipeline: Option<String>,
    client: Option<Client>,
    list: ListState<Resource>,
    phase: LoadPhase,
    error: Option<Error>,
    activity: Activity,
}

impl ResourcesView {
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn pipeline(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    pub fn list(&self) -> &ListState<Resource> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListState<Resource> {
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
            Request::Resources {
                pipeline: pipeline.to_string(),
                reload: false,
            },
        );
        self.client = Some(client);
        vec![cmd]
    }

    fn reload(&mut self, show_loading: bool) -> Vec<Command> {
        let (Some(client), Some(pipeline)) = (&self.client, &self.pipeline) else {
            return Vec::new();
        };
        let cmd = Command::remote(
            client,
            Request::Resources {
                pipeline: pipeline.clone(),
                reload: true,
            },
        );
        if show_loading {
            self.phase = LoadPhase::Loading;
        }
        vec![cmd]
    }

    pub fn refresh(&mut self) -> Vec<Command> {
        self.reload(true)
    }

    pub fn on_loaded(
        &mut self,
        target: &str,
        pipeline: &str,
        reload: bool,
        result: Result<Vec<Resource>>,
    ) {
        if !self.is_current(target, pipeline) {
            tracing::debug!(target_name = target, pipeline, "ignoring resources for inactive pipeline");
            return;
        }
        self.phase = LoadPhase::Ready;
        match result {
            Ok(resources) => {
                self.error = None;
                self.list.replace(resources, reload);
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
            Action::Select => self.check(),
            Action::ClearMessage => {
                self.activity.dismiss();
                Vec::new()
            }
            Action::Refresh => self.refresh(),
            _ => Vec::new(),
        }
    }

    fn check(&mut self) -> Vec<Command> {
        let (Some(client), Some(pipeline), Some(resource)) =
            (&self.client, &self.pipeline, self.list.selected())
        else {
            return Vec::new();
        };
        let request = Request::CheckResource {
            pipeline: pipeline.clone(),
            resource: resource.name.clone(),
        };
        if !self.activity.begin(resource_label(pipeline, &resource.name)) {
            return Vec::new();
        }
        tracing::info!(pipeline = %pipeline, resource = %resource.name, "checking resource");
        vec![Command::remote(client, request)]
    }

    /// A successful check does not carry structured data, so it is followed by
    /// a reload that keeps the cursor on the checked resource.
    pub fn on_checked(
        &mut self,
        target: &str,
        pipeline: &str,
        resource: &str,
        result: Result<OperationOutput>,
    ) -> Vec<Command> {
        if !self.is_current(target, pipeline) {
            tracing::debug!(target_name = target, pipeline, "dropping result for inactive pipeline");
            return Vec::new();
        }
        let label = resource_label(pipeline, resource);
        let (kind, text, reload) = match result {
            Ok(out) if out.success => (
                BannerKind::Success,
                format!("Check of {label} succeeded: {}", out.output),
                true,
            ),
            Ok(out) => (
                BannerKind::Rejected,
                format!("Check of {label} failed: {}", out.output),
                false,
            ),
            Err(e) => (BannerKind::Error, format!("Error: {e}"), false),
        };
        let Some(id) = self.activity.finish(&label, kind, text) else {
            return Vec::new();
        };
        let mut cmds = vec![banner::clear_later(ViewId::Resources, id)];
        if reload {
            cmds.extend(self.reload(false));
        }
        cmds
    }

    pub fn clear_banner(&mut self, id: u64) {
        self.activity.clear_banner(id);
    }
}
