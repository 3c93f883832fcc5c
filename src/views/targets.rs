use crate::command::{Command, Navigate};
use crate::config::Target;
use crate::input::Action;
use crate::views::banner::{self, Activity, BannerKind};
use crate::views::list::{any_field_contains, ListItem, ListState};
use crate::views::ViewId;

impl ListItem for Target {
    fn key(&self) -> &str {
        &self.name
    }

    fn matches(&self, needle: &str) -> bool {
        any_field_contains(&[self.name.as_str(), self.api.as_str(), self.team.as_str()], needle)
    }
}

#[derive(Debug, Default)]
pub struct TargetsView {
    list: ListState<Target>,
    show_details: bool,
    activity: Activity,
}

impl TargetsView {
    pub fn list(&self) -> &ListState<Target> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListState<Target> {
        &mut self.list
    }

    pub fn show_details(&self) -> bool {
        self.show_details
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Replaces the list with what the store holds now.
    pub fn load(&mut self, targets: Vec<Target>, keep_selection: bool) {
        self.list.replace(targets, keep_selection);
    }

    pub fn handle(&mut self, action: Action) -> Vec<Command> {
        if self.list.apply(action) {
            return Vec::new();
        }
        match action {
            Action::Select => self
                .list
                .selected()
                .map(|t| Command::Navigate(Navigate::to(ViewId::Pipelines).target(&t.name)))
                .into_iter()
                .collect(),
            Action::AddTarget => vec![Command::Navigate(Navigate::to(ViewId::AddTarget))],
            Action::DeleteTarget => self
                .list
                .selected()
                .map(|t| Command::DeleteTarget(t.name.clone()))
                .into_iter()
                .collect(),
            Action::ToggleDetails => {
                self.show_details = !self.show_details;
                Vec::new()
            }
            Action::Refresh => vec![Command::ReloadTargets],
            Action::ClearMessage => {
                self.activity.dismiss();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Applies the outcome of a delete along with the store's new contents.
    pub fn on_deleted(
        &mut self,
        name: &str,
        result: Result<(), String>,
        targets: Vec<Target>,
    ) -> Vec<Command> {
        let id = match result {
            Ok(()) => {
                self.list.replace(targets, true);
                self.activity
                    .show(BannerKind::Success, format!("Deleted target '{name}'"))
            }
            Err(e) => self
                .activity
                .show(BannerKind::Error, format!("Failed to delete target '{name}': {e}")),
        };
        vec![banner::clear_later(ViewId::Targets, id)]
    }

    pub fn show_error(&mut self, text: impl Into<String>) -> Vec<Command> {
        let id = self.activity.show(BannerKind::Error, text);
        vec![banner::clear_later(ViewId::Targets, id)]
    }

    pub fn clear_banner(&mut self, id: u64) {
        self.activity.clear_banner(id);
    }
}
