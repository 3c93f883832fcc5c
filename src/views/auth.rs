use crate::command::{Command, LoginOrigin, LoginRequest, Navigate};
use crate::config::Target;
use crate::error::Result;
use crate::input::Action;
use crate::views::ViewId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Prompt,
    Authenticating,
    Failed(String),
    Succeeded,
}

/// Re-login prompt shown when a list load reports missing credentials.
#[derive(Debug, Default)]
pub struct AuthView {
    target: Option<Target>,
    phase: AuthPhase,
}

impl AuthView {
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn phase(&self) -> &AuthPhase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == AuthPhase::Authenticating
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = Some(target);
        self.phase = AuthPhase::Prompt;
    }

    pub fn handle(&mut self, action: Action) -> Vec<Command> {
        match action {
            Action::Confirm if !self.is_busy() => {
                let Some(target) = &self.target else {
                    return Vec::new();
                };
                let request = LoginRequest {
                    origin: LoginOrigin::Auth,
                    target: target.name.clone(),
                    api_url: target.api.clone(),
                    team: target.team.clone(),
                };
                self.phase = AuthPhase::Authenticating;
                vec![Command::Login(request)]
            }
            Action::Decline | Action::Back => vec![Command::Navigate(Navigate::to(ViewId::Targets))],
            _ => Vec::new(),
        }
    }

    /// Success always lands on Pipelines for the target, wherever the
    /// redirect came from.
    pub fn on_login_finished(&mut self, target: &str, result: Result<()>) -> Vec<Command> {
        if self.target.as_ref().map(|t| t.name.as_str()) != Some(target) {
            return Vec::new();
        }
        match result {
            Ok(()) => {
                self.phase = AuthPhase::Succeeded;
                vec![Command::Navigate(Navigate::to(ViewId::Pipelines).target(target))]
            }
            Err(e) => {
                self.phase = AuthPhase::Failed(e.to_string());
                Vec::new()
            }
        }
    }
}
