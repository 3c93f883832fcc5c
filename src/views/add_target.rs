//! Multi-field form that registers a new target through `fly login`.
//!
//! `Editing → Submitting → Result`. Submission first probes `fly status` for
//! the name; only when that fails does it hand the terminal to an
//! interactive login.

use crate::command::{Command, LoginOrigin, LoginRequest, Navigate, ProbePurpose, Request, TimerEvent};
use crate::concourse::executor::manual_login_command;
use crate::concourse::outcome::is_missing_target;
use crate::concourse::OperationOutput;
use crate::error::Result;
use crate::input::{Action, FormMode};
use crate::views::ViewId;
use std::time::Duration;

pub const FIELD_LABELS: [&str; 3] = ["Name", "URL", "Team"];

/// Delay before a successful form returns to the target list.
pub const RETURN_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Success(String),
    /// The URL or team is wrong; the user has to fix it by hand.
    HardFailure { message: String, command: String },
    /// A browser login is probably still running; retry and copy are offered.
    PendingAuth { message: String, command: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Editing,
    Submitting,
    Result(FormOutcome),
}

#[derive(Debug, Default)]
pub struct AddTargetView {
    values: [String; 3],
    focused: usize,
    phase: FormPhase,
    clipboard_note: Option<String>,
}

impl AddTargetView {
    pub fn values(&self) -> &[String; 3] {
        &self.values
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn clipboard_note(&self) -> Option<&str> {
        self.clipboard_note.as_deref()
    }

    pub fn mode(&self) -> FormMode {
        match &self.phase {
            FormPhase::Editing => FormMode::Editing,
            FormPhase::Submitting => FormMode::Busy,
            FormPhase::Result(outcome) => FormMode::Result {
                pending_auth: matches!(outcome, FormOutcome::PendingAuth { .. }),
            },
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Trimmed name, URL and team as they would be saved.
    pub fn entry(&self) -> (&str, &str, &str) {
        (self.name(), self.url(), self.team())
    }

    fn name(&self) -> &str {
        self.values[0].trim()
    }

    fn url(&self) -> &str {
        self.values[1].trim()
    }

    fn team(&self) -> &str {
        self.values[2].trim()
    }

    /// Every field is required; nothing is sent while one is blank.
    pub fn can_submit(&self) -> bool {
        self.values.iter().all(|v| !v.trim().is_empty())
    }

    pub fn manual_command(&self) -> String {
        manual_login_command(self.name(), self.url(), self.team())
    }

    pub fn handle(&mut self, action: Action) -> Vec<Command> {
        match (&self.phase, action) {
            (_, Action::Back) => vec![Command::Navigate(Navigate::to(ViewId::Targets))],
            (FormPhase::Editing, Action::NextField) => {
                self.focused = (self.focused + 1) % FIELD_LABELS.len();
                Vec::new()
            }
            (FormPhase::Editing, Action::PrevField) => {
                self.focused = (self.focused + FIELD_LABELS.len() - 1) % FIELD_LABELS.len();
                Vec::new()
            }
            (FormPhase::Editing, Action::FormInput(c)) => {
                self.values[self.focused].push(c);
                Vec::new()
            }
            (FormPhase::Editing, Action::FormBackspace) => {
                self.values[self.focused].pop();
                Vec::new()
            }
            (FormPhase::Editing, Action::FormClear) => {
                self.values[self.focused].clear();
                Vec::new()
            }
            (FormPhase::Editing, Action::Submit) => self.submit(),
            (FormPhase::Result(FormOutcome::PendingAuth { .. }), Action::Retry) => self.retry(),
            (FormPhase::Result(FormOutcome::PendingAuth { command, .. }), Action::CopyCommand) => {
                vec![Command::Copy(command.clone())]
            }
            _ => Vec::new(),
        }
    }

    fn submit(&mut self) -> Vec<Command> {
        if !self.can_submit() {
            return Vec::new();
        }
        self.phase = FormPhase::Submitting;
        tracing::info!(target_name = self.name(), url = self.url(), "submitting new target");
        vec![Command::RemoteFor {
            target: self.name().to_string(),
            request: Request::Status {
                purpose: ProbePurpose::Submit,
            },
        }]
    }

    fn retry(&mut self) -> Vec<Command> {
        self.phase = FormPhase::Submitting;
        self.clipboard_note = None;
        vec![Command::RemoteFor {
            target: self.name().to_string(),
            request: Request::Status {
                purpose: ProbePurpose::Retry,
            },
        }]
    }

    fn succeed(&mut self, message: String) -> Vec<Command> {
        self.phase = FormPhase::Result(FormOutcome::Success(message));
        vec![
            Command::ReloadTargets,
            Command::Later {
                after: RETURN_DELAY,
                event: TimerEvent::ReturnToTargets,
            },
        ]
    }

    pub fn on_status(
        &mut self,
        target: &str,
        purpose: ProbePurpose,
        result: Result<OperationOutput>,
    ) -> Vec<Command> {
        if self.phase != FormPhase::Submitting || target != self.name() {
            tracing::debug!(target_name = target, "ignoring status probe for stale form");
            return Vec::new();
        }
        let name = self.name().to_string();
        match (purpose, result) {
            (ProbePurpose::Submit, Ok(out)) if out.success => {
                self.succeed(format!("Target '{name}' already exists and is authenticated"))
            }
            (ProbePurpose::Submit, _) => vec![Command::Login(LoginRequest {
                origin: LoginOrigin::AddTarget,
                target: name,
                api_url: self.url().to_string(),
                team: self.team().to_string(),
            })],
            (ProbePurpose::Retry, Ok(out)) if out.success => {
                self.succeed(format!("Target '{name}' is now authenticated and ready to use!"))
            }
            (ProbePurpose::Retry, Ok(out)) if is_missing_target(&out.output) => {
                self.phase = FormPhase::Result(FormOutcome::HardFailure {
                    message: format!(
                        "Target '{name}' not found. Run the login command in a separate terminal."
                    ),
                    command: self.manual_command(),
                });
                Vec::new()
            }
            (ProbePurpose::Retry, Ok(_)) => {
                self.phase = FormPhase::Result(FormOutcome::PendingAuth {
                    message: format!(
                        "Target '{name}' exists but authentication is still pending. \
                         Finish the browser login, then press 'r' to retry."
                    ),
                    command: self.manual_command(),
                });
                Vec::new()
            }
            (ProbePurpose::Retry, Err(e)) => {
                self.phase = FormPhase::Result(FormOutcome::HardFailure {
                    message: e.to_string(),
                    command: self.manual_command(),
                });
                Vec::new()
            }
        }
    }

    pub fn on_login_finished(&mut self, target: &str, result: Result<()>) -> Vec<Command> {
        if self.phase != FormPhase::Submitting || target != self.name() {
            return Vec::new();
        }
        let name = self.name().to_string();
        match result {
            Ok(()) => self.succeed(format!("Target '{name}' created successfully!")),
            Err(e) if is_missing_target(&e.to_string()) => {
                self.phase = FormPhase::Result(FormOutcome::HardFailure {
                    message: format!("Failed to create target: {e}"),
                    command: self.manual_command(),
                });
                Vec::new()
            }
            Err(e) => {
                tracing::info!(target_name = %name, error = %e, "login did not complete");
                self.phase = FormPhase::Result(FormOutcome::PendingAuth {
                    message: "Interactive authentication required. Complete the login in a \
                              browser or another terminal, then press 'r' to retry."
                        .to_string(),
                    command: self.manual_command(),
                });
                Vec::new()
            }
        }
    }

    pub fn on_clipboard(&mut self, result: std::result::Result<(), String>) {
        self.clipboard_note = Some(match result {
            Ok(()) => "Command copied to clipboard!".to_string(),
            Err(e) => format!("Copy failed: {e}"),
        });
    }

    /// True when the delayed return should still happen.
    pub fn awaiting_return(&self) -> bool {
        matches!(self.phase, FormPhase::Result(FormOutcome::Success(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    fn filled() -> AddTargetView {
        let mut view = AddTargetView::default();
        for (i, text) in ["ci", "https://ci.example.com", "main"].iter().enumerate() {
            if i > 0 {
                view.handle(Action::NextField);
            }
            for c in text.chars() {
                view.handle(Action::FormInput(c));
            }
        }
        view
    }

    fn submitted() -> AddTargetView {
        let mut view = filled();
        view.handle(Action::Submit);
        view
    }

    #[test]
    fn submit_disabled_while_field_blank() {
        let mut view = AddTargetView::default();
        view.handle(Action::FormInput('x'));
        assert!(view.handle(Action::Submit).is_empty());
        assert_eq!(view.phase(), &FormPhase::Editing);
    }

    #[test]
    fn whitespace_only_field_counts_as_blank() {
        let mut view = filled();
        view.handle(Action::FormClear);
        view.handle(Action::FormInput(' '));
        assert!(!view.can_submit());
    }

    #[test]
    fn tab_cycles_fields() {
        let mut view = AddTargetView::default();
        view.handle(Action::PrevField);
        assert_eq!(view.focused(), 2);
        view.handle(Action::NextField);
        assert_eq!(view.focused(), 0);
    }

    #[test]
    fn submit_probes_status_first() {
        let mut view = filled();
        let cmds = view.handle(Action::Submit);
        assert_eq!(view.phase(), &FormPhase::Submitting);
        match cmds.as_slice() {
            [Command::RemoteFor { target, request }] => {
                assert_eq!(target, "ci");
                assert_eq!(
                    request,
                    &Request::Status {
                        purpose: ProbePurpose::Submit
                    }
                );
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn authenticated_probe_short_circuits() {
        let mut view = submitted();
        let cmds = view.on_status(
            "ci",
            ProbePurpose::Submit,
            Ok(OperationOutput::succeeded("logged in successfully")),
        );
        assert!(view.awaiting_return());
        assert!(matches!(cmds.as_slice(), [Command::ReloadTargets, Command::Later { .. }]));
    }

    #[test]
    fn failed_probe_starts_interactive_login() {
        let mut view = submitted();
        let cmds = view.on_status(
            "ci",
            ProbePurpose::Submit,
            Ok(OperationOutput::rejected("error: unknown target: ci")),
        );
        match cmds.as_slice() {
            [Command::Login(req)] => {
                assert_eq!(req.origin, LoginOrigin::AddTarget);
                assert_eq!(req.api_url, "https://ci.example.com");
                assert_eq!(req.team, "main");
            }
            other => panic!("unexpected commands: {other:?}"),
        }
        assert_eq!(view.phase(), &FormPhase::Submitting);
    }

    #[test]
    fn login_failure_is_pending_auth_with_retry() {
        let mut view = submitted();
        view.on_status("ci", ProbePurpose::Submit, Ok(OperationOutput::rejected("")));
        view.on_login_finished(
            "ci",
            Err(Error::OperationRejected("fly login exited with exit status: 1".into())),
        );
        assert_eq!(view.mode(), FormMode::Result { pending_auth: true });

        let cmds = view.handle(Action::CopyCommand);
        assert!(matches!(
            cmds.as_slice(),
            [Command::Copy(c)] if c == "fly -t ci login -c https://ci.example.com -n main"
        ));

        let cmds = view.handle(Action::Retry);
        assert_eq!(view.phase(), &FormPhase::Submitting);
        assert!(matches!(
            cmds.first().and_then(Command::request),
            Some(Request::Status { purpose: ProbePurpose::Retry })
        ));
    }

    #[test]
    fn retry_outcomes() {
        let mut view = submitted();
        view.on_login_finished("ci", Err(Error::OperationRejected("exit 1".into())));
        view.handle(Action::Retry);
        view.on_status("ci", ProbePurpose::Retry, Ok(OperationOutput::rejected("token expired")));
        assert_eq!(view.mode(), FormMode::Result { pending_auth: true });

        view.handle(Action::Retry);
        view.on_status(
            "ci",
            ProbePurpose::Retry,
            Ok(OperationOutput::rejected("error: target not found")),
        );
        assert!(matches!(
            view.phase(),
            FormPhase::Result(FormOutcome::HardFailure { command, .. })
                if command == "fly -t ci login -c https://ci.example.com -n main"
        ));
        assert!(view.handle(Action::Retry).is_empty());
    }

    #[test]
    fn successful_retry_returns_later() {
        let mut view = submitted();
        view.on_login_finished("ci", Err(Error::OperationRejected("exit 1".into())));
        view.handle(Action::Retry);
        view.on_status(
            "ci",
            ProbePurpose::Retry,
            Ok(OperationOutput::succeeded("logged in successfully")),
        );
        assert!(view.awaiting_return());
    }

    #[test]
    fn missing_fly_is_hard_failure() {
        let mut view = submitted();
        view.on_login_finished("ci", Err(Error::CommandExecution("fly CLI not found.".into())));
        assert!(matches!(
            view.phase(),
            FormPhase::Result(FormOutcome::HardFailure { .. })
        ));
    }

    #[test]
    fn login_success() {
        let mut view = submitted();
        let cmds = view.on_login_finished("ci", Ok(()));
        assert_eq!(
            view.phase(),
            &FormPhase::Result(FormOutcome::Success("Target 'ci' created successfully!".into()))
        );
        assert_eq!(cmds.len(), 2);
    }

    #[test]
    fn stale_probe_ignored() {
        let mut view = filled();
        assert!(view
            .on_status("ci", ProbePurpose::Submit, Ok(OperationOutput::succeeded("ok")))
            .is_empty());
        assert_eq!(view.phase(), &FormPhase::Editing);
    }

    #[test]
    fn back_always_returns_to_targets() {
        let mut view = submitted();
        assert!(matches!(
            view.handle(Action::Back).as_slice(),
            [Command::Navigate(Navigate { view: ViewId::Targets, .. })]
        ));
    }
}
