//! Success detection for `fly` commands that only print free text.
//!
//! Every heuristic that scrapes command output lives here so call sites never
//! look at raw text themselves.

const AUTH_MARKERS: &[&str] = &[
    "not authorized",
    "not logged in",
    "unauthorized",
    "authentication",
];

const MISSING_TARGET_MARKERS: &[&str] = &["not found", "no such"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Trigger,
    Rerun,
    Check,
    Pause,
    Unpause,
    Status,
    Login,
    Sync,
}

impl OperationKind {
    /// Word the output must contain (case-insensitively) for the operation to
    /// count as done. `None` means the exit status alone decides.
    pub fn success_marker(self) -> Option<&'static str> {
        match self {
            OperationKind::Trigger | OperationKind::Rerun => Some("started"),
            OperationKind::Check => Some("succeeded"),
            OperationKind::Pause => Some("paused"),
            OperationKind::Unpause => Some("unpaused"),
            OperationKind::Status => Some("logged in successfully"),
            OperationKind::Login => Some("target saved"),
            OperationKind::Sync => None,
        }
    }
}

/// Outcome of a mutating command that `fly` managed to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutput {
    pub success: bool,
    pub output: String,
}

impl OperationOutput {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn rejected(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

pub fn interpret_output(kind: OperationKind, raw: &str, exit_ok: bool) -> OperationOutput {
    let output = raw.trim().to_string();
    let success = exit_ok
        && kind
            .success_marker()
            .map_or(true, |marker| output.to_lowercase().contains(marker));
    OperationOutput { success, output }
}

pub fn is_auth_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    AUTH_MARKERS.iter().any(|m| lower.contains(m))
}

/// The add-target flow uses this to tell "the URL or team is wrong" apart
/// from "the browser login has not finished yet".
pub fn is_missing_target(output: &str) -> bool {
    let lower = output.to_lowercase();
    MISSING_TARGET_MARKERS.iter().any(|m| lower.contains(m))
}
