//! Side effects requested by view transitions.
//!
//! Views never touch `fly`, the clock or the target store directly; they
//! return commands and the router and scheduler carry them out.

use crate::concourse::Client;
use crate::views::ViewId;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Pipelines { reload: bool },
    Jobs { pipeline: String, reload: bool },
    Resources { pipeline: String, reload: bool },
    Builds { pipeline: String, job: String, reload: bool },
    TriggerJob { pipeline: String, job: String },
    /// `build_name` is the display name shown to the user; `build` is the
    /// integer passed to `fly`.
    RerunBuild {
        pipeline: String,
        job: String,
        build_name: String,
        build: u64,
    },
    CheckResource { pipeline: String, resource: String },
    SetPaused { pipeline: String, paused: bool },
    Status { purpose: ProbePurpose },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePurpose {
    /// First probe on form submission.
    Submit,
    /// User asked to re-check after finishing a login elsewhere.
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOrigin {
    AddTarget,
    Auth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub origin: LoginOrigin,
    pub target: String,
    pub api_url: String,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    ClearBanner { view: ViewId, id: u64 },
    RerunTick { seq: u64 },
    ReloadBuilds {
        target: String,
        pipeline: String,
        job: String,
    },
    ReturnToTargets,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigate {
    pub view: ViewId,
    pub target: Option<String>,
    pub pipeline: Option<String>,
    pub job: Option<String>,
}

impl Navigate {
    pub fn to(view: ViewId) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = Some(pipeline.into());
        self
    }

    pub fn job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }
}

pub enum Command {
    /// Background unit of work against an attached client.
    Remote { client: Client, request: Request },
    /// Background unit of work against a target that has no client yet.
    RemoteFor { target: String, request: Request },
    /// Deferred unit; fires once.
    Later { after: Duration, event: TimerEvent },
    Navigate(Navigate),
    DeleteTarget(String),
    ReloadTargets,
    /// Foreground, terminal-owning login.
    Login(LoginRequest),
    Copy(String),
    Quit,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Remote { client, request } => f
                .debug_struct("Remote")
                .field("target", &client.target())
                .field("request", request)
                .finish(),
            Command::RemoteFor { target, request } => f
                .debug_struct("RemoteFor")
                .field("target", target)
                .field("request", request)
                .finish(),
            Command::Later { after, event } => f
                .debug_struct("Later")
                .field("after", after)
                .field("event", event)
                .finish(),
            Command::Navigate(nav) => f.debug_tuple("Navigate").field(nav).finish(),
            Command::DeleteTarget(name) => f.debug_tuple("DeleteTarget").field(name).finish(),
            Command::ReloadTargets => f.write_str("ReloadTargets"),
            Command::Login(req) => f.debug_tuple("Login").field(req).finish(),
            Command::Copy(text) => f.debug_tuple("Copy").field(text).finish(),
            Command::Quit => f.write_str("Quit"),
        }
    }
}

impl Command {
    pub fn remote(client: &Client, request: Request) -> Self {
        Command::Remote {
            client: client.clone(),
            request,
        }
    }

    /// The request carried by a remote command, for assertions and logging.
    pub fn request(&self) -> Option<&Request> {
        match self {
            Command::Remote { request, .. } | Command::RemoteFor { request, .. } => Some(request),
            _ => None,
        }
    }
}
