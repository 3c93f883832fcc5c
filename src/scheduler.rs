//! Runs background units of work and posts their results to the event queue.
//!
//! Every unit is independent: nothing is cancelled when the user navigates
//! away, and results arrive in completion order, not dispatch order.

use crate::command::{Command, Request, TimerEvent};
use crate::concourse::{CiClient, Connector};
use crate::error::Error;
use crate::events::{spawn_monitored, spawn_monitored_or, AppEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Clone)]
pub struct Scheduler {
    tx: UnboundedSender<AppEvent>,
    connector: Arc<dyn Connector>,
    build_count: usize,
}

impl Scheduler {
    pub fn new(tx: UnboundedSender<AppEvent>, connector: Arc<dyn Connector>, build_count: usize) -> Self {
        Self {
            tx,
            connector,
            build_count,
        }
    }

    /// Starts the unit of work for a background command. Commands that must
    /// run on the event loop itself are handed back.
    pub fn dispatch(&self, command: Command) -> Option<Command> {
        match command {
            Command::Remote { client, request } => {
                let tx = self.tx.clone();
                let count = self.build_count;
                let target = client.target().to_string();
                let pending = request.clone();
                spawn_monitored_or(
                    self.tx.clone(),
                    "fly request",
                    async move {
                        let event = execute(client.as_ref(), request, count).await;
                        let _ = tx.send(event);
                    },
                    move |msg| {
                        let error = Error::CommandExecution(format!("fly request crashed: {msg}"));
                        Some(failed(pending, target, error))
                    },
                );
                None
            }
            Command::RemoteFor { target, request } => {
                let client = self.connector.connect(&target);
                self.dispatch(Command::Remote { client, request })
            }
            Command::Later { after, event } => {
                self.schedule(after, event);
                None
            }
            Command::Copy(text) => {
                let tx = self.tx.clone();
                let connector = self.connector.clone();
                spawn_monitored(self.tx.clone(), "clipboard", async move {
                    let result = connector
                        .copy_to_clipboard(&text)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(AppEvent::ClipboardResult(result));
                });
                None
            }
            other => Some(other),
        }
    }

    fn schedule(&self, after: Duration, event: TimerEvent) {
        let tx = self.tx.clone();
        spawn_monitored(self.tx.clone(), "timer", async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(AppEvent::Timer(event));
        });
    }
}

/// The result event `request` would have produced, carrying `error`. Lets the
/// issuing view leave its loading or in-flight state when the unit dies.
pub fn failed(request: Request, target: String, error: Error) -> AppEvent {
    match request {
        Request::Pipelines { reload } => AppEvent::PipelinesLoaded {
            target,
            reload,
            result: Err(error),
        },
        Request::Jobs { pipeline, reload } => AppEvent::JobsLoaded {
            target,
            pipeline,
            reload,
            result: Err(error),
        },
        Request::Resources { pipeline, reload } => AppEvent::ResourcesLoaded {
            target,
            pipeline,
            reload,
            result: Err(error),
        },
        Request::Builds {
            pipeline,
            job,
            reload,
        } => AppEvent::BuildsLoaded {
            target,
            pipeline,
            job,
            reload,
            result: Err(error),
        },
        Request::TriggerJob { pipeline, job } => AppEvent::JobTriggered {
            target,
            pipeline,
            job,
            result: Err(error),
        },
        Request::RerunBuild {
            pipeline,
            job,
            build_name,
            ..
        } => AppEvent::BuildRerun {
            target,
            pipeline,
            job,
            build_name,
            result: Err(error),
        },
        Request::CheckResource { pipeline, resource } => AppEvent::ResourceChecked {
            target,
            pipeline,
            resource,
            result: Err(error),
        },
        Request::SetPaused { pipeline, paused } => AppEvent::PipelinePauseToggled {
            target,
            pipeline,
            paused,
            result: Err(error),
        },
        Request::Status { purpose } => AppEvent::StatusProbed {
            target,
            purpose,
            result: Err(error),
        },
    }
}

/// Performs one request and wraps the outcome in the matching result event.
pub async fn execute(client: &dyn CiClient, request: Request, build_count: usize) -> AppEvent {
    let target = client.target().to_string();
    tracing::debug!(target_name = %target, request = ?request, "executing request");
    match request {
        Request::Pipelines { reload } => AppEvent::PipelinesLoaded {
            result: client.pipelines().await,
            target,
            reload,
        },
        Request::Jobs { pipeline, reload } => AppEvent::JobsLoaded {
            result: client.jobs(&pipeline).await,
            target,
            pipeline,
            reload,
        },
        Request::Resources { pipeline, reload } => AppEvent::ResourcesLoaded {
            result: client.resources(&pipeline).await,
            target,
            pipeline,
            reload,
        },
        Request::Builds {
            pipeline,
            job,
            reload,
        } => AppEvent::BuildsLoaded {
            result: client.builds(&pipeline, &job, build_count).await,
            target,
            pipeline,
            job,
            reload,
        },
        Request::TriggerJob { pipeline, job } => AppEvent::JobTriggered {
            result: client.trigger_job(&pipeline, &job).await,
            target,
            pipeline,
            job,
        },
        Request::RerunBuild {
            pipeline,
            job,
            build_name,
            build,
        } => AppEvent::BuildRerun {
            result: client.rerun_build(&pipeline, &job, build).await,
            target,
            pipeline,
            job,
            build_name,
        },
        Request::CheckResource { pipeline, resource } => AppEvent::ResourceChecked {
            result: client.check_resource(&pipeline, &resource).await,
            target,
            pipeline,
            resource,
        },
        Request::SetPaused { pipeline, paused } => {
            let result = if paused {
                client.pause_pipeline(&pipeline).await
            } else {
                client.unpause_pipeline(&pipeline).await
            };
            AppEvent::PipelinePauseToggled {
                target,
                pipeline,
                paused,
                result,
            }
        }
        Request::Status { purpose } => AppEvent::StatusProbed {
            result: client.status().await,
            target,
            purpose,
        },
    }
}
