//! Terminal input thread and application event channel.
//!
//! [`EventHandler`] spawns an OS thread (not tokio task) because `crossterm::event::poll()`
//! blocks and would starve the async runtime. Drop signals shutdown without joining
//! to avoid deadlocking if `poll` blocks during panic unwinding.

use crate::command::{LoginOrigin, ProbePurpose, TimerEvent};
use crate::concourse::OperationOutput;
use crate::error::Result;
use crate::model::{Build, Job, Pipeline, Resource};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

/// Everything the event loop reacts to. Background results carry the context
/// they were issued for so the owning view can drop stale ones.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    PipelinesLoaded {
        target: String,
        reload: bool,
        result: Result<Vec<Pipeline>>,
    },
    JobsLoaded {
        target: String,
        pipeline: String,
        reload: bool,
        result: Result<Vec<Job>>,
    },
    ResourcesLoaded {
        target: String,
        pipeline: String,
        reload: bool,
        result: Result<Vec<Resource>>,
    },
    BuildsLoaded {
        target: String,
        pipeline: String,
        job: String,
        reload: bool,
        result: Result<Vec<Build>>,
    },
    JobTriggered {
        target: String,
        pipeline: String,
        job: String,
        result: Result<OperationOutput>,
    },
    BuildRerun {
        target: String,
        pipeline: String,
        job: String,
        build_name: String,
        result: Result<OperationOutput>,
    },
    ResourceChecked {
        target: String,
        pipeline: String,
        resource: String,
        result: Result<OperationOutput>,
    },
    PipelinePauseToggled {
        target: String,
        pipeline: String,
        paused: bool,
        result: Result<OperationOutput>,
    },
    StatusProbed {
        target: String,
        purpose: ProbePurpose,
        result: Result<OperationOutput>,
    },
    LoginFinished {
        origin: LoginOrigin,
        target: String,
        result: Result<()>,
    },
    ClipboardResult(std::result::Result<(), String>),
    Timer(TimerEvent),
    /// Global toast, auto-dismisses after `ERROR_TTL`.
    Error(String),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, thread) = spawn_input_thread(tx.clone(), tick_rate);
        Self {
            rx,
            tx,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    /// Stops reading the terminal so a foreground child process can own it.
    pub fn pause(&mut self) {
        self.stop();
    }

    /// Restarts terminal reading after [`pause`](Self::pause).
    pub fn resume(&mut self, tick_rate: Duration) {
        if self.thread.is_none() {
            let (shutdown, thread) = spawn_input_thread(self.tx.clone(), tick_rate);
            self.shutdown = shutdown;
            self.thread = Some(thread);
        }
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            if let Err(panic_payload) = handle.join() {
                let msg = panic_payload.downcast::<String>().map_or_else(
                    |p| {
                        p.downcast::<&str>()
                            .map_or_else(|_| "unknown panic".to_string(), |s| s.to_string())
                    },
                    |s| *s,
                );
                tracing::error!("event thread panicked: {msg}");
            }
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        // Only signal; joining here can deadlock while poll() blocks during unwinding.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

fn spawn_input_thread(
    eventtx: mpsc::UnboundedSender<AppEvent>,
    tick_rate: Duration,
) -> (Arc<AtomicBool>, JoinHandle<()>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();

    let thread = std::thread::spawn(move || {
        while !shutdown_flag.load(Ordering::Relaxed) {
            match event::poll(tick_rate) {
                Err(e) => {
                    let _ = eventtx.send(AppEvent::Error(format!("Terminal poll error: {e}")));
                    break;
                }
                Ok(false) => {
                    if eventtx.send(AppEvent::Tick).is_err() {
                        break;
                    }
                    continue;
                }
                Ok(true) => {}
            }
            match event::read() {
                Ok(CrosstermEvent::Key(key)) => {
                    if eventtx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    let _ = eventtx.send(AppEvent::Error(format!("Terminal read error: {e}")));
                    break;
                }
                _ => {}
            }
        }
    });

    (shutdown, thread)
}

/// Runs `fut` on the runtime and turns a panic into an [`AppEvent::Error`]
/// instead of losing the result silently.
pub fn spawn_monitored(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    spawn_monitored_or(tx, label, fut, |_| None);
}

/// Like [`spawn_monitored`], but after a panic also posts the event built by
/// `on_crash`, so whoever waits for the unit's result gets one.
pub fn spawn_monitored_or<F>(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
    on_crash: F,
) where
    F: FnOnce(&str) -> Option<AppEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
            if let Some(event) = on_crash(&msg) {
                let _ = tx.send(event);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn monitored_panic_becomes_error_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_monitored(tx, "fly request", async {
            panic!("boom");
        });
        match rx.recv().await {
            Some(AppEvent::Error(msg)) => {
                assert!(msg.contains("fly request crashed"));
                assert!(msg.contains("boom"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn crash_event_follows_the_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_monitored_or(
            tx,
            "fly request",
            async {
                panic!("boom");
            },
            |msg| Some(AppEvent::Error(format!("fallback: {msg}"))),
        );
        assert!(matches!(rx.recv().await, Some(AppEvent::Error(m)) if m.contains("crashed")));
        match rx.recv().await {
            Some(AppEvent::Error(msg)) => assert_eq!(msg, "fallback: boom"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn monitored_success_sends_nothing_extra() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let inner = tx.clone();
        spawn_monitored(tx, "tick", async move {
            let _ = inner.send(AppEvent::Tick);
        });
        assert!(matches!(rx.recv().await, Some(AppEvent::Tick)));
        // All senders are gone once both tasks finish.
        assert!(rx.recv().await.is_none());
    }
}
