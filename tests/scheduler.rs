mod fixtures;

use fixtures::*;
use flyby::command::{Command, LoginOrigin, LoginRequest, ProbePurpose, Request, TimerEvent};
use flyby::concourse::{Connector, OperationOutput};
use flyby::error::Error;
use flyby::events::AppEvent;
use flyby::model::BuildStatus;
use flyby::scheduler::{self, Scheduler};
use flyby::input::Action;
use flyby::views::jobs::JobsView;
use flyby::views::ViewId;

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn spawn_scheduler(connector: &Arc<FakeConnector>) -> (Scheduler, mpsc::UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connector: Arc<dyn Connector> = connector.clone();
    (Scheduler::new(tx, connector, 25), rx)
}

#[tokio::test]
async fn builds_request_passes_the_configured_count() {
    let client = FakeClient::new("ci").with_builds(Ok(vec![build(
        "deploy",
        "build",
        "3",
        BuildStatus::Succeeded,
    )]));
    let request = Request::Builds {
        pipeline: "deploy".to_string(),
        job: "build".to_string(),
        reload: true,
    };

    let event = scheduler::execute(&client, request, 7).await;

    match event {
        AppEvent::BuildsLoaded {
            target,
            pipeline,
            job,
            reload,
            result,
        } => {
            assert_eq!(target, "ci");
            assert_eq!(pipeline, "deploy");
            assert_eq!(job, "build");
            assert!(reload);
            assert_eq!(result.map(|b| b.len()), Ok(1));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(client.calls(), vec!["builds deploy/build 7"]);
}

#[tokio::test]
async fn pause_request_picks_the_direction() {
    let client = FakeClient::new("ci").with_mutation(Ok(OperationOutput::succeeded("unpaused 'deploy'")));
    let request = Request::SetPaused {
        pipeline: "deploy".to_string(),
        paused: false,
    };

    let event = scheduler::execute(&client, request, 50).await;

    assert!(matches!(
        event,
        AppEvent::PipelinePauseToggled { paused: false, .. }
    ));
    assert_eq!(client.calls(), vec!["unpause deploy"]);
}

#[tokio::test]
async fn rerun_request_carries_display_name_back() {
    let client = FakeClient::new("ci")
        .with_mutation(Err(Error::CommandExecution("fly exited unexpectedly".to_string())));
    let request = Request::RerunBuild {
        pipeline: "deploy".to_string(),
        job: "build".to_string(),
        build_name: "11".to_string(),
        build: 11,
    };

    match scheduler::execute(&client, request, 50).await {
        AppEvent::BuildRerun {
            build_name, result, ..
        } => {
            assert_eq!(build_name, "11");
            assert!(result.is_err());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn status_probe_reports_purpose() {
    let client = FakeClient::new("new");
    let event = scheduler::execute(
        &client,
        Request::Status {
            purpose: ProbePurpose::Retry,
        },
        50,
    )
    .await;
    match event {
        AppEvent::StatusProbed {
            target,
            purpose,
            result,
        } => {
            assert_eq!(target, "new");
            assert_eq!(purpose, ProbePurpose::Retry);
            assert!(result.map(|o| o.success).unwrap_or(false));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn remote_for_connects_and_posts_result() {
    let connector = Arc::new(
        FakeConnector::default()
            .with_client(FakeClient::new("ci").with_pipelines(Ok(vec![pipeline("deploy", false)]))),
    );
    let (scheduler, mut rx) = spawn_scheduler(&connector);

    let handed_back = scheduler.dispatch(Command::RemoteFor {
        target: "ci".to_string(),
        request: Request::Pipelines { reload: false },
    });

    assert!(handed_back.is_none());
    match rx.recv().await {
        Some(AppEvent::PipelinesLoaded { target, result, .. }) => {
            assert_eq!(target, "ci");
            assert_eq!(result.map(|p| p.len()), Ok(1));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn crashed_trigger_still_reports_a_result() {
    let client = Arc::new(FakeClient::new("ci").crashing());
    let connector = Arc::new(FakeConnector::default());
    let (scheduler, mut rx) = spawn_scheduler(&connector);

    let mut view = JobsView::default();
    view.enter("ci", "deploy", client.clone());
    view.on_loaded("ci", "deploy", false, Ok(vec![job("deploy", "build")]));
    for cmd in view.handle(Action::Select) {
        assert!(scheduler.dispatch(cmd).is_none());
    }
    assert!(view.activity().is_busy());

    match rx.recv().await {
        Some(AppEvent::Error(msg)) => assert!(msg.contains("fly request crashed")),
        other => panic!("unexpected event: {other:?}"),
    }
    match rx.recv().await {
        Some(AppEvent::JobTriggered {
            target,
            pipeline,
            job,
            result,
        }) => {
            assert!(matches!(&result, Err(Error::CommandExecution(m)) if m.contains("fly client crashed")));
            view.on_triggered(&target, &pipeline, &job, result);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(!view.activity().is_busy());
}

#[test]
fn failed_rerun_keeps_its_context() {
    let request = Request::RerunBuild {
        pipeline: "deploy".to_string(),
        job: "build".to_string(),
        build_name: "11".to_string(),
        build: 11,
    };
    let error = Error::CommandExecution("gone".to_string());
    match scheduler::failed(request, "ci".to_string(), error.clone()) {
        AppEvent::BuildRerun {
            target,
            pipeline,
            job,
            build_name,
            result,
        } => {
            assert_eq!(
                (target.as_str(), pipeline.as_str(), job.as_str(), build_name.as_str()),
                ("ci", "deploy", "build", "11")
            );
            assert_eq!(result, Err(error));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn later_fires_its_timer_once() {
    let connector = Arc::new(FakeConnector::default());
    let (scheduler, mut rx) = spawn_scheduler(&connector);
    let event = TimerEvent::ClearBanner {
        view: ViewId::Jobs,
        id: 3,
    };

    let handed_back = scheduler.dispatch(Command::Later {
        after: Duration::from_millis(5),
        event: event.clone(),
    });

    assert!(handed_back.is_none());
    match rx.recv().await {
        Some(AppEvent::Timer(fired)) => assert_eq!(fired, event),
        other => panic!("unexpected event: {other:?}"),
    }
    let extra = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn copy_reports_clipboard_outcome() {
    let connector = Arc::new(
        FakeConnector::default().with_copy(Err(Error::CommandExecution("no clipboard tool".to_string()))),
    );
    let (scheduler, mut rx) = spawn_scheduler(&connector);

    scheduler.dispatch(Command::Copy("fly -t ci login".to_string()));

    match rx.recv().await {
        Some(AppEvent::ClipboardResult(result)) => {
            assert_eq!(result, Err("no clipboard tool".to_string()));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(connector.copied(), vec!["fly -t ci login"]);
}

#[tokio::test]
async fn foreground_commands_are_handed_back() {
    let connector = Arc::new(FakeConnector::default());
    let (scheduler, _rx) = spawn_scheduler(&connector);
    let login = LoginRequest {
        origin: LoginOrigin::Auth,
        target: "ci".to_string(),
        api_url: "https://ci.example.com".to_string(),
        team: "main".to_string(),
    };

    match scheduler.dispatch(Command::Login(login.clone())) {
        Some(Command::Login(req)) => assert_eq!(req, login),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(matches!(scheduler.dispatch(Command::Quit), Some(Command::Quit)));
}
