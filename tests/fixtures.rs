#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use flyby::app::AppState;
use flyby::command::{Command, TimerEvent};
use flyby::concourse::{CiClient, Client, Connector, OperationOutput};
use flyby::config::{StoreError, StoreResult, Target, TargetStore};
use flyby::error::{Error, Result};
use flyby::model::{Build, BuildStatus, Job, Pipeline, Resource, Team};
use flyby::scheduler;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const BUILD_COUNT: usize = 50;

pub fn press(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

// ========== Sample data ==========

pub fn at(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

pub fn pipeline(name: &str, paused: bool) -> Pipeline {
    Pipeline {
        id: 1,
        name: name.to_string(),
        paused,
        public: false,
        archived: false,
        team_name: "main".to_string(),
        last_updated: at(1_700_000_000),
    }
}

pub fn job(pipeline: &str, name: &str) -> Job {
    Job {
        id: 1,
        name: name.to_string(),
        pipeline_name: pipeline.to_string(),
        pipeline_id: 1,
        team_name: "main".to_string(),
        next_build: None,
        finished_build: Some(build(pipeline, name, "14", BuildStatus::Succeeded)),
    }
}

pub fn resource(pipeline: &str, name: &str) -> Resource {
    Resource {
        name: name.to_string(),
        pipeline_name: pipeline.to_string(),
        team_name: "main".to_string(),
        kind: "git".to_string(),
        last_checked: at(1_700_000_000),
        version: None,
        metadata: None,
    }
}

pub fn build(pipeline: &str, job: &str, name: &str, status: BuildStatus) -> Build {
    Build {
        id: 1,
        team_name: "main".to_string(),
        name: name.to_string(),
        status,
        job_name: job.to_string(),
        pipeline_id: 1,
        pipeline_name: pipeline.to_string(),
        start_time: at(1_700_000_000),
        end_time: at(1_700_000_090),
    }
}

// ========== Fake client ==========

/// Canned answers for one target plus a log of what was asked.
pub struct FakeClient {
    target: String,
    pipelines: Mutex<Result<Vec<Pipeline>>>,
    jobs: Mutex<Result<Vec<Job>>>,
    resources: Mutex<Result<Vec<Resource>>>,
    builds: Mutex<Result<Vec<Build>>>,
    status: Mutex<Result<OperationOutput>>,
    mutation: Mutex<Result<OperationOutput>>,
    crash_on_mutation: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            pipelines: Mutex::new(Ok(Vec::new())),
            jobs: Mutex::new(Ok(Vec::new())),
            resources: Mutex::new(Ok(Vec::new())),
            builds: Mutex::new(Ok(Vec::new())),
            status: Mutex::new(Ok(OperationOutput::succeeded("logged in successfully"))),
            mutation: Mutex::new(Ok(OperationOutput::succeeded("started"))),
            crash_on_mutation: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pipelines(self, result: Result<Vec<Pipeline>>) -> Self {
        self.set_pipelines(result);
        self
    }

    pub fn with_jobs(self, result: Result<Vec<Job>>) -> Self {
        *self.jobs.lock().unwrap() = result;
        self
    }

    pub fn with_resources(self, result: Result<Vec<Resource>>) -> Self {
        *self.resources.lock().unwrap() = result;
        self
    }

    pub fn with_builds(self, result: Result<Vec<Build>>) -> Self {
        self.set_builds(result);
        self
    }

    pub fn with_status(self, result: Result<OperationOutput>) -> Self {
        *self.status.lock().unwrap() = result;
        self
    }

    pub fn with_mutation(self, result: Result<OperationOutput>) -> Self {
        self.set_mutation(result);
        self
    }

    /// Every mutating call panics instead of answering.
    pub fn crashing(mut self) -> Self {
        self.crash_on_mutation = true;
        self
    }

    pub fn set_pipelines(&self, result: Result<Vec<Pipeline>>) {
        *self.pipelines.lock().unwrap() = result;
    }

    pub fn set_builds(&self, result: Result<Vec<Build>>) {
        *self.builds.lock().unwrap() = result;
    }

    pub fn set_mutation(&self, result: Result<OperationOutput>) {
        *self.mutation.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutation(&self) -> Result<OperationOutput> {
        if self.crash_on_mutation {
            panic!("fly client crashed");
        }
        self.mutation.lock().unwrap().clone()
    }
}

#[async_trait]
impl CiClient for FakeClient {
    fn target(&self) -> &str {
        &self.target
    }

    async fn pipelines(&self) -> Result<Vec<Pipeline>> {
        self.record("pipelines".to_string());
        self.pipelines.lock().unwrap().clone()
    }

    async fn jobs(&self, pipeline: &str) -> Result<Vec<Job>> {
        self.record(format!("jobs {pipeline}"));
        self.jobs.lock().unwrap().clone()
    }

    async fn resources(&self, pipeline: &str) -> Result<Vec<Resource>> {
        self.record(format!("resources {pipeline}"));
        self.resources.lock().unwrap().clone()
    }

    async fn builds(&self, pipeline: &str, job: &str, count: usize) -> Result<Vec<Build>> {
        self.record(format!("builds {pipeline}/{job} {count}"));
        self.builds.lock().unwrap().clone()
    }

    async fn teams(&self) -> Result<Vec<Team>> {
        self.record("teams".to_string());
        Ok(vec![Team {
            id: 1,
            name: "main".to_string(),
        }])
    }

    async fn status(&self) -> Result<OperationOutput> {
        self.record("status".to_string());
        self.status.lock().unwrap().clone()
    }

    async fn trigger_job(&self, pipeline: &str, job: &str) -> Result<OperationOutput> {
        self.record(format!("trigger {pipeline}/{job}"));
        self.mutation()
    }

    async fn rerun_build(&self, pipeline: &str, job: &str, build: u64) -> Result<OperationOutput> {
        self.record(format!("rerun {pipeline}/{job} {build}"));
        self.mutation()
    }

    async fn check_resource(&self, pipeline: &str, resource: &str) -> Result<OperationOutput> {
        self.record(format!("check {pipeline}/{resource}"));
        self.mutation()
    }

    async fn pause_pipeline(&self, pipeline: &str) -> Result<OperationOutput> {
        self.record(format!("pause {pipeline}"));
        self.mutation()
    }

    async fn unpause_pipeline(&self, pipeline: &str) -> Result<OperationOutput> {
        self.record(format!("unpause {pipeline}"));
        self.mutation()
    }

    async fn login(&self, team: &str, _username: &str, _password: &str) -> Result<OperationOutput> {
        self.record(format!("login {team}"));
        Ok(OperationOutput::succeeded("target saved"))
    }

    async fn sync(&self) -> Result<OperationOutput> {
        self.record("sync".to_string());
        Ok(OperationOutput::succeeded(""))
    }
}

// ========== Fake connector ==========

pub struct FakeConnector {
    clients: Mutex<HashMap<String, Arc<FakeClient>>>,
    login: Mutex<Result<()>>,
    copy: Mutex<Result<()>>,
    copied: Mutex<Vec<String>>,
}

impl Default for FakeConnector {
    fn default() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            login: Mutex::new(Ok(())),
            copy: Mutex::new(Ok(())),
            copied: Mutex::new(Vec::new()),
        }
    }
}

impl FakeConnector {
    pub fn with_client(self, client: FakeClient) -> Self {
        self.clients
            .lock()
            .unwrap()
            .insert(client.target.clone(), Arc::new(client));
        self
    }

    pub fn with_login(self, result: Result<()>) -> Self {
        *self.login.lock().unwrap() = result;
        self
    }

    pub fn with_copy(self, result: Result<()>) -> Self {
        *self.copy.lock().unwrap() = result;
        self
    }

    /// The client registered for `target`, created empty on first use.
    pub fn client(&self, target: &str) -> Arc<FakeClient> {
        self.clients
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_insert_with(|| Arc::new(FakeClient::new(target)))
            .clone()
    }

    pub fn copied(&self) -> Vec<String> {
        self.copied.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    fn connect(&self, target: &str) -> Client {
        self.client(target)
    }

    fn login_interactive(&self, _target: &str, _api_url: &str, _team: &str) -> Result<()> {
        self.login.lock().unwrap().clone()
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        self.copied.lock().unwrap().push(text.to_string());
        self.copy.lock().unwrap().clone()
    }
}

// ========== In-memory target store ==========

#[derive(Debug, Default)]
pub struct MemoryStore {
    targets: BTreeMap<String, Target>,
}

impl MemoryStore {
    pub fn with(targets: &[(&str, &str, &str)]) -> Self {
        let targets = targets
            .iter()
            .map(|(name, api, team)| (name.to_string(), Target::new(*name, *api, *team)))
            .collect();
        Self { targets }
    }
}

impl TargetStore for MemoryStore {
    fn list(&self) -> Vec<Target> {
        self.targets.values().cloned().collect()
    }

    fn get(&self, name: &str) -> Option<Target> {
        self.targets.get(name).cloned()
    }

    fn add(&mut self, name: &str, api: &str, team: &str) -> StoreResult<()> {
        if name.is_empty() || api.is_empty() || team.is_empty() {
            return Err(StoreError::MissingFields);
        }
        self.targets
            .insert(name.to_string(), Target::new(name, api, team));
        Ok(())
    }

    fn remove(&mut self, name: &str) -> StoreResult<()> {
        self.targets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::UnknownTarget(name.to_string()))
    }

    fn update(&mut self, name: &str, mut target: Target) -> StoreResult<()> {
        let slot = self
            .targets
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownTarget(name.to_string()))?;
        target.name = name.to_string();
        *slot = target;
        Ok(())
    }

    fn reload(&mut self) -> StoreResult<()> {
        Ok(())
    }
}

// ========== Driving the router ==========

pub fn app(targets: &[(&str, &str, &str)], connector: &Arc<FakeConnector>) -> AppState {
    let connector: Arc<dyn Connector> = connector.clone();
    AppState::new(Box::new(MemoryStore::with(targets)), connector)
}

pub fn ci_app(connector: &Arc<FakeConnector>) -> AppState {
    app(&[("ci", "https://ci.example.com", "main")], connector)
}

/// Runs every remote command to completion against the fake clients and
/// feeds the results back, until only non-remote commands remain.
pub async fn settle(state: &mut AppState, connector: &FakeConnector, cmds: Vec<Command>) -> Vec<Command> {
    let mut queue: VecDeque<Command> = cmds.into();
    let mut rest = Vec::new();
    while let Some(cmd) = queue.pop_front() {
        let (client, request) = match cmd {
            Command::Remote { client, request } => (client, request),
            Command::RemoteFor { target, request } => (connector.connect(&target), request),
            other => {
                rest.push(other);
                continue;
            }
        };
        let event = scheduler::execute(client.as_ref(), request, BUILD_COUNT).await;
        queue.extend(state.handle_event(event));
    }
    rest
}

pub fn timers(cmds: &[Command]) -> Vec<TimerEvent> {
    cmds.iter()
        .filter_map(|cmd| match cmd {
            Command::Later { event, .. } => Some(event.clone()),
            _ => None,
        })
        .collect()
}

pub fn not_authorized() -> Error {
    Error::CommandExecution("Error: not authorized to access team".to_string())
}
