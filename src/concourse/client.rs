use crate::concourse::outcome::OperationOutput;
use crate::error::Result;
use crate::model::{Build, Job, Pipeline, Resource, Team};
use async_trait::async_trait;
use std::sync::Arc;

/// One logical Concourse capability per method, scoped to a single target.
///
/// Reads fail with [`crate::error::Error::CommandExecution`] (or
/// `AuthenticationRequired`) when `fly` cannot run or prints something
/// unparseable. Mutations only return `Err` when `fly` could not be run at
/// all; a refusal comes back as `Ok` with `success == false` and the
/// diagnostic in `output`.
#[async_trait]
pub trait CiClient: Send + Sync {
    fn target(&self) -> &str;

    async fn pipelines(&self) -> Result<Vec<Pipeline>>;
    async fn jobs(&self, pipeline: &str) -> Result<Vec<Job>>;
    async fn resources(&self, pipeline: &str) -> Result<Vec<Resource>>;
    async fn builds(&self, pipeline: &str, job: &str, count: usize) -> Result<Vec<Build>>;
    async fn teams(&self) -> Result<Vec<Team>>;

    /// Lightweight probe; `success` means the target exists and holds a
    /// valid token.
    async fn status(&self) -> Result<OperationOutput>;

    async fn trigger_job(&self, pipeline: &str, job: &str) -> Result<OperationOutput>;
    async fn rerun_build(&self, pipeline: &str, job: &str, build: u64) -> Result<OperationOutput>;
    async fn check_resource(&self, pipeline: &str, resource: &str) -> Result<OperationOutput>;
    async fn pause_pipeline(&self, pipeline: &str) -> Result<OperationOutput>;
    async fn unpause_pipeline(&self, pipeline: &str) -> Result<OperationOutput>;
    async fn login(&self, team: &str, username: &str, password: &str) -> Result<OperationOutput>;
    async fn sync(&self) -> Result<OperationOutput>;
}

pub type Client = Arc<dyn CiClient>;

/// Produces clients for named targets and owns the operations that are not
/// scoped to an existing client.
#[async_trait]
pub trait Connector: Send + Sync {
    fn connect(&self, target: &str) -> Client;

    /// Hands the terminal to `fly login` until it exits. Blocks the caller;
    /// the event loop must suspend rendering around it.
    fn login_interactive(&self, target: &str, api_url: &str, team: &str) -> Result<()>;

    async fn copy_to_clipboard(&self, text: &str) -> Result<()>;
}
