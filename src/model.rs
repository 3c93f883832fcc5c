//! Read-only projections of Concourse state as `fly ... --json` reports it.

use crate::concourse::parser::unix_time;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Succeeded,
    Failed,
    Errored,
    Aborted,
    Started,
    Pending,
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    pub fn label(self) -> &'static str {
        match self {
            BuildStatus::Succeeded => "SUCCEEDED",
            BuildStatus::Failed => "FAILED",
            BuildStatus::Errored => "ERRORED",
            BuildStatus::Aborted => "ABORTED",
            BuildStatus::Started => "STARTED",
            BuildStatus::Pending => "PENDING",
            BuildStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, BuildStatus::Started | BuildStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub team_name: String,
    #[serde(default, deserialize_with = "unix_time")]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Build {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub team_name: String,
    /// Display number. Reruns are dotted (`11.1`), so this stays a string.
    pub name: String,
    pub status: BuildStatus,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub pipeline_id: u64,
    #[serde(default)]
    pub pipeline_name: String,
    #[serde(default, deserialize_with = "unix_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "unix_time")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Build {
    /// The integer `fly rerun-build --build` expects. Dotted rerun numbers
    /// and anything else non-numeric are rejected before a command is issued.
    pub fn rerun_number(&self) -> Result<u64> {
        self.name
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::MalformedBuildNumber(self.name.clone()))
    }

    pub fn duration_secs(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub pipeline_name: String,
    #[serde(default)]
    pub pipeline_id: u64,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub next_build: Option<Build>,
    #[serde(default)]
    pub finished_build: Option<Build>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Metadata {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub pipeline_name: String,
    #[serde(default)]
    pub team_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "unix_time")]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub metadata: Option<Vec<Metadata>>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: u64,
    pub name: String,
}
