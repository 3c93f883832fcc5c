use crate::error::{Error, Result};
use crate::model::{Build, Job, Pipeline, Resource, Team};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// `fly` reports timestamps as unix seconds and uses `0` (or omits the field)
/// for "never".
pub fn unix_time<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<i64>::deserialize(deserializer)?;
    Ok(secs
        .filter(|s| *s > 0)
        .and_then(|s| DateTime::from_timestamp(s, 0)))
}

fn parse_list<T: DeserializeOwned>(json: &str, what: &str) -> Result<Vec<T>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let items: Option<Vec<T>> = serde_json::from_str(json)
        .map_err(|e| Error::CommandExecution(format!("failed to parse {what} JSON: {e}")))?;
    Ok(items.unwrap_or_default())
}

pub fn parse_pipelines(json: &str) -> Result<Vec<Pipeline>> {
    parse_list(json, "pipelines")
}

pub fn parse_jobs(json: &str) -> Result<Vec<Job>> {
    parse_list(json, "jobs")
}

pub fn parse_resources(json: &str) -> Result<Vec<Resource>> {
    parse_list(json, "resources")
}

pub fn parse_builds(json: &str) -> Result<Vec<Build>> {
    parse_list(json, "builds")
}

pub fn parse_teams(json: &str) -> Result<Vec<Team>> {
    parse_list(json, "teams")
}
