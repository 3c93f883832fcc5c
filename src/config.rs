//! Target store backed by fly's own `~/.flyrc`.
//!
//! The file is shared with `fly` itself, so the schema follows what `fly`
//! writes: a `targets` map keyed by name. A missing file is an empty store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to locate home directory")]
    NoHomeDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize targets: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("name, url, and team are required")]
    MissingFields,

    #[error("target '{0}' does not exist")]
    UnknownTarget(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Map key in the file; filled in on load.
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub api: String,
    #[serde(default)]
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
}

impl Target {
    pub fn new(name: impl Into<String>, api: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api: api.into(),
            team: team.into(),
            ..Self::default()
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.value.is_empty())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FlyConfig {
    #[serde(default)]
    pub targets: BTreeMap<String, Target>,
}

/// Local CRUD over configured targets.
///
/// Writes are synchronous and last-write-wins. Listing is ordered by name.
pub trait TargetStore: Send {
    fn list(&self) -> Vec<Target>;
    fn get(&self, name: &str) -> Option<Target>;
    fn add(&mut self, name: &str, api: &str, team: &str) -> StoreResult<()>;
    fn remove(&mut self, name: &str) -> StoreResult<()>;
    fn update(&mut self, name: &str, target: Target) -> StoreResult<()>;
    /// Re-reads the backing file, picking up targets `fly login` wrote.
    fn reload(&mut self) -> StoreResult<()>;

    /// Distinct team names in first-seen (name) order.
    fn teams(&self) -> Vec<String> {
        let mut teams: Vec<String> = Vec::new();
        for target in self.list() {
            if !target.team.is_empty() && !teams.contains(&target.team) {
                teams.push(target.team);
            }
        }
        teams
    }

    fn targets_by_team(&self, team: &str) -> Vec<Target> {
        self.list().into_iter().filter(|t| t.team == team).collect()
    }
}

pub struct FlyrcStore {
    path: PathBuf,
    config: FlyConfig,
}

impl FlyrcStore {
    /// Opens `~/.flyrc`.
    pub fn open_default() -> StoreResult<Self> {
        let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
        Self::open(home.join(".flyrc"))
    }

    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut store = Self {
            path: path.into(),
            config: FlyConfig::default(),
        };
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> StoreResult<FlyConfig> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no flyrc, starting with zero targets");
                return Ok(FlyConfig::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(FlyConfig::default());
        }
        let mut config: FlyConfig =
            serde_yaml::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        for (name, target) in &mut config.targets {
            target.name.clone_from(name);
        }
        Ok(config)
    }

    fn save(&self) -> StoreResult<()> {
        let data = serde_yaml::to_string(&self.config)?;
        write_private(&self.path, data.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), targets = self.config.targets.len(), "saved flyrc");
        Ok(())
    }
}

impl TargetStore for FlyrcStore {
    fn list(&self) -> Vec<Target> {
        self.config.targets.values().cloned().collect()
    }

    fn get(&self, name: &str) -> Option<Target> {
        self.config.targets.get(name).cloned()
    }

    fn add(&mut self, name: &str, api: &str, team: &str) -> StoreResult<()> {
        if name.is_empty() || api.is_empty() || team.is_empty() {
            return Err(StoreError::MissingFields);
        }
        self.config
            .targets
            .insert(name.to_string(), Target::new(name, api, team));
        self.save()
    }

    fn remove(&mut self, name: &str) -> StoreResult<()> {
        if self.config.targets.remove(name).is_none() {
            return Err(StoreError::UnknownTarget(name.to_string()));
        }
        self.save()
    }

    fn update(&mut self, name: &str, mut target: Target) -> StoreResult<()> {
        let Some(slot) = self.config.targets.get_mut(name) else {
            return Err(StoreError::UnknownTarget(name.to_string()));
        };
        target.name = name.to_string();
        *slot = target;
        self.save()
    }

    fn reload(&mut self) -> StoreResult<()> {
        self.config = Self::load(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; narrow an existing file too.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, data)
}
