//! Session Persistence
//!
//! Remembers which service the client talks to and which jobs it
//! submitted, so that a later invocation (after a restart, say) can pick
//! up where the previous one left off.
//!
//! The session is saved to `{session_dir}/session.json`, where the
//! directory defaults to `.cerise` or `$CERISE_SESSION_DIR`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::client::ServiceInfo;
use crate::error::Result;

/// Name of the session file inside the session directory.
const SESSION_FILE: &str = "session.json";

/// Lazily-resolved default session directory.
pub static DEFAULT_SESSION_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var_os("CERISE_SESSION_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".cerise"))
});

/// Persistent client state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    /// The service jobs were submitted to
    pub service: ServiceInfo,

    /// Submitted jobs, by name
    pub jobs: BTreeMap<String, String>,

    /// Last time the session was updated
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new empty session for a service.
    pub fn new(service: ServiceInfo) -> Self {
        Self {
            service,
            jobs: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Path of the session file in `dir`.
    pub fn file_path(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(SESSION_FILE)
    }

    /// Saves the session to `dir`, creating the directory if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(dir.as_ref())?;

        let path = Self::file_path(dir);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;

        info!("Saved session to {}", path.display());
        Ok(path)
    }

    /// Loads a session from `dir`.
    ///
    /// Returns an error if no session file exists or it can't be read.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = Self::file_path(dir);

        let content = fs::read_to_string(&path)?;
        let session: Session = serde_json::from_str(&content)?;

        info!(
            "Loaded session from {} ({} jobs)",
            path.display(),
            session.jobs.len()
        );
        Ok(session)
    }

    /// Remembers a submitted job.
    pub fn record_job(&mut self, name: &str, id: &str) {
        self.jobs.insert(name.to_string(), id.to_string());
        self.updated_at = Utc::now();
    }

    /// Forgets a job. Returns its id if it was known.
    pub fn forget_job(&mut self, name: &str) -> Option<String> {
        let removed = self.jobs.remove(name);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Id of a job by name.
    pub fn job_id(&self, name: &str) -> Option<&str> {
        self.jobs.get(name).map(String::as_str)
    }

    /// Name of a job by id.
    pub fn job_name(&self, id: &str) -> Option<&str> {
        self.jobs
            .iter()
            .find(|(_, job_id)| job_id.as_str() == id)
            .map(|(name, _)| name.as_str())
    }
}
