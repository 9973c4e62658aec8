//! Wire Records
//!
//! JSON structures exchanged with the service's `/jobs` endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// State of a job as reported by the service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Waiting,
    Running,
    Success,
    Cancelled,
    PermanentFailure,
    TemporaryFailure,
    SystemError,
    /// A state this client does not know about
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Returns true while the service may still change the job's state.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Waiting | Self::Running)
    }

    /// Returns true once the job has reached a final state.
    pub fn is_final(&self) -> bool {
        !self.is_running()
    }

    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }

    /// Returns true for the failure states.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::PermanentFailure | Self::TemporaryFailure | Self::SystemError | Self::Unknown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Cancelled => "Cancelled",
            Self::PermanentFailure => "PermanentFailure",
            Self::TemporaryFailure => "TemporaryFailure",
            Self::SystemError => "SystemError",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job as returned by `GET /jobs/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: String,

    pub name: String,

    /// URL of the workflow document
    #[serde(default)]
    pub workflow: String,

    /// The job's input object
    #[serde(default)]
    pub input: Value,

    pub state: JobState,

    /// Output object; only meaningful once the job succeeded
    #[serde(default)]
    pub output: Value,

    /// URL of the job's log
    #[serde(default)]
    pub log: Option<String>,
}

impl JobRecord {
    /// Returns the input object, or an empty one if the service sent none.
    pub fn input_object(&self) -> Map<String, Value> {
        match &self.input {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }
}

/// Body of `POST /jobs`.
#[derive(Serialize, Debug)]
pub struct JobDescription<'a> {
    pub name: &'a str,
    pub workflow: &'a str,
    pub input: &'a Map<String, Value>,
}

/// Builds a CWL File object pointing at `location`.
pub fn file_object(location: &str) -> Value {
    json!({
        "class": "File",
        "location": location,
    })
}

/// Returns true if `value` is a CWL File object.
pub fn is_file_object(value: &Value) -> bool {
    value.get("class").and_then(Value::as_str) == Some("File")
}
