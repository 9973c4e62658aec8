//! Error Types
//!
//! All fallible operations in the client return [`CeriseError`]. Variants
//! map onto the situations a caller is expected to handle: missing jobs,
//! malformed job descriptions, missing local or remote files, and
//! communication failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the Cerise client.
#[derive(Debug, Error)]
pub enum CeriseError {
    /// The job is unknown to the service. It was never submitted, or
    /// it has been deleted.
    #[error("Job not found on service: '{0}'")]
    JobNotFound(String),

    /// A job with this name already exists on the service.
    #[error("A job named '{0}' already exists on this service")]
    JobAlreadyExists(String),

    /// Job names may only contain letters, digits, underscores and hyphens.
    #[error("Invalid job name '{0}': use only letters, digits, '_' and '-'")]
    InvalidJobName(String),

    /// The job cannot be submitted in its current form.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// The input is not declared by the job's workflow.
    #[error("Input '{input}' is not defined by the workflow")]
    UnknownInput { input: String },

    /// A File value was given for a non-File input, or the other way around.
    #[error("Input '{input}' has type {expected}, which does not accept {given}")]
    WrongInputType {
        input: String,
        expected: String,
        given: String,
    },

    /// A secondary file was added before any primary file.
    #[error("Input '{0}' has no primary file; add one before adding secondary files")]
    NoPrimaryFile(String),

    /// The service returned an output that no longer exists.
    #[error("Output not available at {0}")]
    MissingOutput(String),

    /// A local file or directory does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Two different files with the same name were added to one job.
    #[error("A different file named '{0}' was already added to this job")]
    DuplicateFileName(String),

    /// The workflow document could not be parsed or failed validation.
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// The service location could not be understood.
    #[error("Invalid service URL '{0}': expected http://host[:port]")]
    InvalidUrl(String),

    /// The service answered with a status code the client did not expect.
    #[error("Unexpected response {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The service could not be reached or the transfer failed.
    #[error("Error communicating with the service: {0}")]
    Communication(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, CeriseError>;

impl CeriseError {
    /// Returns true if the error came from the transport layer or an
    /// unexpected service response rather than from the caller's input.
    pub fn is_communication(&self) -> bool {
        matches!(self, Self::Communication(_) | Self::UnexpectedStatus { .. })
    }
}
