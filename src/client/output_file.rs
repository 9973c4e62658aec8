//! Job Output Files
//!
//! Outputs produced by a job stay on the service until they are fetched.
//! An [`OutputFile`] is a handle to one of them.

use std::fs::File;
use std::path::Path;

use log::info;
use reqwest::blocking::Client;
use serde_json::Value;

use super::record::is_file_object;
use super::store;
use crate::error::{CeriseError, Result};

/// A file produced by a job, available on the service.
#[derive(Debug, Clone)]
pub struct OutputFile {
    uri: String,
    secondary_files: Vec<OutputFile>,
    http: Client,
}

impl OutputFile {
    /// Creates a handle for the file at `uri`.
    pub fn new(uri: impl Into<String>) -> Self {
        Self::with_client(uri, Client::new())
    }

    pub(crate) fn with_client(uri: impl Into<String>, http: Client) -> Self {
        Self {
            uri: uri.into(),
            secondary_files: Vec::new(),
            http,
        }
    }

    /// Builds a handle from a CWL File object, including its secondary files.
    pub(crate) fn from_cwl(value: &Value, http: &Client) -> Option<Self> {
        if !is_file_object(value) {
            return None;
        }
        let location = value.get("location").and_then(Value::as_str)?;

        let mut file = Self::with_client(location, http.clone());
        if let Some(Value::Array(secondary)) = value.get("secondaryFiles") {
            file.secondary_files = secondary
                .iter()
                .filter_map(|v| Self::from_cwl(v, http))
                .collect();
        }
        Some(file)
    }

    /// The URI at which the file is available.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The last path segment of the URI.
    pub fn file_name(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }

    /// Files the service returned alongside this one (e.g. an index).
    pub fn secondary_files(&self) -> &[OutputFile] {
        &self.secondary_files
    }

    /// Downloads the file as raw bytes.
    pub fn content(&self) -> Result<Vec<u8>> {
        let response = store::open(&self.http, &self.uri)?;
        Ok(response.bytes()?.to_vec())
    }

    /// Downloads the file as text, decoded using the charset the service
    /// reports (UTF-8 if none).
    pub fn text(&self) -> Result<String> {
        let response = store::open(&self.http, &self.uri)?;
        Ok(response.text()?)
    }

    /// Downloads the file and saves it to `path`.
    ///
    /// The directory containing `path` must already exist.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(CeriseError::FileNotFound(parent.to_path_buf()));
            }
        }

        let mut response = store::open(&self.http, &self.uri)?;
        let mut file = File::create(path)?;
        let bytes = response.copy_to(&mut file)?;

        info!("Saved {} ({} bytes) to {}", self.uri, bytes, path.display());
        Ok(())
    }
}

impl PartialEq for OutputFile {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.secondary_files == other.secondary_files
    }
}

/// A value in a job's output object.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    File(OutputFile),
    Files(Vec<OutputFile>),
    /// Any non-File output, as JSON
    Value(Value),
}

impl JobOutput {
    pub(crate) fn from_cwl(value: &Value, http: &Client) -> Self {
        if let Some(file) = OutputFile::from_cwl(value, http) {
            return Self::File(file);
        }

        if let Value::Array(items) = value {
            if !items.is_empty() && items.iter().all(is_file_object) {
                let files = items
                    .iter()
                    .filter_map(|v| OutputFile::from_cwl(v, http))
                    .collect();
                return Self::Files(files);
            }
        }

        Self::Value(value.clone())
    }

    /// Returns the file if this output is a single File.
    pub fn as_file(&self) -> Option<&OutputFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    /// Returns all files in this output (none for plain values).
    pub fn files(&self) -> Vec<&OutputFile> {
        match self {
            Self::File(file) => vec![file],
            Self::Files(files) => files.iter().collect(),
            Self::Value(_) => Vec::new(),
        }
    }
}
