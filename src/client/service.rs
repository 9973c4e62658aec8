//! Service Connection
//!
//! A [`Service`] is a handle to a running Cerise instance. It creates,
//! finds, lists and destroys jobs, and is shared by every [`Job`] it
//! hands out.
//!
//! # Example
//!
//! ```rust,no_run
//! use cerise_client::Service;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Service::new("http://localhost", 29593)?;
//!     for job in service.list_jobs()? {
//!         println!("{} {:?}", job.name(), job.id());
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::job::Job;
use super::record::{JobDescription, JobRecord};
use super::store::{self, expect_status};
use crate::error::{CeriseError, Result};

/// Port a Cerise service listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 29593;

/// Default timeout for a single request, including uploads.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Serializable description of a service, for reconnecting later.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Scheme and host, e.g. `http://localhost`
    pub host: String,
    pub port: u16,
}

impl ServiceInfo {
    /// Base URL of the service, e.g. `http://localhost:29593`
    pub fn url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A connection to a Cerise service.
#[derive(Debug, Clone)]
pub struct Service {
    info: ServiceInfo,
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl Service {
    /// Creates a handle for the service at `host` (including the scheme)
    /// and `port`. This does not contact the service.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into().trim_end_matches('/').to_string();
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(CeriseError::InvalidUrl(host));
        }
        Self::from_info(ServiceInfo { host, port })
    }

    /// Creates a handle from a URL such as `http://localhost:29593`.
    ///
    /// Without an explicit port, [`DEFAULT_PORT`] is used.
    pub fn from_url(url: &str) -> Result<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let (scheme, rest) = trimmed
            .split_once("://")
            .ok_or_else(|| CeriseError::InvalidUrl(url.to_string()))?;

        if !matches!(scheme, "http" | "https") || rest.is_empty() || rest.contains('/') {
            return Err(CeriseError::InvalidUrl(url.to_string()));
        }

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| CeriseError::InvalidUrl(url.to_string()))?;
                (host, port)
            }
            None => (rest, DEFAULT_PORT),
        };

        Self::new(format!("{}://{}", scheme, host), port)
    }

    /// Recreates a service handle from a description made by [`Service::info`].
    pub fn from_info(info: ServiceInfo) -> Result<Self> {
        let http = build_client(DEFAULT_TIMEOUT)?;
        Ok(Self {
            base_url: info.url(),
            info,
            timeout: DEFAULT_TIMEOUT,
            http,
        })
    }

    /// Returns a description from which the service can be recreated.
    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    /// Base URL of the service.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sets the timeout for each request made through this handle.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.http = build_client(timeout)?;
        self.timeout = timeout;
        Ok(())
    }

    /// Checks whether the service responds.
    pub fn is_available(&self) -> bool {
        match self.http.get(self.jobs_url()).send() {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Service at {} not reachable: {}", self.base_url, e);
                false
            }
        }
    }

    /// Creates a new job on the service.
    ///
    /// Job names must be unique on the service and consist only of letters,
    /// digits, underscores and hyphens.
    pub fn create_job(&self, name: &str) -> Result<Job> {
        if !is_valid_job_name(name) {
            return Err(CeriseError::InvalidJobName(name.to_string()));
        }

        if !store::make_collection(&self.http, &self.input_dir_url(name))? {
            return Err(CeriseError::JobAlreadyExists(name.to_string()));
        }

        info!("Created job '{}' on {}", name, self.base_url);
        Ok(Job::new(self.clone(), name))
    }

    /// Gets a submitted job by its id.
    pub fn get_job_by_id(&self, id: &str) -> Result<Job> {
        let record = self.fetch_record(id)?;
        Ok(Job::from_record(self.clone(), record))
    }

    /// Gets a submitted job by its name.
    pub fn get_job_by_name(&self, name: &str) -> Result<Job> {
        self.list_jobs()?
            .into_iter()
            .find(|job| job.name() == name)
            .ok_or_else(|| CeriseError::JobNotFound(name.to_string()))
    }

    /// Lists all jobs submitted to the service.
    pub fn list_jobs(&self) -> Result<Vec<Job>> {
        let url = self.jobs_url();
        debug!("GET {}", url);

        let response = expect_status(self.http.get(&url).send()?, &[StatusCode::OK])?;
        let records: Vec<JobRecord> = response.json()?;

        Ok(records
            .into_iter()
            .map(|record| Job::from_record(self.clone(), record))
            .collect())
    }

    /// Deletes a job, its outputs, and the inputs uploaded for it.
    ///
    /// A job that is still running is cancelled by the service first.
    pub fn destroy_job(&self, job: &Job) -> Result<()> {
        let id = job
            .id()
            .ok_or_else(|| CeriseError::JobNotFound(job.name().to_string()))?;

        let url = self.job_url(id);
        debug!("DELETE {}", url);

        let response = self.http.delete(&url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CeriseError::JobNotFound(id.to_string()));
        }
        expect_status(response, &[StatusCode::NO_CONTENT, StatusCode::OK])?;

        match store::delete(&self.http, &self.input_dir_url(job.name())) {
            Ok(true) => debug!("Removed inputs of job '{}'", job.name()),
            Ok(false) => debug!("Job '{}' had no input directory", job.name()),
            Err(e) => warn!("Failed to remove inputs of job '{}': {}", job.name(), e),
        }

        info!("Destroyed job '{}' ({})", job.name(), id);
        Ok(())
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn jobs_url(&self) -> String {
        format!("{}/jobs", self.base_url)
    }

    pub(crate) fn job_url(&self, id: &str) -> String {
        format!("{}/jobs/{}", self.base_url, id)
    }

    pub(crate) fn input_dir_url(&self, job_name: &str) -> String {
        format!("{}/files/input/{}/", self.base_url, job_name)
    }

    /// Fetches the current record of a job.
    pub(crate) fn fetch_record(&self, id: &str) -> Result<JobRecord> {
        let url = self.job_url(id);
        debug!("GET {}", url);

        let response = not_found_as_job(self.http.get(&url).send()?, id)?;
        let response = expect_status(response, &[StatusCode::OK])?;
        Ok(response.json()?)
    }

    /// Submits a job description, returning the service's record of it.
    pub(crate) fn submit(&self, description: &JobDescription<'_>) -> Result<JobRecord> {
        let url = self.jobs_url();
        debug!("POST {} ({})", url, description.name);

        let response = self.http.post(&url).json(description).send()?;
        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let reason = response.text().unwrap_or_default();
            return Err(CeriseError::InvalidJob(format!(
                "service rejected job '{}': {}",
                description.name,
                reason.trim()
            )));
        }

        let response = expect_status(response, &[StatusCode::CREATED, StatusCode::OK])?;
        Ok(response.json()?)
    }

    /// Asks the service to cancel a job.
    pub(crate) fn cancel(&self, id: &str) -> Result<()> {
        let url = format!("{}/cancel", self.job_url(id));
        debug!("POST {}", url);

        let response = not_found_as_job(self.http.post(&url).send()?, id)?;
        expect_status(
            response,
            &[StatusCode::OK, StatusCode::ACCEPTED, StatusCode::NO_CONTENT],
        )?;
        Ok(())
    }
}

impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

/// Maps a 404 on a job endpoint to [`CeriseError::JobNotFound`].
fn not_found_as_job(response: Response, id: &str) -> Result<Response> {
    if response.status() == StatusCode::NOT_FOUND {
        Err(CeriseError::JobNotFound(id.to_string()))
    } else {
        Ok(response)
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .default_headers({
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::ACCEPT,
                reqwest::header::HeaderValue::from_static("application/json"),
            );
            headers
        })
        .build()?)
}

/// Job names may contain only letters, digits, underscores and hyphens.
pub fn is_valid_job_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
