//! Service Client Module
//!
//! Talks to a Cerise service over its REST API (`/jobs`) and its WebDAV
//! file store (`/files`).
//!
//! # Structure
//!
//! - [`service`]: Connection handle; creating, finding and destroying jobs
//! - [`job`]: Building, submitting and querying a single job
//! - [`output_file`]: Downloading job outputs
//! - [`record`]: JSON records exchanged with the service

pub mod job;
pub mod output_file;
pub mod record;
pub mod service;
mod store;

pub use job::Job;
pub use output_file::{JobOutput, OutputFile};
pub use record::{JobRecord, JobState};
pub use service::{is_valid_job_name, Service, ServiceInfo, DEFAULT_PORT};
