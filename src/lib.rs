//! cerise-client - Client for the Cerise CWL job running service
//!
//! Submits Common Workflow Language (CWL) workflows to a remote Cerise
//! service, uploads their input files, follows their progress and
//! retrieves their outputs and logs.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`client`]: REST/WebDAV client (Service, Job, OutputFile)
//! - [`workflow`]: Local parsing and checking of CWL documents
//! - [`monitoring`]: Watching jobs and recording their timeline
//! - [`session`]: Persisting the service and submitted jobs between runs
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use cerise_client::Service;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Service::new("http://localhost", 29593)?;
//!
//!     let mut job = service.create_job("gromacs_energy")?;
//!     job.set_workflow("gromacs_energy.cwl")?;
//!     job.add_input_file("protein_pdb", "CYP19A1vs.pdb")?;
//!     job.set_input("force_field", "amber99SB")?;
//!     job.set_input("sim_time", 0.0001)?;
//!     job.run()?;
//!
//!     if job.wait(Duration::from_secs(10))?.is_success() {
//!         for (name, output) in job.outputs()?.unwrap_or_default() {
//!             for file in output.files() {
//!                 file.save_as(format!("{}_{}", name, file.file_name()))?;
//!             }
//!         }
//!     }
//!     job.delete()?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod monitoring;
pub mod session;
pub mod workflow;

// Re-export commonly used types
pub use client::{Job, JobOutput, JobState, OutputFile, Service, ServiceInfo};
pub use error::{CeriseError, Result};
pub use monitoring::{JobWatcher, WatchReport};
pub use session::Session;
pub use workflow::{load_workflow, CwlDocument};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "cerise";
