//! Jobs
//!
//! A [`Job`] is built up locally (workflow, input files, input values),
//! submitted with [`Job::run`], and afterwards queried for its state,
//! outputs and log.
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
//!     let mut job = service.create_job("count_lines")?;
//!     job.set_workflow("wc.cwl")?;
//!     job.add_input_file("input_file", "data.txt")?;
//!     job.run()?;
//!
//!     let state = job.wait(Duration::from_secs(5))?;
//!     if state.is_success() {
//!         if let Some(outputs) = job.outputs()? {
//!             if let Some(counts) = outputs.get("counts").and_then(|o| o.as_file()) {
//!                 counts.save_as("counts.txt")?;
//!             }
//!         }
//!     } else {
//!         eprintln!("{}", job.log()?);
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use serde_json::{Map, Value};

use super::output_file::JobOutput;
use super::record::{file_object, is_file_object, JobDescription, JobRecord, JobState};
use super::service::Service;
use super::store;
use crate::error::{CeriseError, Result};
use crate::workflow::{read_workflow, CwlDocument, InputParameter};

/// What an uploaded file is used for within a job.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FileRole {
    Workflow,
    Input(String),
    Secondary(String),
}

impl FileRole {
    /// Returns true if uploading for `self` supersedes a file held for
    /// `other`. Setting an input again drops its old secondary files too.
    fn replaces(&self, other: &FileRole) -> bool {
        match (self, other) {
            (Self::Workflow, Self::Workflow) => true,
            (Self::Input(a), Self::Input(b)) | (Self::Input(a), Self::Secondary(b)) => a == b,
            _ => false,
        }
    }
}

/// A file uploaded into the job's input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Upload {
    role: FileRole,
    /// Canonical local path the file was read from
    source: PathBuf,
}

/// A job on a Cerise service.
#[derive(Debug, Clone)]
pub struct Job {
    service: Service,
    name: String,
    id: Option<String>,
    workflow_url: Option<String>,
    /// The workflow as parsed locally; absent for jobs fetched from the service
    workflow: Option<CwlDocument>,
    input_desc: Map<String, Value>,
    /// Uploaded file names, to catch name clashes
    uploads: HashMap<String, Upload>,
    /// Set once the job's files were removed from the service
    deleted: bool,
}

impl Job {
    /// Creates the local side of a fresh job. Use [`Service::create_job`]
    /// to create one on the service.
    pub(crate) fn new(service: Service, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
            id: None,
            workflow_url: None,
            workflow: None,
            input_desc: Map::new(),
            uploads: HashMap::new(),
            deleted: false,
        }
    }

    /// Creates a handle for an already submitted job with a known id.
    pub fn with_id(service: Service, name: impl Into<String>, id: impl Into<String>) -> Self {
        let mut job = Self::new(service, name);
        job.id = Some(id.into());
        job
    }

    pub(crate) fn from_record(service: Service, record: JobRecord) -> Self {
        let input_desc = record.input_object();
        let mut job = Self::with_id(service, record.name, record.id);
        if !record.workflow.is_empty() {
            job.workflow_url = Some(record.workflow);
        }
        job.input_desc = input_desc;
        job
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service-assigned id, once the job has been submitted.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    /// URL of the uploaded workflow, if one was set.
    pub fn workflow_url(&self) -> Option<&str> {
        self.workflow_url.as_deref()
    }

    /// The locally parsed workflow, if it was set through this handle.
    pub fn workflow(&self) -> Option<&CwlDocument> {
        self.workflow.as_ref()
    }

    /// The input object that will be (or was) submitted.
    pub fn input_desc(&self) -> &Map<String, Value> {
        &self.input_desc
    }

    /// Sets the workflow to run.
    ///
    /// The file is parsed locally, so that input names and types can be
    /// checked, and then uploaded. If called repeatedly, the last workflow
    /// is used. Its file name must differ from those of the input files.
    pub fn set_workflow(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.ensure_not_submitted()?;

        let document = read_workflow(path)?;
        let url = self.upload_all(&[path], FileRole::Workflow)?.remove(0);

        info!("Job '{}': workflow set to {}", self.name, url);
        self.workflow = Some(document);
        self.workflow_url = Some(url);
        Ok(())
    }

    /// Uploads `path` and uses it as the value of File input `input_name`.
    ///
    /// If called repeatedly for the same input, the last file is used. For
    /// an array input the file becomes a one-element array.
    pub fn add_input_file(&mut self, input_name: &str, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_not_submitted()?;
        let as_array = match self.check_input(input_name, "File")? {
            Some(param) => param.param_type.is_file_array(),
            None => false,
        };

        let url = self
            .upload_all(&[path.as_ref()], FileRole::Input(input_name.to_string()))?
            .remove(0);
        let file = file_object(&url);

        let value = if as_array { Value::Array(vec![file]) } else { file };
        self.input_desc.insert(input_name.to_string(), value);
        Ok(())
    }

    /// Uploads several files and uses them as the value of array input
    /// `input_name`, in the given order.
    pub fn add_input_files<P: AsRef<Path>>(&mut self, input_name: &str, paths: &[P]) -> Result<()> {
        self.ensure_not_submitted()?;
        if let Some(param) = self.check_input(input_name, "File[]")? {
            if param.param_type.is_file() {
                return Err(CeriseError::WrongInputType {
                    input: input_name.to_string(),
                    expected: param.param_type.to_string(),
                    given: "File[]".to_string(),
                });
            }
        }

        let paths: Vec<&Path> = paths.iter().map(|p| p.as_ref()).collect();
        let files = self
            .upload_all(&paths, FileRole::Input(input_name.to_string()))?
            .iter()
            .map(|url| file_object(url))
            .collect();

        self.input_desc
            .insert(input_name.to_string(), Value::Array(files));
        Ok(())
    }

    /// Uploads `path` as a secondary file of the File already set for
    /// `input_name` (for example an index next to the data file).
    ///
    /// For a `File[]` input the secondary file is attached to the last file
    /// of the array, so each file's companions are added right after it.
    pub fn add_secondary_file(&mut self, input_name: &str, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_not_submitted()?;

        if primary_file(&mut self.input_desc, input_name).is_none() {
            return Err(CeriseError::NoPrimaryFile(input_name.to_string()));
        }

        let url = self
            .upload_all(&[path.as_ref()], FileRole::Secondary(input_name.to_string()))?
            .remove(0);

        if let Some(primary) = primary_file(&mut self.input_desc, input_name) {
            let secondary = primary
                .entry("secondaryFiles")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(files) = secondary {
                let file = file_object(&url);
                if !files.contains(&file) {
                    files.push(file);
                }
            }
        }
        Ok(())
    }

    /// Sets the value of a non-File input.
    pub fn set_input(&mut self, input_name: &str, value: impl Into<Value>) -> Result<()> {
        self.ensure_not_submitted()?;
        let value = value.into();

        if let Some(param) = self.check_input(input_name, "a value")? {
            let ok = if is_file_object(&value) {
                param.param_type.accepts_files()
            } else {
                param.param_type.accepts_values()
            };
            if !ok {
                return Err(CeriseError::WrongInputType {
                    input: input_name.to_string(),
                    expected: param.param_type.to_string(),
                    given: describe_value(&value).to_string(),
                });
            }
        }

        debug!("Job '{}': input '{}' = {}", self.name, input_name, value);
        self.input_desc.insert(input_name.to_string(), value);
        Ok(())
    }

    /// Submits the job to the service and returns its id.
    pub fn run(&mut self) -> Result<String> {
        self.ensure_not_submitted()?;

        let workflow_url = self
            .workflow_url
            .as_deref()
            .ok_or_else(|| CeriseError::InvalidJob(format!("job '{}' has no workflow", self.name)))?;

        if let Some(workflow) = &self.workflow {
            let missing: Vec<&str> = workflow
                .required_inputs()
                .into_iter()
                .map(|i| i.id.as_str())
                .filter(|id| !self.input_desc.contains_key(*id))
                .collect();
            if !missing.is_empty() {
                return Err(CeriseError::InvalidJob(format!(
                    "job '{}' is missing required inputs: {}",
                    self.name,
                    missing.join(", ")
                )));
            }
        }

        let description = JobDescription {
            name: &self.name,
            workflow: workflow_url,
            input: &self.input_desc,
        };
        let record = self.service.submit(&description)?;

        info!("Submitted job '{}' as {} ({})", self.name, record.id, record.state);
        self.id = Some(record.id.clone());
        Ok(record.id)
    }

    /// Current state of the job, or `None` if it has not been submitted.
    pub fn state(&self) -> Result<Option<JobState>> {
        match &self.id {
            None => Ok(None),
            Some(id) => Ok(Some(self.service.fetch_record(id)?.state)),
        }
    }

    /// Returns true while the job is waiting or running.
    pub fn is_running(&self) -> Result<bool> {
        Ok(self.state()?.map(|s| s.is_running()).unwrap_or(false))
    }

    /// Blocks until the job has finished, polling every `poll_interval`.
    pub fn wait(&self, poll_interval: Duration) -> Result<JobState> {
        let id = self.submitted_id()?;
        loop {
            let state = self.service.fetch_record(id)?.state;
            if state.is_final() {
                info!("Job '{}' finished: {}", self.name, state);
                return Ok(state);
            }
            debug!("Job '{}' is {}", self.name, state);
            thread::sleep(poll_interval);
        }
    }

    /// The job's outputs, or `None` unless it finished successfully.
    pub fn outputs(&self) -> Result<Option<BTreeMap<String, JobOutput>>> {
        let Some(id) = &self.id else {
            return Ok(None);
        };

        let record = self.service.fetch_record(id)?;
        if !record.state.is_success() {
            return Ok(None);
        }

        let outputs = match &record.output {
            Value::Object(map) => map
                .iter()
                .map(|(name, value)| {
                    (name.clone(), JobOutput::from_cwl(value, self.service.http()))
                })
                .collect(),
            _ => BTreeMap::new(),
        };
        Ok(Some(outputs))
    }

    /// The job's log as text.
    pub fn log(&self) -> Result<String> {
        let id = self.submitted_id()?;
        let record = self.service.fetch_record(id)?;

        match record.log.as_deref() {
            Some(url) if !url.is_empty() => {
                let response = store::open(self.service.http(), url)?;
                Ok(response.text()?)
            }
            _ => Ok(String::new()),
        }
    }

    /// Asks the service to cancel the job.
    pub fn cancel(&self) -> Result<()> {
        let id = self.submitted_id()?;
        self.service.cancel(id)?;
        info!("Cancellation requested for job '{}'", self.name);
        Ok(())
    }

    /// Deletes the job from the service. Afterwards the handle reports no
    /// state and cannot be run again.
    pub fn delete(&mut self) -> Result<()> {
        self.service.destroy_job(self)?;
        self.id = None;
        self.deleted = true;
        Ok(())
    }

    /// Removes the files uploaded for a job that was never submitted, and
    /// marks the handle as unusable.
    pub fn discard(&mut self) -> Result<()> {
        self.ensure_not_submitted()?;

        store::delete(self.service.http(), &self.service.input_dir_url(&self.name))?;
        info!("Discarded unsubmitted job '{}'", self.name);

        self.deleted = true;
        self.uploads.clear();
        Ok(())
    }

    fn submitted_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .ok_or_else(|| CeriseError::JobNotFound(self.name.clone()))
    }

    fn ensure_not_submitted(&self) -> Result<()> {
        if self.deleted {
            return Err(CeriseError::InvalidJob(format!(
                "job '{}' was deleted",
                self.name
            )));
        }
        match &self.id {
            Some(id) => Err(CeriseError::InvalidJob(format!(
                "job '{}' was already submitted as {}",
                self.name, id
            ))),
            None => Ok(()),
        }
    }

    /// Looks up an input in the local workflow and checks that it accepts
    /// `given`. Returns `None` when no local workflow is available to check
    /// against.
    fn check_input(&self, input_name: &str, given: &str) -> Result<Option<&InputParameter>> {
        let Some(workflow) = &self.workflow else {
            if self.workflow_url.is_none() {
                return Err(CeriseError::UnknownInput {
                    input: input_name.to_string(),
                });
            }
            return Ok(None);
        };

        let param = workflow
            .input(input_name)
            .ok_or_else(|| CeriseError::UnknownInput {
                input: input_name.to_string(),
            })?;

        if given.starts_with("File") && !param.param_type.accepts_files() {
            return Err(CeriseError::WrongInputType {
                input: input_name.to_string(),
                expected: param.param_type.to_string(),
                given: given.to_string(),
            });
        }
        Ok(Some(param))
    }

    /// Uploads local files for one role into the job's input directory,
    /// returning their URLs in order.
    ///
    /// All names are checked before anything is sent. A name may be reused
    /// for the same file and role, or when the new role replaces the old
    /// one; files no longer referenced by a replaced role are forgotten.
    fn upload_all(&mut self, paths: &[&Path], role: FileRole) -> Result<Vec<String>> {
        let mut planned: Vec<(String, PathBuf)> = Vec::with_capacity(paths.len());
        for path in paths {
            let name = upload_name(path)?;
            let source = path.canonicalize()?;

            // Files in one batch would overwrite each other on the service
            if planned.iter().any(|(n, _)| *n == name) {
                return Err(CeriseError::DuplicateFileName(name));
            }
            if let Some(existing) = self.uploads.get(&name) {
                let same_file = existing.role == role && existing.source == source;
                if !same_file && !role.replaces(&existing.role) {
                    return Err(CeriseError::DuplicateFileName(name));
                }
            }
            planned.push((name, source));
        }

        let dir_url = self.service.input_dir_url(&self.name);
        let mut urls = Vec::with_capacity(planned.len());
        for (path, (name, _)) in paths.iter().zip(&planned) {
            let url = format!("{}{}", dir_url, name);
            store::put_file(self.service.http(), &url, path)?;
            debug!("Uploaded {} to {}", path.display(), url);
            urls.push(url);
        }

        self.uploads.retain(|name, upload| {
            !role.replaces(&upload.role) || planned.iter().any(|(n, _)| n == name)
        });
        for (name, source) in planned {
            self.uploads.insert(
                name,
                Upload {
                    role: role.clone(),
                    source,
                },
            );
        }
        Ok(urls)
    }
}

/// The File object a secondary file of `input_name` attaches to: the
/// input's File, or the last File of a `File[]` input.
fn primary_file<'a>(
    input_desc: &'a mut Map<String, Value>,
    input_name: &str,
) -> Option<&'a mut Map<String, Value>> {
    let value = input_desc.get_mut(input_name)?;
    let file = match value {
        Value::Array(items) => items.last_mut()?,
        other => other,
    };
    if !is_file_object(file) {
        return None;
    }
    file.as_object_mut()
}

/// Name under which a local file is stored on the service.
fn upload_name(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(CeriseError::FileNotFound(PathBuf::from(path)));
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| CeriseError::FileNotFound(PathBuf::from(path)))
}

fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) if is_file_object(value) => "File",
        Value::Object(_) => "record",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::parse_workflow;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn offline_service() -> Service {
        Service::new("http://127.0.0.1", 1).unwrap()
    }

    fn job_with_workflow(cwl: &str) -> Job {
        let mut job = Job::new(offline_service(), "local_job");
        job.workflow = Some(parse_workflow(cwl).unwrap());
        job.workflow_url = Some("http://127.0.0.1:1/files/input/local_job/wf.cwl".to_string());
        job
    }

    const TOOL: &str = "cwlVersion: v1.0
class: CommandLineTool
inputs:
  pdb: File
  frames: File[]
  force_field: string
  sim_time: double?
outputs: []
";

    #[test]
    fn test_new_job() {
        let job = Job::new(offline_service(), "test_job");
        assert_eq!(job.name(), "test_job");
        assert!(job.id().is_none());
        assert!(job.workflow_url().is_none());
        assert!(job.state().unwrap().is_none());
        assert!(!job.is_running().unwrap());
    }

    #[test]
    fn test_set_input() {
        let mut job = job_with_workflow(TOOL);
        job.set_input("force_field", "amberSB99").unwrap();
        job.set_input("sim_time", 0.0001).unwrap();
        assert_eq!(job.input_desc()["force_field"], json!("amberSB99"));
        assert_eq!(job.input_desc()["sim_time"], json!(0.0001));
    }

    #[test]
    fn test_set_unknown_input() {
        let mut job = job_with_workflow(TOOL);
        let result = job.set_input("temperature", 300);
        assert!(matches!(result, Err(CeriseError::UnknownInput { .. })));
    }

    #[test]
    fn test_set_input_without_workflow() {
        let mut job = Job::new(offline_service(), "no_workflow");
        let result = job.set_input("time", 10);
        assert!(matches!(result, Err(CeriseError::UnknownInput { .. })));
    }

    #[test]
    fn test_set_value_on_file_input() {
        let mut job = job_with_workflow(TOOL);
        let err = job.set_input("pdb", "protein.pdb").unwrap_err();
        match err {
            CeriseError::WrongInputType { expected, given, .. } => {
                assert_eq!(expected, "File");
                assert_eq!(given, "string");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_file_on_value_input() {
        let mut job = job_with_workflow(TOOL);
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ff.txt");
        fs::write(&path, "x").unwrap();

        let result = job.add_input_file("force_field", &path);
        assert!(matches!(result, Err(CeriseError::WrongInputType { .. })));
    }

    #[test]
    fn test_add_missing_input_file() {
        let mut job = job_with_workflow(TOOL);
        let result = job.add_input_file("pdb", "/nonexistent/protein.pdb");
        assert!(matches!(result, Err(CeriseError::FileNotFound(_))));
    }

    #[test]
    fn test_add_input_files_to_single_file_input() {
        let mut job = job_with_workflow(TOOL);
        let result = job.add_input_files("pdb", &["a.pdb", "b.pdb"]);
        assert!(matches!(result, Err(CeriseError::WrongInputType { .. })));
    }

    #[test]
    fn test_add_input_files_duplicate_names() {
        let mut job = job_with_workflow(TOOL);
        let temp_dir = tempdir().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("frame.xtc"), "1").unwrap();
        fs::write(b.join("frame.xtc"), "2").unwrap();

        let result = job.add_input_files("frames", &[a.join("frame.xtc"), b.join("frame.xtc")]);
        assert!(matches!(result, Err(CeriseError::DuplicateFileName(_))));
    }

    #[test]
    fn test_secondary_file_without_primary() {
        let mut job = job_with_workflow(TOOL);
        let result = job.add_secondary_file("pdb", "/nonexistent/protein.pdb.idx");
        assert!(matches!(result, Err(CeriseError::NoPrimaryFile(_))));
    }

    #[test]
    fn test_primary_file_of_file_array() {
        let mut desc = Map::new();
        desc.insert(
            "frames".to_string(),
            json!([file_object("http://h/a.xtc"), file_object("http://h/b.xtc")]),
        );
        desc.insert("pdb".to_string(), file_object("http://h/p.pdb"));
        desc.insert("time".to_string(), json!(10));
        desc.insert("empty".to_string(), json!([]));

        let last = primary_file(&mut desc, "frames").unwrap();
        assert_eq!(last["location"], json!("http://h/b.xtc"));
        assert!(primary_file(&mut desc, "pdb").is_some());
        assert!(primary_file(&mut desc, "time").is_none());
        assert!(primary_file(&mut desc, "empty").is_none());
        assert!(primary_file(&mut desc, "missing").is_none());
    }

    #[test]
    fn test_role_replacement() {
        let input = FileRole::Input("pdb".to_string());
        assert!(FileRole::Workflow.replaces(&FileRole::Workflow));
        assert!(input.replaces(&FileRole::Input("pdb".to_string())));
        assert!(input.replaces(&FileRole::Secondary("pdb".to_string())));
        assert!(!input.replaces(&FileRole::Input("frames".to_string())));
        assert!(!input.replaces(&FileRole::Workflow));
        assert!(!FileRole::Secondary("pdb".to_string())
            .replaces(&FileRole::Secondary("pdb".to_string())));
    }

    #[test]
    fn test_different_secondary_with_same_name() {
        let mut job = job_with_workflow(TOOL);
        let temp_dir = tempdir().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("extra.itp"), "1").unwrap();
        fs::write(b.join("extra.itp"), "2").unwrap();

        // State after uploading a/extra.itp for pdb
        job.input_desc
            .insert("pdb".to_string(), file_object("http://127.0.0.1:1/p.pdb"));
        job.uploads.insert(
            "extra.itp".to_string(),
            Upload {
                role: FileRole::Secondary("pdb".to_string()),
                source: a.join("extra.itp").canonicalize().unwrap(),
            },
        );

        let result = job.add_secondary_file("pdb", b.join("extra.itp"));
        assert!(matches!(result, Err(CeriseError::DuplicateFileName(name)) if name == "extra.itp"));
        assert!(job.input_desc()["pdb"].get("secondaryFiles").is_none());
    }

    #[test]
    fn test_input_named_like_workflow() {
        let mut job = job_with_workflow(TOOL);
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("wf.cwl");
        fs::write(&path, "x").unwrap();
        job.uploads.insert(
            "wf.cwl".to_string(),
            Upload {
                role: FileRole::Workflow,
                source: temp_dir.path().join("elsewhere.cwl"),
            },
        );

        let result = job.add_input_file("pdb", &path);
        assert!(matches!(result, Err(CeriseError::DuplicateFileName(_))));
    }

    #[test]
    fn test_deleted_job_cannot_run() {
        let mut job = job_with_workflow(TOOL);
        job.deleted = true;
        assert!(matches!(job.run(), Err(CeriseError::InvalidJob(_))));
        assert!(matches!(job.set_input("force_field", "x"), Err(CeriseError::InvalidJob(_))));
    }

    #[test]
    fn test_run_without_workflow() {
        let mut job = Job::new(offline_service(), "empty");
        let result = job.run();
        assert!(matches!(result, Err(CeriseError::InvalidJob(_))));
    }

    #[test]
    fn test_run_missing_required_inputs() {
        let mut job = job_with_workflow(TOOL);
        job.set_input("force_field", "amberSB99").unwrap();
        let err = job.run().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("pdb"));
        assert!(message.contains("frames"));
        assert!(!message.contains("sim_time"));
    }

    #[test]
    fn test_submitted_job_is_read_only() {
        let mut job = Job::with_id(offline_service(), "done", "1234");
        let result = job.set_input("x", 1);
        assert!(matches!(result, Err(CeriseError::InvalidJob(_))));
        assert!(matches!(job.run(), Err(CeriseError::InvalidJob(_))));
    }

    #[test]
    fn test_unsubmitted_job_operations() {
        let job = Job::new(offline_service(), "fresh");
        assert!(matches!(job.log(), Err(CeriseError::JobNotFound(_))));
        assert!(matches!(job.cancel(), Err(CeriseError::JobNotFound(_))));
        assert!(job.outputs().unwrap().is_none());
    }

    #[test]
    fn test_from_record() {
        let record: JobRecord = serde_json::from_value(json!({
            "id": "42",
            "name": "restored",
            "workflow": "http://h/files/input/restored/wf.cwl",
            "input": {"time": 10},
            "state": "Running"
        }))
        .unwrap();
        let job = Job::from_record(offline_service(), record);
        assert_eq!(job.id(), Some("42"));
        assert_eq!(job.workflow_url(), Some("http://h/files/input/restored/wf.cwl"));
        assert_eq!(job.input_desc()["time"], json!(10));
        assert!(job.workflow().is_none());
    }

    #[test]
    fn test_describe_value() {
        assert_eq!(describe_value(&json!(1)), "int");
        assert_eq!(describe_value(&json!(1.5)), "double");
        assert_eq!(describe_value(&json!("s")), "string");
        assert_eq!(describe_value(&file_object("http://h/f")), "File");
    }
}
