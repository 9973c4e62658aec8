//! Shared helpers for tests that talk to a mock Cerise service.
//!
//! The client is blocking, so everything that creates, uses or drops a
//! `Service` runs on a blocking thread via [`blocking`].

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use cerise_client::Service;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Word-count workflow used by most tests.
pub const WC_WORKFLOW: &str = "cwlVersion: v1.0
class: Workflow
inputs:
  input_file: File
outputs:
  output:
    type: File
    outputSource: wc/output
steps:
  wc:
    run: wc.cwl
    in:
      file: input_file
    out: [output]
";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub async fn start_server() -> MockServer {
    init_logging();
    MockServer::start().await
}

/// A service handle pointing at the mock server.
pub fn service_for(port: u16) -> Service {
    Service::new("http://127.0.0.1", port).unwrap()
}

/// Runs blocking client code off the async runtime.
pub async fn blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

/// A job record as the service returns it.
pub fn record(base: &str, id: &str, name: &str, state: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "workflow": format!("{}/files/input/{}/wc.cwl", base, name),
        "input": {},
        "state": state,
        "output": {},
        "log": format!("{}/files/output/{}/stderr.txt", base, id),
    })
}

/// Writes the workflow and an input file into `dir`.
pub fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let workflow = dir.join("wc.cwl");
    fs::write(&workflow, WC_WORKFLOW).unwrap();

    let data = dir.join("data.txt");
    fs::write(&data, "one\ntwo\nthree\n").unwrap();

    (workflow, data)
}
