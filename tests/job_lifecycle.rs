//! Submitting, following and collecting a job against a mock service.

mod common;

use std::fs;
use std::time::Duration;

use cerise_client::{CeriseError, Job, JobState, JobWatcher};
use common::{blocking, record, service_for, start_server, write_inputs};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_uploads(server: &MockServer) {
    Mock::given(method("MKCOL"))
        .and(path("/files/input/wc/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/files/input/wc/wc.cwl"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/files/input/wc/data.txt"))
        .and(body_string("one\ntwo\nthree\n"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_record(server: &MockServer, id: &str, name: &str, state: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/jobs/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(
            &server.uri(),
            id,
            name,
            state,
        )))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_submit_job() {
    let server = start_server().await;
    let base = server.uri();
    mount_uploads(&server).await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(body_partial_json(json!({
            "name": "wc",
            "workflow": format!("{}/files/input/wc/wc.cwl", base),
            "input": {
                "input_file": {
                    "class": "File",
                    "location": format!("{}/files/input/wc/data.txt", base),
                }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(record(&base, "abc", "wc", "Waiting")))
        .expect(1)
        .mount(&server)
        .await;
    mount_record(&server, "abc", "wc", "Running").await;

    let port = server.address().port();
    let (id, state, running) = blocking(move || {
        let temp_dir = tempdir().unwrap();
        let (workflow, data) = write_inputs(temp_dir.path());

        let mut job = service_for(port).create_job("wc").unwrap();
        job.set_workflow(&workflow).unwrap();
        job.add_input_file("input_file", &data).unwrap();
        let id = job.run().unwrap();

        (id, job.state().unwrap(), job.is_running().unwrap())
    })
    .await;

    assert_eq!(id, "abc");
    assert_eq!(state, Some(JobState::Running));
    assert!(running);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_without_required_input() {
    let server = start_server().await;
    Mock::given(method("MKCOL"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let port = server.address().port();
    let result = blocking(move || {
        let temp_dir = tempdir().unwrap();
        let (workflow, _) = write_inputs(temp_dir.path());

        let mut job = service_for(port).create_job("wc").unwrap();
        job.set_workflow(&workflow).unwrap();
        job.run()
    })
    .await;

    match result {
        Err(CeriseError::InvalidJob(message)) => assert!(message.contains("input_file")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_service_rejects_job() {
    let server = start_server().await;
    mount_uploads(&server).await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid input"))
        .mount(&server)
        .await;

    let port = server.address().port();
    let (result, id) = blocking(move || {
        let temp_dir = tempdir().unwrap();
        let (workflow, data) = write_inputs(temp_dir.path());

        let mut job = service_for(port).create_job("wc").unwrap();
        job.set_workflow(&workflow).unwrap();
        job.add_input_file("input_file", &data).unwrap();
        let result = job.run();
        (result, job.id().map(str::to_string))
    })
    .await;

    match result {
        Err(CeriseError::InvalidJob(message)) => assert!(message.contains("invalid input")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(id, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_outputs_of_finished_job() {
    let server = start_server().await;
    let base = server.uri();

    let mut finished = record(&base, "abc", "wc", "Success");
    finished["output"] = json!({
        "output": {
            "class": "File",
            "location": format!("{}/files/output/abc/output.txt", base),
            "secondaryFiles": [{
                "class": "File",
                "location": format!("{}/files/output/abc/output.idx", base),
            }],
        },
        "lines": 3,
    });
    Mock::given(method("GET"))
        .and(path("/jobs/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(finished))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/output/abc/output.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("3 data.txt\n"))
        .mount(&server)
        .await;

    let port = server.address().port();
    let (names, text, saved, secondary, lines) = blocking(move || {
        let job = Job::with_id(service_for(port), "wc", "abc");
        let outputs = job.outputs().unwrap().unwrap();
        let names: Vec<String> = outputs.keys().cloned().collect();

        let file = outputs["output"].as_file().unwrap();
        let text = file.text().unwrap();

        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join(file.file_name());
        file.save_as(&target).unwrap();
        let saved = fs::read_to_string(&target).unwrap();

        let secondary: Vec<String> = file
            .secondary_files()
            .iter()
            .map(|f| f.file_name().to_string())
            .collect();
        let lines = outputs["lines"].as_file().is_none();

        (names, text, saved, secondary, lines)
    })
    .await;

    assert_eq!(names, vec!["lines".to_string(), "output".to_string()]);
    assert_eq!(text, "3 data.txt\n");
    assert_eq!(saved, "3 data.txt\n");
    assert_eq!(secondary, vec!["output.idx".to_string()]);
    assert!(lines);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_outputs_while_running() {
    let server = start_server().await;
    mount_record(&server, "abc", "wc", "Running").await;

    let port = server.address().port();
    let outputs = blocking(move || {
        let job = Job::with_id(service_for(port), "wc", "abc");
        job.outputs().unwrap().is_none()
    })
    .await;

    assert!(outputs);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_output_file() {
    let server = start_server().await;
    let base = server.uri();

    let mut finished = record(&base, "abc", "wc", "Success");
    finished["output"] = json!({
        "output": {
            "class": "File",
            "location": format!("{}/files/output/abc/output.txt", base),
        }
    });
    Mock::given(method("GET"))
        .and(path("/jobs/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(finished))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/output/abc/output.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let port = server.address().port();
    let result = blocking(move || {
        let job = Job::with_id(service_for(port), "wc", "abc");
        let outputs = job.outputs().unwrap().unwrap();
        outputs["output"].as_file().unwrap().content()
    })
    .await;

    assert!(matches!(result, Err(CeriseError::MissingOutput(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_job_log() {
    let server = start_server().await;
    mount_record(&server, "abc", "wc", "PermanentFailure").await;
    Mock::given(method("GET"))
        .and(path("/files/output/abc/stderr.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("wc: data.txt: No such file\n"))
        .mount(&server)
        .await;

    let port = server.address().port();
    let log = blocking(move || Job::with_id(service_for(port), "wc", "abc").log().unwrap()).await;

    assert!(log.contains("No such file"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_and_delete() {
    let server = start_server().await;
    Mock::given(method("POST"))
        .and(path("/jobs/abc/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/jobs/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/files/input/wc/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let port = server.address().port();
    let (id, state) = blocking(move || {
        let mut job = Job::with_id(service_for(port), "wc", "abc");
        job.cancel().unwrap();
        job.delete().unwrap();
        (job.id().map(str::to_string), job.state().unwrap())
    })
    .await;

    assert_eq!(id, None);
    assert_eq!(state, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wait_until_finished() {
    let server = start_server().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/jobs/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(&base, "abc", "wc", "Running")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_record(&server, "abc", "wc", "Success").await;

    let port = server.address().port();
    let state = blocking(move || {
        Job::with_id(service_for(port), "wc", "abc")
            .wait(Duration::from_millis(10))
            .unwrap()
    })
    .await;

    assert_eq!(state, JobState::Success);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_several_jobs() {
    let server = start_server().await;
    mount_record(&server, "a1", "good", "Success").await;
    mount_record(&server, "b2", "bad", "PermanentFailure").await;

    let port = server.address().port();
    let (all_succeeded, unsuccessful, good) = blocking(move || {
        let service = service_for(port);
        let jobs = vec![
            Job::with_id(service.clone(), "good", "a1"),
            Job::with_id(service, "bad", "b2"),
        ];

        let mut watcher = JobWatcher::new();
        watcher.set_poll_interval(Duration::from_millis(10));
        let report = watcher.watch(jobs);

        let unsuccessful: Vec<String> =
            report.unsuccessful().iter().map(|s| s.to_string()).collect();
        (report.all_succeeded(), unsuccessful, report.outcomes["good"].clone())
    })
    .await;

    assert!(!all_succeeded);
    assert_eq!(unsuccessful, vec!["bad".to_string()]);
    assert_eq!(good, Ok(JobState::Success));
}
