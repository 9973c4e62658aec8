//! WebDAV File Store
//!
//! The service keeps job inputs in a WebDAV store under `/files`. Each job
//! gets a collection at `/files/input/{job_name}/` into which the client
//! uploads the workflow and input files.

use std::fs::File;
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};

use crate::error::{CeriseError, Result};

/// WebDAV collection creation method.
static MKCOL: Lazy<Method> =
    Lazy::new(|| Method::from_bytes(b"MKCOL").expect("MKCOL is a valid method token"));

/// Returns `response` if its status is one of `accepted`.
pub(crate) fn expect_status(response: Response, accepted: &[StatusCode]) -> Result<Response> {
    let status = response.status();
    if accepted.contains(&status) {
        Ok(response)
    } else {
        Err(CeriseError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// Creates a collection. Returns false if it already existed.
pub(crate) fn make_collection(http: &Client, url: &str) -> Result<bool> {
    debug!("MKCOL {}", url);

    let response = http.request(MKCOL.clone(), url).send()?;

    match response.status() {
        StatusCode::METHOD_NOT_ALLOWED => Ok(false),
        _ => {
            expect_status(response, &[StatusCode::CREATED, StatusCode::OK])?;
            Ok(true)
        }
    }
}

/// Uploads a local file to `url`.
pub(crate) fn put_file(http: &Client, url: &str, path: &Path) -> Result<()> {
    let file = File::open(path)?;
    debug!("PUT {} <- {}", url, path.display());

    let response = http.put(url).body(file).send()?;
    expect_status(
        response,
        &[StatusCode::CREATED, StatusCode::NO_CONTENT, StatusCode::OK],
    )?;
    Ok(())
}

/// Deletes a file or collection. Returns false if it did not exist.
pub(crate) fn delete(http: &Client, url: &str) -> Result<bool> {
    debug!("DELETE {}", url);

    let response = http.delete(url).send()?;
    match response.status() {
        StatusCode::NOT_FOUND => Ok(false),
        _ => {
            expect_status(response, &[StatusCode::NO_CONTENT, StatusCode::OK])?;
            Ok(true)
        }
    }
}

/// Opens a remote file for reading; a 404 means the file is gone.
pub(crate) fn open(http: &Client, url: &str) -> Result<Response> {
    debug!("GET {}", url);

    let response = http.get(url).send()?;
    if response.status() == StatusCode::NOT_FOUND {
        return Err(CeriseError::MissingOutput(url.to_string()));
    }
    expect_status(response, &[StatusCode::OK])
}
