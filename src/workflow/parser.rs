//! CWL Parser
//!
//! Loads CWL documents from YAML (or JSON, which is valid YAML) files and
//! text.

use std::fs;
use std::path::Path;

use log::{debug, info};

use super::model::CwlDocument;
use super::validator::validate_workflow;
use crate::error::{CeriseError, Result};

/// Parses a CWL document from text without validating it.
pub fn parse_workflow(text: &str) -> Result<CwlDocument> {
    let document: CwlDocument = serde_yaml::from_str(text).map_err(|e| {
        CeriseError::InvalidWorkflow(format!("Failed to parse CWL document: {}", e))
    })?;

    debug!(
        "Parsed {:?} with {} inputs, {} outputs, {} steps",
        document.class,
        document.inputs.len(),
        document.outputs.len(),
        document.steps.len()
    );

    Ok(document)
}

/// Reads a CWL document from disk without validating it.
pub fn read_workflow(path: impl AsRef<Path>) -> Result<CwlDocument> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(CeriseError::FileNotFound(path.to_path_buf()));
    }

    let text = fs::read_to_string(path)?;
    debug!("CWL content loaded ({} bytes)", text.len());

    parse_workflow(&text)
}

/// Loads and validates a CWL document.
///
/// # Returns
///
/// * `Ok(CwlDocument)` - Successfully loaded and validated document
/// * `Err(FileNotFound)` - The path does not point at a file
/// * `Err(InvalidWorkflow)` - Parse or validation error
///
/// # Example
///
/// ```rust,no_run
/// use cerise_client::workflow::load_workflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("count_lines.cwl")?;
///     println!("Workflow has {} inputs", workflow.inputs.len());
///     Ok(())
/// }
/// ```
pub fn load_workflow(path: impl AsRef<Path>) -> Result<CwlDocument> {
    let path = path.as_ref();
    info!("Loading workflow from: {}", path.display());

    let document = read_workflow(path)?;
    validate_workflow(&document).map_err(CeriseError::InvalidWorkflow)?;

    Ok(document)
}

/// Serializes a CWL document to YAML.
pub fn to_yaml(document: &CwlDocument) -> Result<String> {
    serde_yaml::to_string(document)
        .map_err(|e| CeriseError::InvalidWorkflow(format!("Failed to serialize CWL: {}", e)))
}
