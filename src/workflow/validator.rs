//! Workflow Validation
//!
//! Structural checks for CWL documents:
//! - Version and identifier checks
//! - Step input and outputSource reference integrity
//! - Step dependency graph (no cycles) and topological ordering

use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, info, warn};

use super::model::{CwlDocument, StepRun, WorkflowStep};

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingVersion,
    NoSteps,
    DuplicateId(String),
    EmptyRun(String),
    UnknownSource { step: String, source: String },
    UnknownOutputSource { output: String, source: String },
    CyclicDependency,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVersion => write!(f, "Document has no cwlVersion"),
            Self::NoSteps => write!(f, "Workflow has no steps"),
            Self::DuplicateId(id) => write!(f, "Duplicate identifier: '{}'", id),
            Self::EmptyRun(step) => write!(f, "Step '{}' has no 'run' reference", step),
            Self::UnknownSource { step, source } => {
                write!(f, "Step '{}' reads from unknown source '{}'", step, source)
            }
            Self::UnknownOutputSource { output, source } => {
                write!(f, "Output '{}' refers to unknown source '{}'", output, source)
            }
            Self::CyclicDependency => {
                write!(f, "Workflow contains cyclic dependencies (steps depend on each other in a loop)")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks whether `source` names a workflow input or a declared step port.
fn source_exists(document: &CwlDocument, source: &str) -> bool {
    match source.split_once('/') {
        Some((step_id, port)) => document
            .step(step_id)
            .map(|step| step.has_output(port))
            .unwrap_or(false),
        None => document.has_input(source),
    }
}

/// Validates a single step's fields and input bindings.
fn validate_step(document: &CwlDocument, step: &WorkflowStep) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let StepRun::Reference(run) = &step.run {
        if run.trim().is_empty() {
            errors.push(ValidationError::EmptyRun(step.id.clone()));
        }
    }

    for input in &step.inputs {
        for source in &input.source {
            if !source_exists(document, source) {
                errors.push(ValidationError::UnknownSource {
                    step: step.id.clone(),
                    source: source.clone(),
                });
            }
        }

        if input.source.is_empty() && input.default.is_none() && input.value_from.is_none() {
            debug!("Step '{}': input '{}' has no binding", step.id, input.id);
        }
    }

    if step.out.is_empty() {
        debug!("Step '{}' declares no outputs", step.id);
    }

    errors
}

/// Collects every structural problem in a document.
pub fn find_problems(document: &CwlDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if document.cwl_version.trim().is_empty() {
        errors.push(ValidationError::MissingVersion);
    } else if !document.cwl_version.starts_with("v1.") {
        warn!(
            "cwlVersion '{}' may not be supported by the service",
            document.cwl_version
        );
    }

    // Inputs, outputs and steps share one namespace
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let ids = document
        .inputs
        .iter()
        .map(|i| i.id.as_str())
        .chain(document.outputs.iter().map(|o| o.id.as_str()))
        .chain(document.steps.iter().map(|s| s.id.as_str()));
    for id in ids {
        if !seen_ids.insert(id) {
            errors.push(ValidationError::DuplicateId(id.to_string()));
        }
    }

    if !document.is_workflow() {
        return errors;
    }

    if document.steps.is_empty() {
        errors.push(ValidationError::NoSteps);
    }

    for step in &document.steps {
        errors.extend(validate_step(document, step));
    }

    for output in &document.outputs {
        for source in &output.output_source {
            if !source_exists(document, source) {
                errors.push(ValidationError::UnknownOutputSource {
                    output: output.id.clone(),
                    source: source.clone(),
                });
            }
        }
    }

    // Duplicate step ids would merge graph nodes and fake a cycle
    let has_duplicates = errors
        .iter()
        .any(|e| matches!(e, ValidationError::DuplicateId(_)));
    if !has_duplicates {
        if let Err(e) = execution_order(document) {
            errors.push(e);
        }
    }

    errors
}

/// Validates the entire document structure.
///
/// Performs the following checks:
/// 1. A cwlVersion is declared
/// 2. No duplicate identifiers
/// 3. Workflows have at least one step, each with a `run`
/// 4. All step sources and outputSources point at existing ports
/// 5. No cyclic dependencies between steps
pub fn validate_workflow(document: &CwlDocument) -> Result<(), String> {
    info!(
        "Validating {:?} with {} steps",
        document.class,
        document.steps.len()
    );

    let errors = find_problems(document);
    if !errors.is_empty() {
        let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(error_messages.join("\n"));
    }

    info!(
        "Workflow validated: {} inputs, {} outputs, {} steps",
        document.inputs.len(),
        document.outputs.len(),
        document.steps.len()
    );
    Ok(())
}

/// Orders step ids so that every step comes after the steps it reads from,
/// using Kahn's algorithm. Ties keep document order.
pub fn execution_order(document: &CwlDocument) -> Result<Vec<String>, ValidationError> {
    // Build in-degree map and successor lists
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

    for step in &document.steps {
        in_degree.entry(step.id.as_str()).or_insert(0);
        for upstream in step.upstream_steps() {
            if document.step(upstream).is_none() {
                continue;
            }
            *in_degree.entry(step.id.as_str()).or_insert(0) += 1;
            successors.entry(upstream).or_default().push(step.id.as_str());
        }
    }

    // Start with root steps (in-degree = 0)
    let mut queue: VecDeque<&str> = document
        .steps
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| in_degree.get(id).copied() == Some(0))
        .collect();

    let mut sorted_order: Vec<String> = Vec::new();

    while let Some(current_id) = queue.pop_front() {
        sorted_order.push(current_id.to_string());

        for successor_id in successors.get(current_id).cloned().unwrap_or_default() {
            if let Some(degree) = in_degree.get_mut(successor_id) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(successor_id);
                }
            }
        }
    }

    if sorted_order.len() != document.steps.len() {
        return Err(ValidationError::CyclicDependency);
    }

    Ok(sorted_order)
}
