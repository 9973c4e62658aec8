//! Workflow Definition Module
//!
//! Provides data structures and utilities for reading and checking CWL
//! documents before they are submitted to a service.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (CwlDocument, InputParameter, WorkflowStep)
//! - [`parser`]: YAML/JSON parsing and loading
//! - [`validator`]: Reference integrity and step ordering

pub mod model;
pub mod parser;
pub mod validator;

pub use model::{
    CwlDocument, CwlType, DocumentClass, InputParameter, OutputParameter, StepInput, StepRun,
    WorkflowStep,
};
pub use parser::{load_workflow, parse_workflow, read_workflow};
pub use validator::{execution_order, find_problems, validate_workflow, ValidationError};
