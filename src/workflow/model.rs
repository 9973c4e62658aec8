//! CWL Document Model
//!
//! Data structures for the parts of a CWL v1.0 document the client works
//! with: typed inputs, outputs wired to step ports, and steps.
//!
//! # Example CWL
//!
//! ```yaml
//! cwlVersion: v1.0
//! class: Workflow
//!
//! inputs:
//!   input_file: File
//!
//! outputs:
//!   counts:
//!     type: File
//!     outputSource: wc/output
//!
//! steps:
//!   wc:
//!     run: wc.cwl
//!     in:
//!       file: input_file
//!     out: [output]
//! ```
//!
//! CWL allows the same structure to be spelled several ways (maps keyed by
//! id, lists of objects with an `id` field, plain type strings). All of
//! them are normalised into the list-of-structs form used here.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind of process a CWL document describes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentClass {
    Workflow,
    CommandLineTool,
    ExpressionTool,
}

/// A CWL parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CwlType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    File,
    Directory,
    Any,
    /// `T[]` or `{type: array, items: T}`
    Array(Box<CwlType>),
    /// `T?` or `[null, T]`
    Optional(Box<CwlType>),
    /// Records, enums and anything else the client passes through untouched
    Other(String),
}

impl CwlType {
    /// Parses a CWL type string such as `File`, `int?` or `File[]`.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();

        if let Some(inner) = name.strip_suffix('?') {
            return Self::Optional(Box::new(Self::parse(inner)));
        }
        if let Some(inner) = name.strip_suffix("[]") {
            return Self::Array(Box::new(Self::parse(inner)));
        }

        match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "string" => Self::String,
            "File" => Self::File,
            "Directory" => Self::Directory,
            "Any" => Self::Any,
            other => Self::Other(other.to_string()),
        }
    }

    /// Builds a type from any of the JSON/YAML spellings CWL allows.
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(Self::parse(s)),
            Value::Array(options) => {
                let mut optional = false;
                let mut types = Vec::new();
                for option in options {
                    match Self::from_value(option)? {
                        Self::Null => optional = true,
                        t => types.push(t),
                    }
                }
                let inner = match types.len() {
                    0 => Self::Null,
                    1 => types.remove(0),
                    _ => Self::Other("union".to_string()),
                };
                if optional && inner != Self::Null {
                    Ok(Self::Optional(Box::new(inner)))
                } else {
                    Ok(inner)
                }
            }
            Value::Object(map) => match map.get("type").and_then(Value::as_str) {
                Some("array") => {
                    let items = map
                        .get("items")
                        .ok_or_else(|| "Array type without 'items'".to_string())?;
                    Ok(Self::Array(Box::new(Self::from_value(items)?)))
                }
                Some(other) => Ok(Self::Other(other.to_string())),
                None => Err("Type object without 'type' field".to_string()),
            },
            _ => Err(format!("Unsupported type declaration: {}", value)),
        }
    }

    /// Returns true if the type is optional (`T?` or a union with null).
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_) | Self::Null | Self::Any)
    }

    /// Strips a single layer of optionality.
    pub fn required(&self) -> &CwlType {
        match self {
            Self::Optional(inner) => inner,
            other => other,
        }
    }

    /// Returns true if values of this type are a single `File`.
    pub fn is_file(&self) -> bool {
        matches!(self.required(), Self::File)
    }

    /// Returns true if values of this type are an array of `File`s.
    pub fn is_file_array(&self) -> bool {
        matches!(self.required(), Self::Array(inner) if inner.is_file())
    }

    /// Returns true if File objects may be given for this type.
    pub fn accepts_files(&self) -> bool {
        self.is_file() || self.is_file_array() || matches!(self.required(), Self::Any | Self::Other(_))
    }

    /// Returns true if plain (non-File) values may be given for this type.
    pub fn accepts_values(&self) -> bool {
        !(self.is_file() || self.is_file_array())
    }
}

impl fmt::Display for CwlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean => write!(f, "boolean"),
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::String => write!(f, "string"),
            Self::File => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
            Self::Any => write!(f, "Any"),
            Self::Array(inner) => write!(f, "{}[]", inner),
            Self::Optional(inner) => write!(f, "{}?", inner),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for CwlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CwlType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(de::Error::custom)
    }
}

impl Default for CwlType {
    fn default() -> Self {
        Self::Any
    }
}

/// A workflow or tool input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InputParameter {
    pub id: String,

    #[serde(rename = "type", default)]
    pub param_type: CwlType,

    /// Patterns for files that accompany the primary file
    #[serde(
        rename = "secondaryFiles",
        deserialize_with = "single_or_vec",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub secondary_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl InputParameter {
    /// Creates an input with the given id and type string.
    pub fn new(id: impl Into<String>, param_type: &str) -> Self {
        Self {
            id: id.into(),
            param_type: CwlType::parse(param_type),
            secondary_files: Vec::new(),
            default: None,
            doc: None,
        }
    }

    /// Returns true if a job must supply a value for this input.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.param_type.is_optional()
    }
}

/// A workflow or tool output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputParameter {
    pub id: String,

    #[serde(rename = "type", default)]
    pub param_type: CwlType,

    /// `step/port` references (or workflow input names) producing this output
    #[serde(
        rename = "outputSource",
        deserialize_with = "single_or_vec",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub output_source: Vec<String>,
}

/// Binding of a step input port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepInput {
    pub id: String,

    #[serde(deserialize_with = "single_or_vec", default, skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(rename = "valueFrom", default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<String>,
}

/// The process a step runs: a reference to another document or an
/// embedded one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StepRun {
    Reference(String),
    Inline(Box<CwlDocument>),
}

/// A named step of a workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowStep {
    pub id: String,

    pub run: StepRun,

    #[serde(rename = "in", deserialize_with = "step_inputs", default)]
    pub inputs: Vec<StepInput>,

    #[serde(deserialize_with = "output_ports", default)]
    pub out: Vec<String>,
}

impl WorkflowStep {
    /// Returns true if the step declares the given output port.
    pub fn has_output(&self, port: &str) -> bool {
        self.out.iter().any(|p| p == port)
    }

    /// Ids of the steps whose outputs feed this step.
    pub fn upstream_steps(&self) -> Vec<&str> {
        let mut steps: Vec<&str> = self
            .inputs
            .iter()
            .flat_map(|i| i.source.iter())
            .filter_map(|s| s.split_once('/').map(|(step, _)| step))
            .collect();
        steps.sort_unstable();
        steps.dedup();
        steps
    }
}

/// A parsed CWL document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CwlDocument {
    #[serde(rename = "cwlVersion", default)]
    pub cwl_version: String,

    pub class: DocumentClass,

    #[serde(deserialize_with = "input_parameters", default)]
    pub inputs: Vec<InputParameter>,

    #[serde(deserialize_with = "output_parameters", default)]
    pub outputs: Vec<OutputParameter>,

    #[serde(deserialize_with = "workflow_steps", default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<WorkflowStep>,
}

impl CwlDocument {
    /// Creates an empty document of the given class.
    pub fn new(class: DocumentClass) -> Self {
        Self {
            cwl_version: "v1.0".to_string(),
            class,
            inputs: Vec::new(),
            outputs: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn is_workflow(&self) -> bool {
        self.class == DocumentClass::Workflow
    }

    /// Gets an input by id.
    pub fn input(&self, id: &str) -> Option<&InputParameter> {
        self.inputs.iter().find(|i| i.id == id)
    }

    pub fn has_input(&self, id: &str) -> bool {
        self.input(id).is_some()
    }

    /// Gets an output by id.
    pub fn output(&self, id: &str) -> Option<&OutputParameter> {
        self.outputs.iter().find(|o| o.id == id)
    }

    /// Gets a step by id.
    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Inputs that take a File or an array of Files.
    pub fn file_inputs(&self) -> Vec<&InputParameter> {
        self.inputs
            .iter()
            .filter(|i| i.param_type.is_file() || i.param_type.is_file_array())
            .collect()
    }

    /// Inputs without a default that are not optional.
    pub fn required_inputs(&self) -> Vec<&InputParameter> {
        self.inputs.iter().filter(|i| i.is_required()).collect()
    }
}

/// Strips the `#` CWL allows in front of identifiers.
fn strip_hash(id: &str) -> String {
    id.trim_start_matches('#').to_string()
}

/// Deserializes either a single string or array of strings into Vec<String>
fn single_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![strip_hash(&s)]),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(strip_hash(&s)),
                _ => Err(de::Error::custom("Expected string in array")),
            })
            .collect(),
        _ => Err(de::Error::custom("Expected string or array of strings")),
    }
}

/// Normalises a map-or-list collection into a list of objects with `id`.
///
/// Map values that are not objects become `{shorthand: value}`.
fn keyed_entries(value: Value, shorthand: &str) -> Result<Vec<Value>, String> {
    let with_id = |id: &str, entry: Value| -> Result<Value, String> {
        let mut object = match entry {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert(shorthand.to_string(), other);
                map
            }
        };
        object.insert("id".to_string(), Value::String(strip_hash(id)));
        Ok(Value::Object(object))
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(id, entry)| with_id(&id, entry))
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| format!("Entry without 'id': {}", item))?;
                with_id(&id, item)
            })
            .collect(),
        other => Err(format!("Expected a map or a list, found {}", other)),
    }
}

fn keyed_list<'de, D, T>(deserializer: D, shorthand: &str) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    keyed_entries(value, shorthand)
        .map_err(de::Error::custom)?
        .into_iter()
        .map(|entry| serde_json::from_value(entry).map_err(de::Error::custom))
        .collect()
}

fn input_parameters<'de, D>(deserializer: D) -> Result<Vec<InputParameter>, D::Error>
where
    D: Deserializer<'de>,
{
    keyed_list(deserializer, "type")
}

fn output_parameters<'de, D>(deserializer: D) -> Result<Vec<OutputParameter>, D::Error>
where
    D: Deserializer<'de>,
{
    keyed_list(deserializer, "type")
}

fn step_inputs<'de, D>(deserializer: D) -> Result<Vec<StepInput>, D::Error>
where
    D: Deserializer<'de>,
{
    keyed_list(deserializer, "source")
}

fn workflow_steps<'de, D>(deserializer: D) -> Result<Vec<WorkflowStep>, D::Error>
where
    D: Deserializer<'de>,
{
    keyed_list(deserializer, "run")
}

/// Deserializes step `out`, a list of port names or of `{id: ..}` objects.
fn output_ports<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(strip_hash(&s)),
                Value::Object(map) => map
                    .get("id")
                    .and_then(Value::as_str)
                    .map(strip_hash)
                    .ok_or_else(|| de::Error::custom("Output port object without 'id'")),
                _ => Err(de::Error::custom("Expected port name or object")),
            })
            .collect(),
        Value::String(s) => Ok(vec![strip_hash(&s)]),
        _ => Err(de::Error::custom("Expected list of output ports")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parse_simple() {
        assert_eq!(CwlType::parse("File"), CwlType::File);
        assert_eq!(CwlType::parse("int"), CwlType::Int);
        assert_eq!(CwlType::parse("string"), CwlType::String);
        assert_eq!(CwlType::parse("record"), CwlType::Other("record".to_string()));
    }

    #[test]
    fn test_type_parse_modifiers() {
        let t = CwlType::parse("File[]?");
        assert_eq!(
            t,
            CwlType::Optional(Box::new(CwlType::Array(Box::new(CwlType::File))))
        );
        assert!(t.is_optional());
        assert!(t.is_file_array());
        assert!(!t.is_file());
        assert_eq!(t.to_string(), "File[]?");
    }

    #[test]
    fn test_type_from_union_with_null() {
        let value = serde_json::json!(["null", "int"]);
        let t = CwlType::from_value(&value).unwrap();
        assert_eq!(t, CwlType::Optional(Box::new(CwlType::Int)));
    }

    #[test]
    fn test_type_from_array_object() {
        let value = serde_json::json!({"type": "array", "items": "File"});
        let t = CwlType::from_value(&value).unwrap();
        assert!(t.is_file_array());
    }

    #[test]
    fn test_type_accepts() {
        assert!(CwlType::File.accepts_files());
        assert!(!CwlType::File.accepts_values());
        assert!(!CwlType::Int.accepts_files());
        assert!(CwlType::Int.accepts_values());
        assert!(CwlType::Any.accepts_files());
        assert!(CwlType::Any.accepts_values());
    }

    #[test]
    fn test_input_required() {
        let input = InputParameter::new("reads", "File");
        assert!(input.is_required());

        let optional = InputParameter::new("threads", "int?");
        assert!(!optional.is_required());

        let mut defaulted = InputParameter::new("threads", "int");
        defaulted.default = Some(serde_json::json!(4));
        assert!(!defaulted.is_required());
    }

    #[test]
    fn test_shorthand_inputs_and_outputs() {
        let yaml = r#"
cwlVersion: v1.0
class: Workflow
inputs: { input_file: File }
outputs: { counts: { type: File, outputSource: wc/output } }
steps:
  wc:
    run: wc.cwl
    in: { file: input_file }
    out: [output]
"#;
        let doc: CwlDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.class, DocumentClass::Workflow);
        assert_eq!(doc.inputs.len(), 1);
        assert_eq!(doc.inputs[0].id, "input_file");
        assert!(doc.inputs[0].param_type.is_file());
        assert_eq!(doc.outputs[0].output_source, vec!["wc/output"]);

        let step = doc.step("wc").unwrap();
        assert_eq!(step.run, StepRun::Reference("wc.cwl".to_string()));
        assert_eq!(step.inputs[0].id, "file");
        assert_eq!(step.inputs[0].source, vec!["input_file"]);
        assert!(step.has_output("output"));
    }

    #[test]
    fn test_list_form_and_empty_lists() {
        let yaml = r##"
cwlVersion: v1.0
class: Workflow
inputs: []
outputs:
  - id: "#count"
    type: File
    outputSource: "#step1/output"
steps:
  - id: step1
    run: hostname.cwl
    in: []
    out:
      - id: output
"##;
        let doc: CwlDocument = serde_yaml::from_str(yaml).unwrap();
        assert!(doc.inputs.is_empty());
        assert_eq!(doc.outputs[0].id, "count");
        assert_eq!(doc.outputs[0].output_source, vec!["step1/output"]);
        assert_eq!(doc.steps[0].out, vec!["output"]);
        assert!(doc.steps[0].inputs.is_empty());
    }

    #[test]
    fn test_upstream_steps() {
        let yaml = r#"
cwlVersion: v1.0
class: Workflow
inputs: { reads: File }
outputs: {}
steps:
  merge:
    run: merge.cwl
    in:
      left: align/bam
      right: { source: [align/bam, sort/bam] }
      mode: { default: fast }
    out: [merged]
"#;
        let doc: CwlDocument = serde_yaml::from_str(yaml).unwrap();
        let step = doc.step("merge").unwrap();
        assert_eq!(step.upstream_steps(), vec!["align", "sort"]);
        let mode = step.inputs.iter().find(|i| i.id == "mode").unwrap();
        assert!(mode.source.is_empty());
        assert_eq!(mode.default, Some(serde_json::json!("fast")));
    }

    #[test]
    fn test_file_and_required_inputs() {
        let mut doc = CwlDocument::new(DocumentClass::CommandLineTool);
        doc.inputs.push(InputParameter::new("pdb", "File"));
        doc.inputs.push(InputParameter::new("frames", "File[]"));
        doc.inputs.push(InputParameter::new("sim_time", "double?"));

        assert_eq!(doc.file_inputs().len(), 2);
        assert_eq!(doc.required_inputs().len(), 2);
        assert!(doc.has_input("sim_time"));
        assert!(!doc.is_workflow());
    }

    #[test]
    fn test_unknown_class_rejected() {
        let yaml = "cwlVersion: v1.0\nclass: Pipeline\ninputs: []\noutputs: []\n";
        let result: Result<CwlDocument, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }
}
