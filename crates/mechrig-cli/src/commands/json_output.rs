//! Machine-readable output for `--json` mode.
//!
//! Every command prints one JSON object with a `success` flag, the errors
//! and warnings it collected, and a command-specific result.

use mechrig_core::{Binding, DuplicationEntry, IkTask, RigError, RigWarning, Side, Skeleton};
use serde::Serialize;

use crate::input::InputError;

/// Error codes raised by the CLI itself, before the engine runs.
pub mod error_codes {
    /// Input file could not be read.
    pub const FILE_READ: &str = "CLI_001";
    /// Input file is not valid JSON for its document type.
    pub const JSON_PARSE: &str = "CLI_002";
    /// Output could not be written.
    pub const FILE_WRITE: &str = "CLI_003";
}

/// A diagnostic error in JSON form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonError {
    pub code: String,
    /// One of `validation`, `geometry`, `dangling_chain`, or `input`.
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    /// Creates an input error raised by the CLI.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind: "input".to_string(),
            message: message.into(),
            entity: None,
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl From<&RigError> for JsonError {
    fn from(err: &RigError) -> Self {
        Self {
            code: err.code().to_string(),
            kind: err.kind().as_str().to_string(),
            message: err.message(),
            entity: err.entity().map(str::to_string),
            file: None,
        }
    }
}

/// A diagnostic warning in JSON form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonWarning {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl From<&RigWarning> for JsonWarning {
    fn from(warning: &RigWarning) -> Self {
        Self {
            code: warning.code.code().to_string(),
            message: warning.message.clone(),
            entity: warning.entity.clone(),
        }
    }
}

pub fn warnings_to_json(warnings: &[RigWarning]) -> Vec<JsonWarning> {
    warnings.iter().map(JsonWarning::from).collect()
}

/// Converts a load failure to a JSON error tagged with the file.
pub fn input_error_to_json(err: &InputError, file: &str) -> JsonError {
    let json = match err {
        InputError::FileRead { .. } => JsonError::new(error_codes::FILE_READ, err.to_string()),
        InputError::JsonParse { .. } => JsonError::new(error_codes::JSON_PARSE, err.to_string()),
        InputError::Rig(rig) => JsonError::from(rig),
    };
    json.with_file(file)
}

/// Output of `mechrig validate --json`.
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    pub warnings: Vec<JsonWarning>,
}

/// Result of a synthesis run.
#[derive(Debug, Serialize)]
pub struct SynthesizeResult {
    pub skeleton: String,
    pub fingerprint: String,
    pub bones: usize,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// The skeleton itself, when it was not written to a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Skeleton>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<GeometryPlanJson>,
}

/// Duplication and binding plan for the host collaborators.
#[derive(Debug, Serialize)]
pub struct GeometryPlanJson {
    pub duplication: Vec<DuplicationEntry>,
    pub bindings: Vec<Binding>,
}

/// Output of `mechrig synthesize --json`.
#[derive(Debug, Serialize)]
pub struct SynthesizeOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    pub warnings: Vec<JsonWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SynthesizeResult>,
}

/// Result of a control-rig run.
#[derive(Debug, Serialize)]
pub struct ControlsResult {
    pub fingerprint: String,
    pub created: Vec<IkTask>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Skeleton>,
}

/// Output of `mechrig controls --json`.
#[derive(Debug, Serialize)]
pub struct ControlsOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    pub warnings: Vec<JsonWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ControlsResult>,
}

/// One bone of the analyzed forest.
#[derive(Debug, Serialize)]
pub struct InspectBone {
    pub name: String,
    pub group: String,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub representative: String,
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pivot_overridden: bool,
}

/// Output of `mechrig inspect --json`.
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    pub warnings: Vec<JsonWarning>,
    pub bones: Vec<InspectBone>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechrig_core::{ErrorCode, WarningCode};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_rig_error_to_json() {
        let err = RigError::validation_at(ErrorCode::UnknownNode, "node does not exist", "Ghost");
        let json = JsonError::from(&err);
        assert_eq!(json.code, "R004");
        assert_eq!(json.kind, "validation");
        assert_eq!(json.entity.as_deref(), Some("Ghost"));
    }

    #[test]
    fn test_input_error_to_json() {
        let err = InputError::JsonParse {
            path: PathBuf::from("scene.json"),
            message: "expected value".to_string(),
        };
        let json = input_error_to_json(&err, "scene.json");
        assert_eq!(json.code, error_codes::JSON_PARSE);
        assert_eq!(json.kind, "input");
        assert_eq!(json.file.as_deref(), Some("scene.json"));
    }

    #[test]
    fn test_warning_serializes_without_missing_entity() {
        let warning = RigWarning::new(WarningCode::IncompletePistonPair, "rod missing");
        let value = serde_json::to_value(JsonWarning::from(&warning)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"code": "W001", "message": "rod missing"})
        );
    }
}
