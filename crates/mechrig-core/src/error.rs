//! Error and warning types for rig synthesis.
//!
//! Every failure surfaced by the engine is one of three kinds: a validation
//! problem with the input, a geometry problem with a transform, or an IK
//! chain that asks for more links than the skeleton has. Each carries a
//! stable code, a message, and the name of the offending entity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for rig synthesis operations.
pub type RigResult<T> = Result<T, RigError>;

/// The three failure kinds reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input is malformed; reported before anything is mutated.
    Validation,
    /// A transform is degenerate; the current stage is aborted.
    Geometry,
    /// An IK chain is longer than the available ancestors; clamped.
    DanglingChain,
}

impl ErrorKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Geometry => "geometry",
            ErrorKind::DanglingChain => "dangling_chain",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error codes for rig synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation errors (R001-R0xx)
    /// R001: Selection is empty
    EmptySelection,
    /// R002: Scene node is not a member of any part group
    MissingPartGroup,
    /// R003: Every selected node has its parent in the selection
    NoRootNode,
    /// R004: Referenced node is not present in the scene
    UnknownNode,
    /// R005: Two scene nodes share a name
    DuplicateNode,
    /// R006: Mirrored group used without a reflection origin
    MissingReflectionOrigin,
    /// R007: Scale factor or length setting is not positive
    InvalidSetting,
    /// R008: Naming pattern failed to compile
    InvalidPattern,
    /// R009: IK chain length is zero
    InvalidChainLength,
    /// R010: Referenced bone is not present in the skeleton
    UnknownBone,

    // Geometry errors (G001-G0xx)
    /// G001: Node transform has a degenerate axis
    DegenerateTransform,
    /// G002: Reflection origin transform is singular
    DegenerateReflectionOrigin,

    /// D001: IK chain exceeds available ancestors
    DanglingChain,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "R001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::EmptySelection => "R001",
            ErrorCode::MissingPartGroup => "R002",
            ErrorCode::NoRootNode => "R003",
            ErrorCode::UnknownNode => "R004",
            ErrorCode::DuplicateNode => "R005",
            ErrorCode::MissingReflectionOrigin => "R006",
            ErrorCode::InvalidSetting => "R007",
            ErrorCode::InvalidPattern => "R008",
            ErrorCode::InvalidChainLength => "R009",
            ErrorCode::UnknownBone => "R010",
            ErrorCode::DegenerateTransform => "G001",
            ErrorCode::DegenerateReflectionOrigin => "G002",
            ErrorCode::DanglingChain => "D001",
        }
    }

    /// Returns the failure kind this code belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::DegenerateTransform | ErrorCode::DegenerateReflectionOrigin => {
                ErrorKind::Geometry
            }
            ErrorCode::DanglingChain => ErrorKind::DanglingChain,
            _ => ErrorKind::Validation,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for rig synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCode {
    /// W001: Piston pair is missing its cylinder or rod
    IncompletePistonPair,
    /// W002: Two bones claim the same piston slot
    DuplicatePistonMember,
    /// W003: Mirrored node has no mirror modifier targeting the origin
    MirrorModifierMissing,
    /// W004: IK chain was clamped to the available ancestors
    DanglingChain,
    /// W005: Selected nodes are unreachable from any root
    UnreachableNodes,
    /// W006: A later pivot candidate was ignored
    PivotOverrideIgnored,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::IncompletePistonPair => "W001",
            WarningCode::DuplicatePistonMember => "W002",
            WarningCode::MirrorModifierMissing => "W003",
            WarningCode::DanglingChain => "W004",
            WarningCode::UnreachableNodes => "W005",
            WarningCode::PivotOverrideIgnored => "W006",
        }
    }

    /// Returns the failure kind this warning belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WarningCode::DanglingChain => ErrorKind::DanglingChain,
            _ => ErrorKind::Validation,
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Code, message, and offending entity of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Name of the node or bone at fault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl ErrorDetail {
    /// Creates a new error detail.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            entity: None,
        }
    }

    /// Creates a new error detail naming the offending entity.
    pub fn with_entity(
        code: ErrorCode,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            entity: Some(entity.into()),
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref entity) = self.entity {
            write!(f, "{}: {} (at {})", self.code, self.message, entity)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Top-level error type returned by every entry point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(ErrorDetail),

    /// A transform could not be used to place a bone.
    #[error("geometry error: {0}")]
    Geometry(ErrorDetail),

    /// IK chain is longer than the owner's ancestry.
    #[error("IK chain on '{bone}' requests {requested} link(s) but only {available} exist")]
    DanglingChain {
        bone: String,
        requested: u8,
        available: u8,
    },
}

impl RigError {
    /// Creates a validation error.
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        RigError::Validation(ErrorDetail::new(code, message))
    }

    /// Creates a validation error naming the offending entity.
    pub fn validation_at(
        code: ErrorCode,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        RigError::Validation(ErrorDetail::with_entity(code, message, entity))
    }

    /// Creates a geometry error naming the offending entity.
    pub fn geometry_at(
        code: ErrorCode,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        RigError::Geometry(ErrorDetail::with_entity(code, message, entity))
    }

    /// Returns the failure kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RigError::Validation(_) => ErrorKind::Validation,
            RigError::Geometry(_) => ErrorKind::Geometry,
            RigError::DanglingChain { .. } => ErrorKind::DanglingChain,
        }
    }

    /// Returns the stable code string.
    pub fn code(&self) -> &'static str {
        match self {
            RigError::Validation(detail) | RigError::Geometry(detail) => detail.code.code(),
            RigError::DanglingChain { .. } => ErrorCode::DanglingChain.code(),
        }
    }

    /// Returns the offending entity name, if known.
    pub fn entity(&self) -> Option<&str> {
        match self {
            RigError::Validation(detail) | RigError::Geometry(detail) => detail.entity.as_deref(),
            RigError::DanglingChain { bone, .. } => Some(bone),
        }
    }

    /// Returns the human-readable message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            RigError::Validation(detail) | RigError::Geometry(detail) => detail.message.clone(),
            RigError::DanglingChain { .. } => self.to_string(),
        }
    }
}

/// A non-fatal finding with code, message, and offending entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Name of the node or bone concerned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl RigWarning {
    /// Creates a new warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            entity: None,
        }
    }

    /// Creates a new warning naming the entity concerned.
    pub fn with_entity(
        code: WarningCode,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            entity: Some(entity.into()),
        }
    }

    /// Returns the failure kind this warning belongs to.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }
}

impl From<RigError> for RigWarning {
    /// Demotes a clamped chain (or any other recoverable error) to a warning.
    fn from(err: RigError) -> Self {
        let code = match err.kind() {
            ErrorKind::DanglingChain => WarningCode::DanglingChain,
            _ => WarningCode::UnreachableNodes,
        };
        let entity = err.entity().map(str::to_string);
        Self {
            code,
            message: err.message(),
            entity,
        }
    }
}

impl std::fmt::Display for RigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref entity) = self.entity {
            write!(f, "{}: {} (at {})", self.code, self.message, entity)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of a non-mutating validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Errors that would stop synthesis.
    pub errors: Vec<RigError>,
    /// Findings that synthesis tolerates.
    pub warnings: Vec<RigWarning>,
}

impl ValidationReport {
    /// Creates an empty (passing) report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error to the report.
    pub fn add_error(&mut self, error: RigError) {
        self.errors.push(error);
    }

    /// Adds a warning to the report.
    pub fn add_warning(&mut self, warning: RigWarning) {
        self.warnings.push(warning);
    }

    /// Adds several warnings to the report.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = RigWarning>) {
        self.warnings.extend(warnings);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if a warning with the given code was recorded.
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<RigWarning>, Vec<RigError>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}
