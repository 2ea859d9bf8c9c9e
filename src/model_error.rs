//! ModelError: unified error type for model evaluation and region management.
//!
//! Every variant that can abort a model evaluation carries a [`Location`]
//! naming the device and region, plus the name of the model involved, so the
//! rendered message is enough to locate the offending definition.

use std::fmt;

use thiserror::Error;

use crate::model::kind::ModelKind;

/// Device and region a model lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub device: String,
    pub region: String,
}

impl Location {
    pub fn new(device: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device: \"{}\" Region: \"{}\"", self.device, self.region)
    }
}

/// Which floating point condition was detected in a calculation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpeKind {
    /// NaN produced (invalid operation).
    Invalid,
    /// Infinite value produced (overflow or division by zero).
    Overflow,
}

impl fmt::Display for FpeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FpeKind::Invalid => f.write_str("There was an Invalid Operation (NaN)"),
            FpeKind::Overflow => f.write_str("There was an Overflow or Divide By Zero (Inf)"),
        }
    }
}

/// Unified error type for model and region operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A model reads a dependency that is not defined in the region.
    #[error("{location} {required_kind} \"{required}\" does not exist so {kind} \"{model}\" cannot be calculated")]
    MissingDependency {
        location: Location,
        kind: ModelKind,
        model: String,
        required_kind: ModelKind,
        required: String,
    },
    /// A companion or parent name resolves to a model with different semantics.
    #[error("{location} {required_kind} \"{required}\" appears to have been redefined since last calculation of {kind} \"{model}\"")]
    ChangedDependency {
        location: Location,
        kind: ModelKind,
        model: String,
        required_kind: ModelKind,
        required: String,
    },
    /// Geometric or parameter precondition violated.
    #[error("{location} {kind} \"{model}\": {reason}")]
    DomainError {
        location: Location,
        kind: ModelKind,
        model: String,
        reason: String,
    },
    /// NaN or Inf written while calculating a model.
    #[error("{location} {kind} \"{model}\": {fpe} while evaluating the model")]
    FloatingPointException {
        location: Location,
        kind: ModelKind,
        model: String,
        fpe: FpeKind,
    },
    /// Registering this dependency would close a cycle, or a model was
    /// re-entered while it was being calculated.
    #[error("{location} model \"{model}\" cannot depend on \"{dependency}\": cycle detected in model dependencies")]
    CyclicDependency {
        location: Location,
        model: String,
        dependency: String,
    },
    /// A name is already taken by a model of another kind.
    #[error("{location} cannot replace {existing} \"{name}\" with {requested} of the same name")]
    NameCollision {
        location: Location,
        name: String,
        existing: ModelKind,
        requested: ModelKind,
    },
    /// Values pushed into a model do not match its element count.
    #[error("{location} {kind} \"{model}\": expected {expected} values, found {found}")]
    LengthMismatch {
        location: Location,
        kind: ModelKind,
        model: String,
        expected: usize,
        found: usize,
    },
    /// The model is not defined in the region.
    #[error("{location} {kind} \"{model}\" does not exist")]
    UnknownModel {
        location: Location,
        kind: ModelKind,
        model: String,
    },
    #[error("{0} contact \"{1}\" does not exist")]
    UnknownContact(Location, String),
    #[error("{0} interface \"{1}\" does not exist")]
    UnknownInterface(Location, String),
    /// Mesh description rejected while building a region.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
    /// Saved model text could not be parsed.
    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
    /// A saved `COMMAND` line names a command that does not exist.
    #[error("unknown model command \"{0}\"")]
    UnknownCommand(String),
    #[error("model command \"{command}\" requires option -{option}")]
    MissingOption { command: String, option: String },
    #[error("\"{0}\" is not a valid average_type, expected arithmetic, geometric, gradient or negative_gradient")]
    UnknownAverageType(String),
    #[error("\"{0}\" is not a valid calc_type, expected default or avoidzero")]
    UnknownCalcType(String),
}

