//! Structured error types shared across the layout synthesizer crates.
//!
//! Every failure mode is a variant carrying an [`ErrorInfo`] payload with a
//! stable code, a message, free-form context, and an optional remediation
//! hint.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`Error`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key/value pairs (view names, anchor ids, axis, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// A report of the constraints and axis involved in an unsatisfiable Max-SMT
/// query, attached to [`Error::Infeasible`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConflictReport {
    /// Identifier of the focus view the solve was attempted for.
    pub focus_view: String,
    /// Axis that produced the conflict (`"horizontal"` or `"vertical"`).
    pub axis: String,
    /// Human readable descriptions of the constraints in the unsat core.
    pub conflicting_constraints: Vec<String>,
}

/// Canonical error type for the layout synthesizer.
///
/// Variants follow a fixed taxonomy: input/geometry errors surface
/// immediately, learning failures never reach this type (they degrade to an
/// empty candidate list instead), and solver-level failures carry enough
/// diagnostic state for a caller to inspect the conflict.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed JSON, missing keys, non-isomorphic examples, unknown option
    /// values, or duplicate view names within one example tree.
    #[error("input error: {0}")]
    Input(ErrorInfo),
    /// A template mixed horizontal and vertical attribute families; always a
    /// bug in the instantiator or visibility engine, never user-triggered.
    #[error("geometry error: {0}")]
    Geometry(ErrorInfo),
    /// Max-SMT returned unsat before any blocking clause was ever added.
    #[error("infeasible: {0}")]
    Infeasible(ErrorInfo, ConflictReport),
    /// The CEGIS unambiguity loop exceeded its configured iteration cap.
    #[error("ambiguity limit exceeded: {0}")]
    AmbiguityLimit(ErrorInfo),
    /// The SMT backend returned `unknown`.
    #[error("solver error: {0}")]
    Solver(ErrorInfo),
    /// A requested option combination names a code path that is recognized
    /// but intentionally not implemented (e.g. `instantiation_method =
    /// prolog`).
    #[error("unsupported: {0}")]
    Unsupported(ErrorInfo),
}

impl Error {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            Error::Input(info)
            | Error::Geometry(info)
            | Error::Infeasible(info, _)
            | Error::AmbiguityLimit(info)
            | Error::Solver(info)
            | Error::Unsupported(info) => info,
        }
    }

    /// Builds an [`Error::Input`] from a code and message.
    pub fn input(code: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Input(ErrorInfo::new(code, message))
    }

    /// Builds an [`Error::Geometry`] from a code and message.
    pub fn geometry(code: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Geometry(ErrorInfo::new(code, message))
    }

    /// Builds an [`Error::Unsupported`] from a code and message.
    pub fn unsupported(code: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Unsupported(ErrorInfo::new(code, message))
    }
}

/// Convenience alias used throughout the synthesizer crates.
pub type Result<T> = std::result::Result<T, Error>;
