//! Error types for schema compilation, parsing and rendering.

use std::fmt;

use thiserror::Error;

/// Namespace an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    CommandLine,
    AppSettings,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandLine => f.write_str("command-line name"),
            Self::AppSettings => f.write_str("configuration key"),
        }
    }
}

/// A description type could not be compiled into a schema.
///
/// Schema errors are fatal for the description type: a schema that failed to
/// compile is never cached or used for parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("type '{type_name}' is not a case-based description")]
    NotCaseBased { type_name: String },

    #[error("description type '{type_name}' must not be generic")]
    GenericDescription { type_name: String },

    #[error("description type '{type_name}' nests itself ({chain})")]
    RecursiveDescription { type_name: String, chain: String },

    #[error("{type_name}::{case}: invalid {kind} '{identifier}'")]
    InvalidIdentifier {
        type_name: String,
        case: String,
        kind: IdentifierKind,
        identifier: String,
    },

    #[error("{type_name}: {kind} '{identifier}' is used by both '{first}' and '{second}'")]
    ConflictingIdentifier {
        type_name: String,
        kind: IdentifierKind,
        identifier: String,
        first: String,
        second: String,
    },

    #[error("{type_name}::{case}: '{flag}' is reserved for help")]
    ReservedHelpFlag {
        type_name: String,
        case: String,
        flag: String,
    },

    #[error("{type_name}::{case}: field '{field}' has unsupported type '{field_type}'")]
    UnsupportedFieldType {
        type_name: String,
        case: String,
        field: String,
        field_type: String,
    },

    #[error("{type_name}::{case}: {reason}")]
    IncompatibleAnnotations {
        type_name: String,
        case: String,
        reason: String,
    },

    #[error("{type_name}::{case}: no command-line name and no configuration key")]
    NoParseSource { type_name: String, case: String },
}

/// A single parse call failed. The schema stays valid for further calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("argument '{name}' must be followed by {expected}")]
    MissingArgument { name: String, expected: String },

    #[error("argument '{name}': could not parse '{raw}' as {field}: {reason}")]
    MalformedValue {
        name: String,
        field: String,
        raw: String,
        reason: String,
    },

    #[error("unrecognized argument: '{token}'")]
    UnrecognizedToken { token: String },

    #[error("missing mandatory argument '{name}'")]
    MissingMandatory { name: String },

    #[error("argument '{name}' must be placed before all other arguments")]
    MisplacedFirst { name: String },

    #[error("argument '{name}' cannot be used multiple times")]
    DuplicateArgument { name: String },
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The reflector rejected the values recovered for a case.
    #[error("could not construct a '{type_name}' value from case {case}")]
    Reflect { type_name: String, case: usize },

    #[error("case '{case}' has no command-line name and cannot be rendered as tokens")]
    NoCommandLineName { case: String },

    #[error("value '{token}' of '{case}' would be read back as a switch")]
    SwitchLikePositional { case: String, token: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
