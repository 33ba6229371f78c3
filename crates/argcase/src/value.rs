use std::fmt;
use std::path::PathBuf;

use crate::parser::Parsed;

/// A field value recovered from input, or supplied for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    Path(PathBuf),
    /// Verbatim tokens collected by a rest case.
    Tokens(Vec<String>),
    /// Result of parsing a sub-command.
    Nested(Box<Parsed>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::Path(v) => write!(f, "{}", v.display()),
            Self::Tokens(v) => f.write_str(&v.join(" ")),
            Self::Nested(p) => write!(f, "<{} entries>", p.entries.len()),
        }
    }
}
