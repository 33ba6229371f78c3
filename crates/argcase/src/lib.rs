//! Declarative, case-based argument parsing.
//!
//! Accepted arguments are declared as an enum; each variant is one argument
//! and its fields are the argument's payload:
//!
//! ```ignore
//! use argcase::{ArgCases, ArgumentParser, ParseOutcome};
//!
//! #[derive(Debug, ArgCases)]
//! enum Args {
//!     /// port to listen on.
//!     #[arg(mandatory, alt_name = "-p")]
//!     Port(u16),
//!     /// be verbose.
//!     Verbose,
//! }
//!
//! let parser = ArgumentParser::<Args>::new()?;
//! if let ParseOutcome::Parsed(results) = parser.parse_command_line(&["--port", "80"])? {
//!     let port = results.last(|a| match a {
//!         Args::Port(p) => Some(*p),
//!         _ => None,
//!     });
//! }
//! ```
//!
//! The description is compiled once per type into an [`ArgumentSchema`],
//! which drives command-line parsing, configuration parsing, usage text and
//! the inverse renderings.

pub mod config;
mod conflict;
pub mod description;
pub mod error;
pub mod grouped;
pub mod metadata;
pub mod parser;
pub mod primitive;
pub mod render;
pub mod results;
pub mod schema;
pub mod value;

pub use argcase_derive::ArgCases;
pub use config::{ConfigDocument, ConfigEntry, ConfigurationReader, EmptyReader, FnReader};
pub use description::{
    ArgCases, ArgField, Assignment, CaseAttributes, CaseDescriptor, CliPrefix, Description, FieldType,
    NestedDescriptor,
};
pub use error::{Error, ParseError, Result, SchemaError};
pub use metadata::SchemaInfo;
pub use parser::{Outcome, ParseOptions, Parsed, ParsedEntry, Source};
pub use primitive::{Primitive, PrimitiveRegistry};
pub use render::UsageOptions;
pub use results::{ArgumentParser, ParseOutcome, ParseResults};
pub use schema::{ArgumentSchema, SchemaRef};
pub use value::Value;
