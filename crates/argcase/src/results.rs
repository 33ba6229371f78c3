//! Typed front end over the schema, parser and renderer.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::{ConfigDocument, ConfigurationReader};
use crate::description::{ArgCases, ArgField, FieldType, NestedDescriptor};
use crate::error::{Error, Result};
use crate::metadata::SchemaInfo;
use crate::parser::{self, Outcome, ParseOptions, Parsed, ParsedEntry, Source};
use crate::primitive::PrimitiveRegistry;
use crate::render::{self, UsageOptions};
use crate::schema::{ArgumentSchema, NodeId};
use crate::value::Value;

/// Parser for the description type `T`.
///
/// ```ignore
/// let parser = ArgumentParser::<Args>::new()?.with_program_name("tool");
/// match parser.parse_command_line(&std::env::args().skip(1).collect::<Vec<_>>())? {
///     ParseOutcome::HelpRequested(usage) => print!("{usage}"),
///     ParseOutcome::Parsed(results) => run(results),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ArgumentParser<T> {
    schema: Arc<ArgumentSchema>,
    program_name: Option<String>,
    options: ParseOptions,
    _marker: PhantomData<fn() -> T>,
}

/// Outcome of a typed parse call.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(ParseResults<T>),
    /// Usage text of the level whose help flag was given.
    HelpRequested(String),
}

impl<T: ArgCases> ArgumentParser<T> {
    /// Uses the process-wide schema cache.
    pub fn new() -> Result<Self> {
        Ok(Self::from_schema(ArgumentSchema::of::<T>()?))
    }

    /// Compiles against a custom registry, bypassing the cache.
    pub fn with_registry(registry: &PrimitiveRegistry) -> Result<Self> {
        let schema = ArgumentSchema::compile(T::describe(), registry)?;
        Ok(Self::from_schema(Arc::new(schema)))
    }

    fn from_schema(schema: Arc<ArgumentSchema>) -> Self {
        Self {
            schema,
            program_name: None,
            options: ParseOptions::default(),
            _marker: PhantomData,
        }
    }

    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &ArgumentSchema {
        &self.schema
    }

    pub fn usage(&self) -> String {
        self.usage_of(0, None)
    }

    /// Usage text preceded by `message`, e.g. a parse error.
    pub fn usage_with_message(&self, message: impl Into<String>) -> String {
        self.usage_of(0, Some(message.into()))
    }

    fn usage_of(&self, node: NodeId, message: Option<String>) -> String {
        let options = UsageOptions {
            program_name: self.program_name.clone(),
            message,
        };
        let node = self.schema.node(node).unwrap_or_else(|| self.schema.root());
        render::render_usage(node, &options)
    }

    pub fn parse_command_line<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ParseOutcome<T>> {
        let outcome = parser::parse_command_line(self.schema.root(), tokens, self.options)?;
        self.typed(outcome)
    }

    pub fn parse_configuration<R>(&self, reader: &R) -> Result<ParseResults<T>>
    where
        R: ConfigurationReader + ?Sized,
    {
        let parsed = parser::parse_configuration(self.schema.root(), reader, self.options)?;
        ParseResults::from_parsed(parsed)
    }

    /// Command line over configuration.
    pub fn parse<S, R>(&self, tokens: &[S], reader: &R) -> Result<ParseOutcome<T>>
    where
        S: AsRef<str>,
        R: ConfigurationReader + ?Sized,
    {
        let outcome = parser::parse(self.schema.root(), tokens, reader, self.options)?;
        self.typed(outcome)
    }

    fn typed(&self, outcome: Outcome) -> Result<ParseOutcome<T>> {
        match outcome {
            Outcome::HelpRequested { node } => Ok(ParseOutcome::HelpRequested(self.usage_of(node, None))),
            Outcome::Parsed(parsed) => ParseResults::from_parsed(parsed).map(ParseOutcome::Parsed),
        }
    }

    pub fn render_command_line(&self, values: &[T]) -> Result<Vec<String>> {
        render::render_command_line(self.schema.root(), &deconstruct_all(values))
    }

    pub fn render_configuration(&self, values: &[T], with_comments: bool) -> Result<ConfigDocument> {
        render::render_configuration(self.schema.root(), &deconstruct_all(values), with_comments)
    }

    pub fn describe(&self) -> SchemaInfo {
        SchemaInfo::from_schema(self.schema.root())
    }
}

fn deconstruct_all<T: ArgCases>(values: &[T]) -> Vec<(usize, Vec<Value>)> {
    values.iter().map(ArgCases::deconstruct).collect()
}

/// Typed values of one schema level, with the untyped entries they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResults<T> {
    parsed: Parsed,
    values: Vec<T>,
}

impl<T: ArgCases> ParseResults<T> {
    pub fn from_parsed(parsed: Parsed) -> Result<Self> {
        let values = parsed
            .entries
            .iter()
            .map(|entry| {
                T::construct(entry.case, entry.fields.clone()).ok_or_else(|| Error::Reflect {
                    type_name: T::describe().type_name,
                    case: entry.case,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { parsed, values })
    }

    pub fn from_values(values: Vec<T>) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .map(|(occurrence, value)| {
                let (case, fields) = value.deconstruct();
                ParsedEntry {
                    case,
                    fields,
                    source: Source::CommandLine,
                    occurrence,
                }
            })
            .collect();
        Self {
            parsed: Parsed { entries },
            values,
        }
    }

    pub fn all(&self) -> &[T] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }

    pub fn parsed(&self) -> &Parsed {
        &self.parsed
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Last value `f` maps to `Some`.
    pub fn last<R>(&self, f: impl Fn(&T) -> Option<R>) -> Option<R> {
        self.values.iter().rev().find_map(f)
    }

    pub fn find_all<R>(&self, f: impl Fn(&T) -> Option<R>) -> Vec<R> {
        self.values.iter().filter_map(f).collect()
    }

    /// Whether a value of the case named `identifier` is present.
    pub fn contains(&self, identifier: &str) -> bool {
        T::describe()
            .cases
            .iter()
            .position(|c| c.identifier == identifier)
            .is_some_and(|index| self.parsed.contains(index))
    }

    /// Usage text of `T` compiled on its own: no program name and no
    /// sub-command path, even when these results came from a nested level.
    /// Use the root parser's usage to render a level in context.
    pub fn standalone_usage(&self) -> Result<String> {
        Ok(ArgumentParser::<T>::new()?.usage())
    }
}

impl<'a, T> IntoIterator for &'a ParseResults<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Sub-command payload.
impl<T: ArgCases> ArgField for ParseResults<T> {
    fn field_type() -> FieldType {
        FieldType::Nested(NestedDescriptor::of::<T>())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Nested(parsed) => Self::from_parsed(*parsed).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Nested(Box::new(self.parsed.clone()))
    }
}
