//! Parser engine.
//!
//! Command-line tokens are matched left to right against one schema level at
//! a time; a matched sub-command hands the remaining tokens to its child
//! level. Configuration sources are read by key. Both produce
//! [`ParsedEntry`] lists that are collapsed and checked per level.

use std::collections::HashMap;

use crate::config::ConfigurationReader;
use crate::description::Assignment;
use crate::error::ParseError;
use crate::schema::{CaseEntry, FieldEntry, FieldParser, NodeId, SchemaRef};
use crate::value::Value;

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    CommandLine,
    Configuration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    /// Declaration index of the matched case.
    pub case: usize,
    pub fields: Vec<Value>,
    pub source: Source,
    /// Ordinal of the input occurrence that produced this entry. The
    /// elements of one CSV value share it.
    pub occurrence: usize,
}

/// Entries of one schema level, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    pub entries: Vec<ParsedEntry>,
}

impl Parsed {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, case: usize) -> bool {
        self.entries.iter().any(|e| e.case == case)
    }

    pub fn find_all(&self, case: usize) -> impl Iterator<Item = &ParsedEntry> {
        self.entries.iter().filter(move |e| e.case == case)
    }

    pub fn last(&self, case: usize) -> Option<&ParsedEntry> {
        self.entries.iter().rev().find(|e| e.case == case)
    }
}

/// Result of a parse call that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Parsed(Parsed),
    /// A help flag was seen while parsing the level `node`.
    HelpRequested { node: NodeId },
}

/// Caller-selected parsing policies. Every option defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip tokens that match nothing instead of failing.
    pub ignore_unrecognized: bool,
    /// Fail on repeated non-gathering cases instead of keeping the last.
    pub strict_duplicates: bool,
    /// Skip mandatory checks.
    pub ignore_missing: bool,
}

impl ParseOptions {
    pub fn ignore_unrecognized(mut self, value: bool) -> Self {
        self.ignore_unrecognized = value;
        self
    }

    pub fn strict_duplicates(mut self, value: bool) -> Self {
        self.strict_duplicates = value;
        self
    }

    pub fn ignore_missing(mut self, value: bool) -> Self {
        self.ignore_missing = value;
        self
    }
}

/// Parse command-line tokens against `schema`.
pub fn parse_command_line<S: AsRef<str>>(
    schema: SchemaRef<'_>,
    tokens: &[S],
    options: ParseOptions,
) -> Result<Outcome, ParseError> {
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    let mut occurrences = 0;
    match parse_level(schema, &tokens, options, &mut occurrences)? {
        Level::Help(node) => Ok(Outcome::HelpRequested { node }),
        Level::Entries(entries) => finalize(schema, entries, options).map(Outcome::Parsed),
    }
}

/// Parse a configuration source against `schema`.
pub fn parse_configuration<R>(
    schema: SchemaRef<'_>,
    reader: &R,
    options: ParseOptions,
) -> Result<Parsed, ParseError>
where
    R: ConfigurationReader + ?Sized,
{
    let entries = read_configuration(schema, reader)?;
    finalize(schema, entries, options)
}

/// Parse both sources. Command-line entries override configuration entries
/// of the same case unless the case gathers all sources.
pub fn parse<S, R>(
    schema: SchemaRef<'_>,
    tokens: &[S],
    reader: &R,
    options: ParseOptions,
) -> Result<Outcome, ParseError>
where
    S: AsRef<str>,
    R: ConfigurationReader + ?Sized,
{
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    let mut occurrences = 0;
    let cli = match parse_level(schema, &tokens, options, &mut occurrences)? {
        Level::Help(node) => return Ok(Outcome::HelpRequested { node }),
        Level::Entries(entries) => entries,
    };
    let mut entries = read_configuration(schema, reader)?;
    entries.extend(cli);
    finalize(schema, entries, options).map(Outcome::Parsed)
}

enum Level {
    Entries(Vec<ParsedEntry>),
    Help(NodeId),
}

fn parse_level(
    schema: SchemaRef<'_>,
    tokens: &[&str],
    options: ParseOptions,
    occurrences: &mut usize,
) -> Result<Level, ParseError> {
    let mut entries = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        i += 1;

        if schema.help().flags.iter().any(|flag| flag == token) {
            tracing::debug!(node = schema.id(), flag = token, "help requested");
            return Ok(Level::Help(schema.id()));
        }

        if let Some((name, raw)) = token.split_once('=') {
            let assigned = schema
                .by_cli_name(name)
                .filter(|case| case.attributes.assignment != Assignment::Spaced);
            if let Some(case) = assigned {
                tracing::trace!(case = %case.identifier, token, "matched assignment");
                let occurrence = next(occurrences);
                record(case, name, &[raw], Source::CommandLine, occurrence, &mut entries)?;
                continue;
            }
        }

        if let Some(case) = schema.by_cli_name(token) {
            tracing::trace!(case = %case.identifier, token, "matched argument");
            let occurrence = next(occurrences);

            if case.is_rest() {
                let rest = tokens[i..].iter().map(|t| t.to_string()).collect();
                entries.push(entry(case, vec![Value::Tokens(rest)], Source::CommandLine, occurrence));
                break;
            }

            if let Some(child) = schema.child(case) {
                tracing::debug!(case = %case.identifier, node = child.id(), "entering sub-command");
                let child_entries = match parse_level(child, &tokens[i..], options, occurrences)? {
                    Level::Help(node) => return Ok(Level::Help(node)),
                    Level::Entries(child_entries) => child_entries,
                };
                let parsed = finalize(child, child_entries, options)?;
                entries.push(entry(
                    case,
                    vec![Value::Nested(Box::new(parsed))],
                    Source::CommandLine,
                    occurrence,
                ));
                break;
            }

            let arity = case.arity();
            if arity > 0 && case.attributes.assignment == Assignment::Equals {
                return Err(ParseError::MissingArgument {
                    name: token.to_string(),
                    expected: format!("={}", expected_fields(case)),
                });
            }
            if tokens.len() - i < arity {
                return Err(ParseError::MissingArgument {
                    name: token.to_string(),
                    expected: expected_fields(case),
                });
            }
            record(case, token, &tokens[i..i + arity], Source::CommandLine, occurrence, &mut entries)?;
            i += arity;
            continue;
        }

        if let Some(expanded) = schema.grouped().and_then(|g| g.expand(token)) {
            tracing::trace!(token, "expanding grouped switches");
            for synthetic in expanded {
                let Some(case) = schema.by_cli_name(&synthetic) else {
                    return Err(ParseError::UnrecognizedToken {
                        token: token.to_string(),
                    });
                };
                if case.arity() > 0 {
                    return Err(ParseError::MissingArgument {
                        name: synthetic,
                        expected: expected_fields(case),
                    });
                }
                let occurrence = next(occurrences);
                entries.push(entry(case, Vec::new(), Source::CommandLine, occurrence));
            }
            continue;
        }

        if let Some(main) = schema.main_command().filter(|_| !is_switch_like(token)) {
            tracing::trace!(case = %main.identifier, token, "matched main command");
            let occurrence = next(occurrences);
            let start = i - 1;
            if main.is_rest() {
                let rest = tokens[start..].iter().map(|t| t.to_string()).collect();
                entries.push(entry(main, vec![Value::Tokens(rest)], Source::CommandLine, occurrence));
                break;
            }
            let arity = main.arity();
            if tokens.len() - start < arity {
                return Err(ParseError::MissingArgument {
                    name: main.display_name(),
                    expected: expected_fields(main),
                });
            }
            let name = main.display_name();
            record(main, &name, &tokens[start..start + arity], Source::CommandLine, occurrence, &mut entries)?;
            i = start + arity;
            continue;
        }

        if options.ignore_unrecognized {
            tracing::trace!(token, "skipping unrecognized token");
            continue;
        }
        return Err(ParseError::UnrecognizedToken {
            token: token.to_string(),
        });
    }

    check_first(schema, &entries)?;
    if options.strict_duplicates {
        check_duplicates(schema, &entries)?;
    }
    Ok(Level::Entries(entries))
}

fn read_configuration<R>(schema: SchemaRef<'_>, reader: &R) -> Result<Vec<ParsedEntry>, ParseError>
where
    R: ConfigurationReader + ?Sized,
{
    let mut entries = Vec::new();
    let mut occurrences = 0;

    for case in schema.cases() {
        let Some(key) = case.app_settings_key.as_deref() else {
            continue;
        };
        // Gathering cases keep every stored value; the others only the last.
        let values = if case.attributes.gather_all_sources {
            reader.get_all(key)
        } else {
            reader.get(key).into_iter().collect()
        };
        for value in values {
            tracing::trace!(source = reader.name(), key, "read configuration value");
            let occurrence = next(&mut occurrences);
            read_value(case, key, value, occurrence, &mut entries)?;
        }
    }
    Ok(entries)
}

fn read_value(
    case: &CaseEntry,
    key: &str,
    value: String,
    occurrence: usize,
    entries: &mut Vec<ParsedEntry>,
) -> Result<(), ParseError> {
    let arity = case.arity();

    if arity == 0 {
        match value.as_str() {
            "true" => entries.push(entry(case, Vec::new(), Source::Configuration, occurrence)),
            "false" => {}
            _ => {
                return Err(ParseError::MalformedValue {
                    name: key.to_string(),
                    field: "flag".to_string(),
                    raw: value,
                    reason: "expected 'true' or 'false'".to_string(),
                });
            }
        }
    } else if case.is_rest() {
        let tokens = if value.is_empty() {
            Vec::new()
        } else {
            value.split(',').map(str::to_string).collect()
        };
        entries.push(entry(case, vec![Value::Tokens(tokens)], Source::Configuration, occurrence));
    } else if arity == 1 {
        record(case, key, &[value.as_str()], Source::Configuration, occurrence, entries)?;
    } else {
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() < arity {
            return Err(ParseError::MissingArgument {
                name: key.to_string(),
                expected: format!("{arity} comma-separated values"),
            });
        }
        if parts.len() > arity {
            return Err(ParseError::MalformedValue {
                name: key.to_string(),
                field: case.identifier.clone(),
                raw: value.clone(),
                reason: format!("expected {arity} comma-separated values, found {}", parts.len()),
            });
        }
        record(case, key, &parts, Source::Configuration, occurrence, entries)?;
    }
    Ok(())
}

/// Collapse non-gathering cases to their last occurrence, then check
/// mandatory cases.
fn finalize(
    schema: SchemaRef<'_>,
    mut entries: Vec<ParsedEntry>,
    options: ParseOptions,
) -> Result<Parsed, ParseError> {
    let gathers = |case: usize| schema.case(case).is_some_and(|c| c.attributes.gather_all_sources);

    let mut last: HashMap<usize, (Source, usize)> = HashMap::new();
    for e in &entries {
        if !gathers(e.case) {
            last.insert(e.case, (e.source, e.occurrence));
        }
    }
    entries.retain(|e| gathers(e.case) || last.get(&e.case) == Some(&(e.source, e.occurrence)));

    if !options.ignore_missing {
        for case in schema.cases().iter().filter(|c| c.attributes.mandatory) {
            if !entries.iter().any(|e| e.case == case.index) {
                return Err(ParseError::MissingMandatory {
                    name: case.display_name(),
                });
            }
        }
    }
    Ok(Parsed { entries })
}

/// Entries of `first` cases must precede every other entry.
fn check_first(schema: SchemaRef<'_>, entries: &[ParsedEntry]) -> Result<(), ParseError> {
    let mut seen_other = false;
    for e in entries {
        let Some(case) = schema.case(e.case) else {
            continue;
        };
        if !case.attributes.first {
            seen_other = true;
        } else if seen_other {
            return Err(ParseError::MisplacedFirst {
                name: case.display_name(),
            });
        }
    }
    Ok(())
}

fn check_duplicates(schema: SchemaRef<'_>, entries: &[ParsedEntry]) -> Result<(), ParseError> {
    for case in schema.cases().iter().filter(|c| !c.attributes.gather_all_sources) {
        let mut occurrences = entries.iter().filter(|e| e.case == case.index).map(|e| e.occurrence);
        if let Some(first) = occurrences.next() {
            if occurrences.any(|o| o != first) {
                return Err(ParseError::DuplicateArgument {
                    name: case.display_name(),
                });
            }
        }
    }
    Ok(())
}

/// Parse the raw payload of one occurrence and push its entries. A CSV
/// case yields one entry per element.
fn record(
    case: &CaseEntry,
    name: &str,
    raws: &[&str],
    source: Source,
    occurrence: usize,
    entries: &mut Vec<ParsedEntry>,
) -> Result<(), ParseError> {
    if case.attributes.csv {
        if let (Some(field), Some(raw)) = (case.fields.first(), raws.first()) {
            for element in raw.split(',') {
                let value = parse_field(name, field, element)?;
                entries.push(entry(case, vec![value], source, occurrence));
            }
        }
        return Ok(());
    }

    let fields = case
        .fields
        .iter()
        .zip(raws)
        .map(|(field, raw)| parse_field(name, field, raw))
        .collect::<Result<Vec<_>, _>>()?;
    entries.push(entry(case, fields, source, occurrence));
    Ok(())
}

fn parse_field(name: &str, field: &FieldEntry, raw: &str) -> Result<Value, ParseError> {
    let malformed = |reason: String| ParseError::MalformedValue {
        name: name.to_string(),
        field: field.name.clone(),
        raw: raw.to_string(),
        reason,
    };
    match &field.parser {
        FieldParser::Primitive(primitive) => (primitive.parse)(raw).map_err(malformed),
        FieldParser::Remainder => Ok(Value::Tokens(vec![raw.to_string()])),
        FieldParser::Nested(_) => Err(malformed("a sub-command has no textual form".to_string())),
    }
}

fn entry(case: &CaseEntry, fields: Vec<Value>, source: Source, occurrence: usize) -> ParsedEntry {
    ParsedEntry {
        case: case.index,
        fields,
        source,
        occurrence,
    }
}

fn next(counter: &mut usize) -> usize {
    let current = *counter;
    *counter += 1;
    current
}

fn expected_fields(case: &CaseEntry) -> String {
    case.fields
        .iter()
        .map(|f| format!("<{}>", f.label()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `-x` and `--name` are switch-like; `-` and `-5` are not.
pub(crate) fn is_switch_like(token: &str) -> bool {
    token
        .strip_prefix('-')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_ascii_digit())
}
