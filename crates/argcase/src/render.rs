//! Usage text, flat token and configuration document rendering.

use std::collections::HashMap;

use crate::config::{ConfigDocument, ConfigEntry};
use crate::description::Assignment;
use crate::error::{Error, Result};
use crate::parser::is_switch_like;
use crate::schema::{CaseEntry, FieldEntry, FieldParser, SchemaRef};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageOptions {
    /// Enables the `USAGE:` header.
    pub program_name: Option<String>,
    /// Printed before everything else, e.g. a parse failure.
    pub message: Option<String>,
}

impl UsageOptions {
    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = Some(name.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Render the usage text of one schema level.
pub fn render_usage(node: SchemaRef<'_>, options: &UsageOptions) -> String {
    let mut out = String::new();
    if let Some(message) = options.message.as_deref().map(str::trim_end) {
        if !message.is_empty() {
            out.push_str(message);
            out.push('\n');
        }
    }

    let visible: Vec<&CaseEntry> = {
        let shown = |c: &&CaseEntry| {
            !c.attributes.hidden && (!c.cli_names.is_empty() || c.is_main_command())
        };
        let cases = node.cases();
        cases
            .iter()
            .filter(|c| c.attributes.first)
            .chain(cases.iter().filter(|c| !c.attributes.first))
            .filter(shown)
            .collect()
    };

    if let Some(program) = options.program_name.as_deref() {
        let mut header = format!("USAGE: {}", command_path(node, program));
        if let Some(flag) = node.help().flags.first() {
            header.push_str(&format!(" [{flag}]"));
        }
        for case in visible.iter().filter(|c| !c.is_main_command()) {
            let synopsis = case_synopsis(case, false);
            if case.attributes.mandatory {
                header.push_str(&format!(" {synopsis}"));
            } else {
                header.push_str(&format!(" [{synopsis}]"));
            }
        }
        if let Some(main) = visible.iter().find(|c| c.is_main_command()) {
            let synopsis = case_synopsis(main, false);
            if main.attributes.mandatory {
                header.push_str(&format!(" {synopsis}"));
            } else {
                header.push_str(&format!(" [{synopsis}]"));
            }
        }
        out.push_str(&header);
        out.push_str("\n\n");
    }

    let mut rows: Vec<(String, &str)> = visible
        .iter()
        .map(|c| (format!("{}:", case_synopsis(c, true)), c.usage.trim()))
        .collect();
    let help = node.help();
    if let Some((primary, alts)) = help.flags.split_first() {
        let mut left = primary.clone();
        if !alts.is_empty() {
            left.push_str(&format!(" [{}]", alts.join("|")));
        }
        left.push(':');
        rows.push((left, help.description.trim()));
    }

    out.push_str("OPTIONS:\n\n");
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, usage) in rows {
        if usage.is_empty() {
            out.push_str(&format!("    {left}\n"));
        } else {
            out.push_str(&format!("    {left:width$} {usage}\n"));
        }
    }
    out
}

/// `program sub sub` for a nested level.
fn command_path(node: SchemaRef<'_>, program: &str) -> String {
    let mut path = Vec::new();
    let mut current = node;
    while let Some((parent, case)) = current.parent() {
        path.push(case.display_name());
        current = parent;
    }
    path.push(program.to_string());
    path.reverse();
    path.join(" ")
}

fn case_synopsis(case: &CaseEntry, with_alts: bool) -> String {
    if case.is_main_command() {
        let mut out = case.display_name();
        if case.is_rest() {
            out.push_str("...");
        }
        return out;
    }

    let mut out = case.display_name();
    if with_alts && !case.alt_names().is_empty() {
        out.push_str(&format!(" [{}]", case.alt_names().join("|")));
    }
    for field in &case.fields {
        let placeholder = if case.attributes.print_labels {
            format!("<{}:{}>", field.name, field.label())
        } else {
            format!("<{}>", field.label())
        };
        if case.attributes.assignment == Assignment::Equals {
            out.push('=');
        } else {
            out.push(' ');
        }
        out.push_str(&placeholder);
    }
    if case.is_rest() {
        out.push_str("...");
    }
    out
}

/// Render concrete values as command-line tokens, in input order.
pub fn render_command_line(node: SchemaRef<'_>, values: &[(usize, Vec<Value>)]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for (case, fields) in values {
        push_tokens(node, *case, fields, &mut out)?;
    }
    Ok(out)
}

fn push_tokens(node: SchemaRef<'_>, index: usize, fields: &[Value], out: &mut Vec<String>) -> Result<()> {
    let case = checked_case(node, index, fields)?;

    if case.is_main_command() {
        let start = out.len();
        for (field, value) in case.fields.iter().zip(fields) {
            push_unparsed(field, value, out);
        }
        // Only a leading non-switch token reaches the main command.
        if let Some(token) = out.get(start).filter(|t| is_switch_like(t)) {
            return Err(Error::SwitchLikePositional {
                case: case.identifier.clone(),
                token: token.clone(),
            });
        }
        return Ok(());
    }

    let Some(primary) = case.default_name.as_ref() else {
        return Err(Error::NoCommandLineName {
            case: case.identifier.clone(),
        });
    };

    if let (Some(child), [Value::Nested(parsed)]) = (node.child(case), fields) {
        out.push(primary.clone());
        for entry in &parsed.entries {
            push_tokens(child, entry.case, &entry.fields, out)?;
        }
        return Ok(());
    }

    if case.attributes.assignment != Assignment::Spaced {
        if let (Some(field), [value]) = (case.fields.first(), fields) {
            out.push(format!("{primary}={}", unparse(field, value)));
            return Ok(());
        }
    }

    out.push(primary.clone());
    for (field, value) in case.fields.iter().zip(fields) {
        push_unparsed(field, value, out);
    }
    Ok(())
}

fn push_unparsed(field: &FieldEntry, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Tokens(tokens) => out.extend(tokens.iter().cloned()),
        _ => out.push(unparse(field, value)),
    }
}

fn unparse(field: &FieldEntry, value: &Value) -> String {
    match &field.parser {
        FieldParser::Primitive(primitive) => (primitive.unparse)(value),
        FieldParser::Remainder | FieldParser::Nested(_) => value.to_string(),
    }
}

fn checked_case<'a>(node: SchemaRef<'a>, index: usize, fields: &[Value]) -> Result<&'a CaseEntry> {
    node.case(index)
        .filter(|case| case.arity() == fields.len())
        .ok_or_else(|| Error::Reflect {
            type_name: node.type_name().to_string(),
            case: index,
        })
}

/// Render concrete values as a configuration document. Values of cases
/// without a configuration key are skipped; the CSV values of one case are
/// joined into a single entry.
pub fn render_configuration(
    node: SchemaRef<'_>,
    values: &[(usize, Vec<Value>)],
    with_comments: bool,
) -> Result<ConfigDocument> {
    let mut document = ConfigDocument::new();
    let mut csv_slots: HashMap<usize, usize> = HashMap::new();

    for (index, fields) in values {
        let case = checked_case(node, *index, fields)?;
        let Some(key) = case.app_settings_key.as_ref() else {
            continue;
        };

        let value = if fields.is_empty() {
            "true".to_string()
        } else {
            case.fields
                .iter()
                .zip(fields)
                .map(|(field, value)| match value {
                    Value::Tokens(tokens) => tokens.join(","),
                    _ => unparse(field, value),
                })
                .collect::<Vec<_>>()
                .join(",")
        };

        if case.attributes.csv {
            if let Some(&slot) = csv_slots.get(&case.index) {
                let entry = &mut document.entries[slot];
                entry.value.push(',');
                entry.value.push_str(&value);
                continue;
            }
            csv_slots.insert(case.index, document.entries.len());
        }

        document.push_entry(ConfigEntry {
            key: key.clone(),
            value,
            comment: with_comments.then(|| config_comment(case)),
        });
    }
    Ok(document)
}

fn config_comment(case: &CaseEntry) -> String {
    let labels = case
        .fields
        .iter()
        .map(|f| format!("<{}>", f.label()))
        .collect::<Vec<_>>()
        .join(",");
    let usage = case.usage.trim();
    if labels.is_empty() {
        usage.to_string()
    } else {
        format!("{labels}: {usage}")
    }
}
