//! Serializable description of a compiled schema.
//!
//! Used by tooling that wants to inspect accepted arguments without linking
//! the description types, e.g. for shell completion generators.

use serde::{Deserialize, Serialize};

use crate::description::{Assignment, CliPrefix};
use crate::schema::{CaseEntry, SchemaRef};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaInfo {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub help_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cases: Vec<CaseInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CaseInfo {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cli_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_settings_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldInfo>,
    /// Set on sub-command cases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_command: Option<Box<SchemaInfo>>,
    #[serde(default)]
    pub assignment: Assignment,
    /// Prefix override of this case, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<CliPrefix>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FieldInfo {
    pub name: String,
    pub label: String,
}

impl SchemaInfo {
    pub fn from_schema(node: SchemaRef<'_>) -> Self {
        Self {
            type_name: node.type_name().to_string(),
            help_flags: node.help().flags.clone(),
            cases: node
                .cases()
                .iter()
                .map(|case| CaseInfo::from_case(node, case))
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl CaseInfo {
    fn from_case(node: SchemaRef<'_>, case: &CaseEntry) -> Self {
        Self {
            identifier: case.identifier.clone(),
            usage: case.usage.trim().to_string(),
            cli_names: case.cli_names.clone(),
            app_settings_key: case.app_settings_key.clone(),
            fields: case
                .fields
                .iter()
                .map(|f| FieldInfo {
                    name: f.name.clone(),
                    label: f.label().to_string(),
                })
                .collect(),
            sub_command: node
                .child(case)
                .map(|child| Box::new(SchemaInfo::from_schema(child))),
            assignment: case.attributes.assignment,
            prefix: case.attributes.prefix,
            flags: case_flags(case),
        }
    }
}

fn case_flags(case: &CaseEntry) -> Vec<String> {
    let a = &case.attributes;
    let mut flags = Vec::new();
    for (set, name) in [
        (a.mandatory, "mandatory"),
        (a.gather_all_sources, "gather-all-sources"),
        (a.rest, "rest"),
        (a.first, "first"),
        (a.hidden, "hidden"),
        (a.print_labels, "print-labels"),
        (a.csv, "csv"),
        (a.main_command, "main-command"),
    ] {
        if set {
            flags.push(name.to_string());
        }
    }
    flags
}
