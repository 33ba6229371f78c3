//! Duplicate identifier detection across sibling cases.

use indexmap::IndexMap;

use crate::error::{IdentifierKind, SchemaError};
use crate::schema::{CaseEntry, HelpSpec};

pub(crate) fn check(
    type_name: &str,
    cases: &[CaseEntry],
    help: &HelpSpec,
) -> Result<(), SchemaError> {
    let aliases = group(
        cases
            .iter()
            .flat_map(|c| c.cli_names.iter().map(move |name| (name.as_str(), c))),
    );
    for (alias, owners) in &aliases {
        if help.flags.iter().any(|flag| flag == alias) {
            return Err(SchemaError::ReservedHelpFlag {
                type_name: type_name.to_string(),
                case: owners[0].identifier.clone(),
                flag: alias.to_string(),
            });
        }
    }
    report_shared(type_name, IdentifierKind::CommandLine, aliases)?;

    // Configuration keys live in their own namespace; help flags don't apply.
    let keys = group(
        cases
            .iter()
            .filter_map(|c| c.app_settings_key.as_deref().map(|key| (key, c))),
    );
    report_shared(type_name, IdentifierKind::AppSettings, keys)
}

fn group<'a>(
    pairs: impl Iterator<Item = (&'a str, &'a CaseEntry)>,
) -> IndexMap<&'a str, Vec<&'a CaseEntry>> {
    let mut groups: IndexMap<&'a str, Vec<&'a CaseEntry>> = IndexMap::new();
    for (identifier, case) in pairs {
        let owners = groups.entry(identifier).or_default();
        if !owners.iter().any(|c| c.index == case.index) {
            owners.push(case);
        }
    }
    groups
}

fn report_shared(
    type_name: &str,
    kind: IdentifierKind,
    groups: IndexMap<&str, Vec<&CaseEntry>>,
) -> Result<(), SchemaError> {
    let mut shared: Vec<(&str, Vec<&CaseEntry>)> = groups
        .into_iter()
        .filter(|(_, owners)| owners.len() > 1)
        .collect();
    // Stable: equal-sized groups keep declaration order.
    shared.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    match shared.first() {
        Some((identifier, owners)) => Err(SchemaError::ConflictingIdentifier {
            type_name: type_name.to_string(),
            kind,
            identifier: identifier.to_string(),
            first: owners[0].identifier.clone(),
            second: owners[1].identifier.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::CaseAttributes;

    fn case(index: usize, identifier: &str, names: &[&str], key: Option<&str>) -> CaseEntry {
        CaseEntry {
            index,
            identifier: identifier.to_string(),
            usage: String::new(),
            default_name: names.first().map(|s| s.to_string()),
            cli_names: names.iter().map(|s| s.to_string()).collect(),
            app_settings_key: key.map(str::to_string),
            fields: Vec::new(),
            nested: None,
            attributes: CaseAttributes::default(),
        }
    }

    fn help() -> HelpSpec {
        HelpSpec {
            flags: vec!["--help".to_string(), "-h".to_string()],
            description: String::new(),
        }
    }

    #[test]
    fn accepts_distinct_identifiers() {
        let cases = vec![
            case(0, "Port", &["--port", "-p"], Some("port")),
            case(1, "Host", &["--host"], Some("host")),
        ];
        check("Args", &cases, &help()).unwrap();
    }

    #[test]
    fn rejects_help_flag_collision() {
        let cases = vec![
            case(0, "Port", &["--port"], None),
            case(1, "Host", &["--host", "-h"], None),
        ];
        let err = check("Args", &cases, &help()).unwrap_err();
        match err {
            SchemaError::ReservedHelpFlag { case, flag, .. } => {
                assert_eq!(case, "Host");
                assert_eq!(flag, "-h");
            }
            other => panic!("expected ReservedHelpFlag, got: {other:?}"),
        }
    }

    #[test]
    fn reports_largest_group_first() {
        let cases = vec![
            case(0, "A", &["--a", "-x"], None),
            case(1, "B", &["--b", "-y"], None),
            case(2, "C", &["--c", "-y"], None),
            case(3, "D", &["--d", "-x", "-y"], None),
        ];
        let err = check("Args", &cases, &help()).unwrap_err();
        match err {
            SchemaError::ConflictingIdentifier {
                kind,
                identifier,
                first,
                second,
                ..
            } => {
                assert_eq!(kind, IdentifierKind::CommandLine);
                assert_eq!(identifier, "-y");
                assert_eq!(first, "B");
                assert_eq!(second, "C");
            }
            other => panic!("expected ConflictingIdentifier, got: {other:?}"),
        }
    }

    #[test]
    fn rejects_shared_configuration_key() {
        let cases = vec![
            case(0, "Port", &["--port"], Some("port")),
            case(1, "Port2", &["--port2"], Some("port")),
        ];
        let err = check("Args", &cases, &help()).unwrap_err();
        match err {
            SchemaError::ConflictingIdentifier { kind, identifier, .. } => {
                assert_eq!(kind, IdentifierKind::AppSettings);
                assert_eq!(identifier, "port");
            }
            other => panic!("expected ConflictingIdentifier, got: {other:?}"),
        }
    }

    #[test]
    fn configuration_keys_may_match_help_flags() {
        let cases = vec![case(0, "Help", &["--show-help"], Some("--help"))];
        check("Args", &cases, &help()).unwrap();
    }
}
