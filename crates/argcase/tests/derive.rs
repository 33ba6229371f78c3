use std::collections::HashMap;
use std::path::PathBuf;

use argcase::{
    ArgCases, ArgumentParser, ArgumentSchema, ConfigDocument, Error, ParseError, ParseOptions,
    ParseOutcome, ParseResults, PrimitiveRegistry, SchemaError, SchemaInfo,
};

#[derive(Debug, Clone, PartialEq, ArgCases)]
enum Args {
    /// directory to run in.
    #[arg(first, alt_name = "-C")]
    WorkingDir(PathBuf),
    /// force the operation.
    #[arg(alt_name = "-f")]
    Force,
    /// do not change anything.
    #[arg(alt_name = "-d")]
    DryRun,
    /// extra diagnostics.
    #[arg(alt_name = "-x", gather_all_sources)]
    Extra,
    /// a bar value.
    #[arg(equals_assignment)]
    Bar(i32),
    /// a baz value.
    #[arg(equals_assignment_or_spaced)]
    Baz(i32),
    /// value range.
    #[arg(print_labels)]
    Range { low: i64, high: i64 },
    /// excluded paths.
    #[arg(csv, gather_all_sources)]
    Exclude(String),
    /// labels to apply.
    #[arg(alt_name = "-l", gather_all_sources)]
    Label(String),
    /// log file.
    #[arg(no_cli, app_settings_key = "logging.file")]
    LogFile(String),
    /// tags, verbatim.
    #[arg(rest)]
    Tag(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, ArgCases)]
enum Repo {
    /// be verbose.
    #[arg(alt_name = "-v")]
    Verbose,
    /// push to a remote.
    #[arg(prefix = "none")]
    Push(ParseResults<PushArgs>),
}

#[derive(Debug, Clone, PartialEq, ArgCases)]
enum PushArgs {
    /// remote name.
    #[arg(main_command)]
    Remote(String),
    /// push forcibly.
    #[arg(alt_name = "-f")]
    Force,
}

#[derive(Debug, ArgCases)]
enum Server {
    /// port to listen on.
    #[arg(mandatory, alt_name = "-p")]
    Port(u16),
    /// host name.
    Host(String),
}

#[derive(Debug, ArgCases)]
#[arg(help_flags = "--usage", help_flags = "-?", help_description = "show usage.")]
enum CustomHelp {
    /// print the manual.
    #[arg(cli_name = "--help")]
    Help,
}

#[derive(Debug, ArgCases)]
enum SharedAlias {
    #[arg(alt_name = "-s")]
    Source,
    #[arg(alt_name = "-s")]
    Sink,
}

#[derive(Debug, ArgCases)]
enum HelpCollision {
    #[arg(alt_name = "-h")]
    Host(String),
}

#[derive(Debug, ArgCases)]
enum Loop {
    Again(ParseResults<Loop>),
}

fn parsed<T: ArgCases>(parser: &ArgumentParser<T>, tokens: &[&str]) -> ParseResults<T> {
    match parser.parse_command_line(tokens).unwrap() {
        ParseOutcome::Parsed(results) => results,
        ParseOutcome::HelpRequested(usage) => panic!("unexpected help request:\n{usage}"),
    }
}

fn parse_error<T: ArgCases + std::fmt::Debug>(parser: &ArgumentParser<T>, tokens: &[&str]) -> ParseError {
    match parser.parse_command_line(tokens) {
        Err(Error::Parse(err)) => err,
        other => panic!("expected a parse error, got: {other:?}"),
    }
}

#[test]
fn compilation_is_deterministic() {
    let registry = PrimitiveRegistry::standard();
    let a = ArgumentSchema::compile(Repo::describe(), registry).unwrap();
    let b = ArgumentSchema::compile(Repo::describe(), registry).unwrap();
    assert_eq!(SchemaInfo::from_schema(a.root()), SchemaInfo::from_schema(b.root()));

    let a = ArgumentSchema::compile(SharedAlias::describe(), registry).unwrap_err();
    let b = ArgumentSchema::compile(SharedAlias::describe(), registry).unwrap_err();
    assert_eq!(a, b);
}

#[test]
fn flat_rendering_round_trips() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    let values = vec![
        Args::WorkingDir(PathBuf::from("/srv/app")),
        Args::Force,
        Args::Extra,
        Args::Extra,
        Args::Bar(-3),
        Args::Baz(7),
        Args::Range { low: -10, high: 10 },
        Args::Exclude("target".to_string()),
        Args::Exclude("node_modules".to_string()),
    ];
    let tokens = parser.render_command_line(&values).unwrap();
    let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
    assert_eq!(parsed(&parser, &tokens).all(), values.as_slice());
}

#[test]
fn round_trip_collapses_duplicates() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    let values = vec![Args::Bar(1), Args::Force, Args::Bar(2)];
    let tokens = parser.render_command_line(&values).unwrap();
    let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
    assert_eq!(parsed(&parser, &tokens).all(), &[Args::Force, Args::Bar(2)]);
}

#[test]
fn grouped_switches() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    assert_eq!(
        parsed(&parser, &["-fdx"]).all(),
        parsed(&parser, &["-f", "-d", "-x"]).all()
    );
    match parse_error(&parser, &["-fdz"]) {
        ParseError::UnrecognizedToken { token } => assert_eq!(token, "-fdz"),
        other => panic!("expected UnrecognizedToken, got: {other:?}"),
    }
}

#[test]
fn conflicts_fail_compilation() {
    match ArgumentParser::<SharedAlias>::new().unwrap_err() {
        Error::Schema(SchemaError::ConflictingIdentifier {
            identifier,
            first,
            second,
            ..
        }) => {
            assert_eq!(identifier, "-s");
            assert_eq!(first, "Source");
            assert_eq!(second, "Sink");
        }
        other => panic!("expected ConflictingIdentifier, got: {other:?}"),
    }

    match ArgumentParser::<HelpCollision>::new().unwrap_err() {
        Error::Schema(SchemaError::ReservedHelpFlag { case, flag, .. }) => {
            assert_eq!(case, "Host");
            assert_eq!(flag, "-h");
        }
        other => panic!("expected ReservedHelpFlag, got: {other:?}"),
    }
}

#[test]
fn recursive_descriptions_fail_compilation() {
    let err = ArgumentParser::<Loop>::new().unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::RecursiveDescription { .. })
    ));
}

#[test]
fn mandatory_cases() {
    let parser = ArgumentParser::<Server>::new().unwrap();
    match parse_error(&parser, &["--host", "localhost"]) {
        ParseError::MissingMandatory { name } => assert_eq!(name, "--port"),
        other => panic!("expected MissingMandatory, got: {other:?}"),
    }

    let results = parsed(&parser, &["-p", "8080"]);
    let port = results.last(|a| match a {
        Server::Port(p) => Some(*p),
        _ => None,
    });
    assert_eq!(port, Some(8080));
    assert!(results.contains("Port"));
    assert!(!results.contains("Host"));
}

#[test]
fn nested_sub_command() {
    let parser = ArgumentParser::<Repo>::new().unwrap();
    let results = parsed(&parser, &["push", "origin"]);
    assert_eq!(results.len(), 1);
    let Repo::Push(push) = &results.all()[0] else {
        panic!("expected Push, got: {:?}", results.all());
    };
    assert_eq!(push.all(), &[PushArgs::Remote("origin".to_string())]);

    let results = parsed(&parser, &["-v", "push", "-f", "upstream"]);
    let push = results
        .last(|a| match a {
            Repo::Push(p) => Some(p.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        push.all(),
        &[PushArgs::Force, PushArgs::Remote("upstream".to_string())]
    );
}

#[test]
fn nested_help_renders_sub_command_usage() {
    let parser = ArgumentParser::<Repo>::new().unwrap().with_program_name("repo");
    match parser.parse_command_line(&["push", "--help"]).unwrap() {
        ParseOutcome::HelpRequested(usage) => {
            assert!(usage.starts_with("USAGE: repo push [--help] [--force] [<remote>]"));
            assert!(usage.contains("remote name."));
        }
        other => panic!("expected HelpRequested, got: {other:?}"),
    }
}

#[test]
fn nested_results_render_standalone_usage() {
    let parser = ArgumentParser::<Repo>::new().unwrap().with_program_name("repo");
    let results = parsed(&parser, &["push", "origin"]);
    let push = results
        .last(|a| match a {
            Repo::Push(push) => Some(push.clone()),
            _ => None,
        })
        .unwrap();

    let usage = push.standalone_usage().unwrap();
    assert!(usage.starts_with("OPTIONS:"), "unexpected usage:\n{usage}");
    assert!(!usage.contains("repo push"));
    assert!(usage.contains("remote name."));
    assert!(usage.contains("--help [-h]:"));
}

#[test]
fn equals_assignment() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    assert_eq!(parsed(&parser, &["--bar=42"]).all(), &[Args::Bar(42)]);
    match parse_error(&parser, &["--bar", "42"]) {
        ParseError::MissingArgument { name, .. } => assert_eq!(name, "--bar"),
        other => panic!("expected MissingArgument, got: {other:?}"),
    }

    assert_eq!(parsed(&parser, &["--baz=1"]).all(), &[Args::Baz(1)]);
    assert_eq!(parsed(&parser, &["--baz", "2"]).all(), &[Args::Baz(2)]);
}

#[test]
fn rest_collects_verbatim() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    let results = parsed(&parser, &["-f", "--tag", "a", "b", "c"]);
    assert_eq!(
        results.all(),
        &[
            Args::Force,
            Args::Tag(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        ]
    );
}

#[test]
fn usage_text_uses_doc_comments() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    let usage = parser.usage();
    assert!(usage.contains("--working-dir [-C] <path>:"));
    assert!(usage.contains("directory to run in."));
    assert!(usage.contains("--range <low:int> <high:int>:"));
    assert!(!usage.contains("log file."));

    let parser = ArgumentParser::<CustomHelp>::new().unwrap();
    assert!(parser.usage().contains("--usage [-?]:"));
    assert!(parser.usage().contains("show usage."));
    match parser.parse_command_line(&["-?"]).unwrap() {
        ParseOutcome::HelpRequested(_) => {}
        other => panic!("expected HelpRequested, got: {other:?}"),
    }
    let results = parsed(&parser, &["--help"]);
    assert!(results.contains("Help"));
}

#[test]
fn configuration_round_trip() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    let values = vec![
        Args::Force,
        Args::Range { low: 1, high: 2 },
        Args::Exclude("a".to_string()),
        Args::Exclude("b".to_string()),
        Args::LogFile("out.log".to_string()),
    ];
    let document = parser.render_configuration(&values, true).unwrap();
    assert_eq!(document.get("logging.file"), Some("out.log"));
    assert_eq!(document.get("exclude"), Some("a,b"));
    assert_eq!(document.get("range"), Some("1,2"));

    let json = document.to_json_pretty().unwrap();
    let reloaded = ConfigDocument::from_json(&json).unwrap();
    let results = parser.parse_configuration(&reloaded).unwrap();
    assert_eq!(results.all(), values.as_slice());
}

#[test]
fn configuration_keeps_every_gathered_value() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    let values = vec![
        Args::Force,
        Args::Extra,
        Args::Extra,
        Args::Label("a".to_string()),
        Args::Label("b".to_string()),
    ];
    let document = parser.render_configuration(&values, false).unwrap();
    assert_eq!(document.entries.iter().filter(|e| e.key == "label").count(), 2);

    let json = document.to_json_pretty().unwrap();
    let reloaded = ConfigDocument::from_json(&json).unwrap();
    let results = parser.parse_configuration(&reloaded).unwrap();
    assert_eq!(results.all(), values.as_slice());
}

#[test]
fn command_line_overrides_configuration() {
    let parser = ArgumentParser::<Server>::new().unwrap();
    let mut settings = HashMap::new();
    settings.insert("port".to_string(), "80".to_string());
    settings.insert("host".to_string(), "example.org".to_string());

    let ParseOutcome::Parsed(results) = parser.parse(&["-p", "8080"], &settings).unwrap() else {
        panic!("expected Parsed");
    };
    let ports = results.find_all(|a| match a {
        Server::Port(p) => Some(*p),
        _ => None,
    });
    assert_eq!(ports, vec![8080]);
    assert!(results.contains("Host"));

    // Mandatory cases may come from configuration only.
    let ParseOutcome::Parsed(results) = parser.parse::<&str, _>(&[], &settings).unwrap() else {
        panic!("expected Parsed");
    };
    assert!(results.contains("Port"));
}

#[test]
fn options_are_explicit() {
    let parser = ArgumentParser::<Server>::new()
        .unwrap()
        .with_options(ParseOptions::default().ignore_unrecognized(true).strict_duplicates(true));
    let results = parsed(&parser, &["--bogus", "-p", "1"]);
    assert_eq!(results.len(), 1);

    match parse_error(&parser, &["-p", "1", "--port", "2"]) {
        ParseError::DuplicateArgument { name } => assert_eq!(name, "--port"),
        other => panic!("expected DuplicateArgument, got: {other:?}"),
    }
}

#[test]
fn malformed_values_name_the_field() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    match parse_error(&parser, &["--range", "1", "high"]) {
        ParseError::MalformedValue { name, field, raw, .. } => {
            assert_eq!(name, "--range");
            assert_eq!(field, "high");
            assert_eq!(raw, "high");
        }
        other => panic!("expected MalformedValue, got: {other:?}"),
    }
}

#[test]
fn first_cases_must_lead() {
    let parser = ArgumentParser::<Args>::new().unwrap();
    parsed(&parser, &["-C", "/tmp", "-f"]);
    match parse_error(&parser, &["-f", "-C", "/tmp"]) {
        ParseError::MisplacedFirst { name } => assert_eq!(name, "--working-dir"),
        other => panic!("expected MisplacedFirst, got: {other:?}"),
    }
}

#[test]
fn schema_metadata_export() {
    let parser = ArgumentParser::<Repo>::new().unwrap();
    let info = parser.describe();
    assert_eq!(info.type_name, "Repo");
    assert_eq!(info.cases[0].cli_names, vec!["--verbose", "-v"]);
    let push = info.cases[1].sub_command.as_ref().unwrap();
    assert_eq!(push.cases[0].flags, vec!["main-command"]);
}
