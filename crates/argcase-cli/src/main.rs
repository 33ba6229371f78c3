mod args;

use std::process::ExitCode;

use anyhow::{Context, Result};
use argcase::{ArgumentParser, ConfigDocument, ParseOutcome, ParseResults};
use tracing_subscriber::{EnvFilter, fmt};

use crate::args::SyncArgs;

const PROGRAM_NAME: &str = "argcase-demo";
const PARSE_FAILURE: u8 = 2;

enum Flow {
    Continue(ParseResults<SyncArgs>),
    Exit(ExitCode),
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let parser = ArgumentParser::<SyncArgs>::new()
        .context("invalid argument description")?
        .with_program_name(PROGRAM_NAME);
    let tokens: Vec<String> = std::env::args().skip(1).collect();

    let mut results = match handle(&parser, parser.parse_command_line(&tokens))? {
        Flow::Continue(results) => results,
        Flow::Exit(code) => return Ok(code),
    };

    if let Some(path) = results.last(|a| a.config_path().cloned()) {
        let document = ConfigDocument::from_file(&path)
            .with_context(|| format!("failed to load configuration: {}", path.display()))?;
        tracing::debug!(path = %path.display(), entries = document.entries.len(), "loaded configuration");
        results = match handle(&parser, parser.parse(&tokens, &document))? {
            Flow::Continue(results) => results,
            Flow::Exit(code) => return Ok(code),
        };
    }

    if results.contains("DescribeSchema") {
        let json = parser
            .describe()
            .to_json_pretty()
            .context("failed to serialize schema")?;
        println!("{json}");
        return Ok(ExitCode::SUCCESS);
    }

    for value in &results {
        println!("{value:?}");
    }
    let flat = parser
        .render_command_line(results.all())
        .context("failed to render arguments")?;
    println!("flat: {}", flat.join(" "));

    if let Some(path) = results.last(|a| a.save_config_path().cloned()) {
        let document = parser
            .render_configuration(results.all(), true)
            .context("failed to render configuration")?;
        document
            .write_file(&path)
            .with_context(|| format!("failed to write configuration: {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved configuration");
    }

    Ok(ExitCode::SUCCESS)
}

/// Help goes to stdout; parse failures print the message and usage to stderr.
fn handle(
    parser: &ArgumentParser<SyncArgs>,
    outcome: argcase::Result<ParseOutcome<SyncArgs>>,
) -> Result<Flow> {
    match outcome {
        Ok(ParseOutcome::Parsed(results)) => Ok(Flow::Continue(results)),
        Ok(ParseOutcome::HelpRequested(usage)) => {
            print!("{usage}");
            Ok(Flow::Exit(ExitCode::SUCCESS))
        }
        Err(argcase::Error::Parse(err)) => {
            eprint!("{}", parser.usage_with_message(format!("error: {err}")));
            Ok(Flow::Exit(ExitCode::from(PARSE_FAILURE)))
        }
        Err(err) => Err(err.into()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
