use std::path::PathBuf;

use argcase::{ArgCases, ParseResults};

#[derive(Debug, Clone, PartialEq, ArgCases)]
pub enum SyncArgs {
    /// directory to run in.
    #[arg(first, alt_name = "-C")]
    WorkingDir(PathBuf),
    /// print more output; may be repeated.
    #[arg(alt_name = "-v", gather_all_sources)]
    Verbose,
    /// show what would be done without doing it.
    #[arg(alt_name = "-n")]
    DryRun,
    /// number of parallel jobs.
    #[arg(equals_assignment)]
    Jobs(u32),
    /// comma-separated paths to skip.
    #[arg(csv, gather_all_sources)]
    Exclude(String),
    /// read settings from a configuration document.
    #[arg(no_app_settings)]
    Config(PathBuf),
    /// write the effective settings to a configuration document.
    #[arg(no_app_settings)]
    SaveConfig(PathBuf),
    /// print the argument schema as JSON.
    #[arg(hidden, no_app_settings)]
    DescribeSchema,
    /// push changes to a remote.
    #[arg(prefix = "none")]
    Push(ParseResults<PushArgs>),
    /// run a command in the working directory.
    #[arg(prefix = "none")]
    Exec(ParseResults<ExecArgs>),
}

#[derive(Debug, Clone, PartialEq, ArgCases)]
pub enum PushArgs {
    /// remote to push to.
    #[arg(main_command)]
    Remote(String),
    /// overwrite remote changes.
    #[arg(alt_name = "-f")]
    Force,
    /// tag to push along.
    #[arg(alt_name = "-t", gather_all_sources)]
    Tags(String),
}

#[derive(Debug, Clone, PartialEq, ArgCases)]
pub enum ExecArgs {
    /// command and its arguments.
    #[arg(main_command, rest)]
    Command(Vec<String>),
}

impl SyncArgs {
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Config(path) => Some(path),
            _ => None,
        }
    }

    pub fn save_config_path(&self) -> Option<&PathBuf> {
        match self {
            Self::SaveConfig(path) => Some(path),
            _ => None,
        }
    }
}
