use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "railsync")]
#[command(about = "Mirror a TestRail project's milestones, suites, sections, and cases into another project")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the JSON config file
    #[arg(long = "config", id = "config_path", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Make the destination project match the source project
    Sync(SyncArgs),
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Source project id
    #[arg(long, value_name = "ID")]
    pub source: Option<u64>,
    /// Destination project id
    #[arg(long, value_name = "ID")]
    pub destination: Option<u64>,
    #[command(flatten)]
    pub delete: DeleteFlags,
    /// Plan the changes without creating or deleting anything
    #[arg(long)]
    pub dry_run: bool,
    /// Append log output to this file
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub struct DeleteFlags {
    /// Delete destination records with no source counterpart
    #[arg(long, overrides_with = "no_delete")]
    pub delete: bool,
    /// Keep destination records with no source counterpart
    #[arg(long, overrides_with = "delete")]
    pub no_delete: bool,
}

impl DeleteFlags {
    /// `None` when neither flag was given
    pub const fn value(self) -> Option<bool> {
        match (self.delete, self.no_delete) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file
    Init(ConfigInitArgs),
    /// Print the resolved settings (password redacted)
    Show,
}

#[derive(Args, Debug, Default)]
pub struct ConfigInitArgs {
    /// TestRail instance URL, e.g. <https://acme.testrail.io>
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
    /// TestRail user (email)
    #[arg(long, value_name = "USER")]
    pub username: Option<String>,
    /// TestRail password or API key
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,
    /// Source project id
    #[arg(long, value_name = "ID")]
    pub source: Option<u64>,
    /// Destination project id
    #[arg(long, value_name = "ID")]
    pub destination: Option<u64>,
    #[command(flatten)]
    pub delete: DeleteFlags,
    /// Log file path
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
    /// Retries after HTTP 429
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,
}
