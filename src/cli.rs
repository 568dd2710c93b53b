use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None, name = "cs", bin_name = "cs")]
pub struct Cli {
    /// Override the configuration directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
    /// Read session history from this file instead of the configured one.
    #[arg(long, value_name = "FILE", global = true)]
    pub history_path: Option<PathBuf>,
    /// Look for transcripts and session indexes under this directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub projects_dir: Option<PathBuf>,
    /// Write generated HTML pages to this directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub temp_dir: Option<PathBuf>,
    /// Emit JSON from query, overview, list, open, and resume --dry-run.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub json: bool,
    /// Increase log verbosity (use -vv for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Silence all log output.
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a launcher query: the overview when empty, matches otherwise.
    Query(QueryCommand),
    /// Render the overview table of every session.
    Overview(OverviewCommand),
    /// List sessions in the terminal.
    List(ListCommand),
    /// Render a session transcript and open it in the browser.
    Open(OpenCommand),
    /// Resume a session in a new terminal.
    Resume(ResumeCommand),
    /// Inspect configuration files.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Run environment diagnostics.
    Doctor,
}

#[derive(Debug, Default, Args)]
pub struct QueryCommand {
    /// Search terms (omit to get the overview).
    pub terms: Vec<String>,
}

impl QueryCommand {
    #[must_use]
    pub fn query(&self) -> Option<String> {
        let joined = self.terms.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Args)]
pub struct OverviewCommand {
    /// Open the rendered page in the browser.
    #[arg(long, action = ArgAction::SetTrue)]
    pub open: bool,
}

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show sessions whose transcript still exists.
    #[arg(long, action = ArgAction::SetTrue)]
    pub resumable: bool,
    /// Maximum number of sessions to show.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct OpenCommand {
    /// Session id or unique id prefix.
    pub session: String,
    /// Only render the page and print its path.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_browser: bool,
}

#[derive(Debug, Args)]
pub struct ResumeCommand {
    /// Session id or unique id prefix.
    pub session: String,
    /// Print the terminal command instead of running it.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the configuration directory and loaded sources.
    Where,
    /// Dump the merged configuration TOML.
    Dump,
}
