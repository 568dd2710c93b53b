pub mod catalog;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod history;
pub mod launch;
pub mod render;
pub mod search;
pub mod session;
pub mod summaries;
pub mod test_support;
pub mod transcript;

mod app;
mod util;

use std::io::{self, Write};

use clap::{CommandFactory, Parser};
use cli::{Command, QueryCommand};

pub use app::AppError;
pub use cli::Cli;

/// Run the cs CLI entrypoint.
///
/// # Errors
///
/// Returns an error when configuration loading or the chosen command fails.
pub fn run(cli: &Cli) -> color_eyre::Result<()> {
    init_tracing(cli);

    let app = app::App::bootstrap(cli)?;
    match &cli.command {
        Some(Command::Query(cmd)) => app.query(cmd),
        Some(Command::Overview(cmd)) => app.overview(cmd),
        Some(Command::List(cmd)) => app.list(cmd),
        Some(Command::Open(cmd)) => app.open(cmd),
        Some(Command::Resume(cmd)) => app.resume(cmd),
        Some(Command::Config(cmd)) => app.config_command(cmd),
        Some(Command::Doctor) => {
            app.doctor();
            Ok(())
        }
        None => app.query(&QueryCommand::default()),
    }
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[must_use]
pub fn command() -> clap::Command {
    Cli::command()
}

/// Process exit status for an error returned by [`run`].
#[must_use]
pub fn exit_code_for_error(err: &color_eyre::Report) -> i32 {
    err.downcast_ref::<AppError>().map_or(1, AppError::exit_code)
}

/// Print an error and its cause chain the way the binary reports failures.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_cli_error<W: Write>(err: &color_eyre::Report, mut out: W) -> io::Result<()> {
    let mut chain = err.chain();
    if let Some(head) = chain.next() {
        writeln!(out, "cs: {head}")?;
    }
    for cause in chain {
        writeln!(out, "    caused by: {cause}")?;
    }
    Ok(())
}

fn init_tracing(cli: &Cli) {
    let level = desired_level(cli);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn desired_level(cli: &Cli) -> tracing::level_filters::LevelFilter {
    if cli.quiet {
        return tracing::level_filters::LevelFilter::ERROR;
    }

    match cli.verbose {
        0 => tracing::level_filters::LevelFilter::WARN,
        1 => tracing::level_filters::LevelFilter::INFO,
        2 => tracing::level_filters::LevelFilter::DEBUG,
        _ => tracing::level_filters::LevelFilter::TRACE,
    }
}
