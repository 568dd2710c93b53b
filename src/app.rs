use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde_json::json;
use which::which;

use crate::catalog::{self, LookupError};
use crate::cli::{
    Cli, ConfigCommand, ListCommand, OpenCommand, OverviewCommand, QueryCommand, ResumeCommand,
};
use crate::config::LoadedConfig;
use crate::config::model::Config;
use crate::dispatch::{self, Action, ResultItem};
use crate::launch;
use crate::render;
use crate::session::Session;
use crate::util;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("session '{0}' has no transcript on disk and cannot be resumed")]
    NotResumable(String),
}

impl AppError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Lookup(LookupError::Ambiguous { .. }) => 2,
            AppError::Lookup(LookupError::NotFound(_)) => 3,
            AppError::NotResumable(_) => 4,
        }
    }
}

pub struct App<'cli> {
    pub cli: &'cli Cli,
    pub loaded: LoadedConfig,
}

impl<'cli> App<'cli> {
    /// Load configuration and apply command-line path overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or are invalid.
    pub fn bootstrap(cli: &'cli Cli) -> Result<Self> {
        let mut loaded = crate::config::load(cli.config_dir.as_deref())?;
        let paths = &mut loaded.config.paths;
        if let Some(path) = &cli.history_path {
            paths.history_path.clone_from(path);
        }
        if let Some(path) = &cli.projects_dir {
            paths.projects_dir.clone_from(path);
        }
        if let Some(path) = &cli.temp_dir {
            paths.temp_dir.clone_from(path);
        }
        tracing::debug!(
            history = %paths.history_path.display(),
            projects = %paths.projects_dir.display(),
            temp = %paths.temp_dir.display(),
            "resolved paths"
        );
        Ok(Self { cli, loaded })
    }

    fn config(&self) -> &Config {
        &self.loaded.config
    }

    /// Answer a launcher query and print the resulting items.
    ///
    /// # Errors
    ///
    /// Returns an error if the overview page cannot be written or output fails
    /// to serialize.
    pub fn query(&self, cmd: &QueryCommand) -> Result<()> {
        let query = cmd.query();
        let items = dispatch::dispatch(self.config(), query.as_deref())?;

        if self.cli.json {
            println!("{}", serde_json::to_string_pretty(&items)?);
        } else {
            print_items(&items);
        }
        Ok(())
    }

    /// Render the overview page, print its path, and optionally open it.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be written or the browser fails to start.
    pub fn overview(&self, cmd: &OverviewCommand) -> Result<()> {
        let sessions = catalog::load_catalog(self.config());
        let path = render::write_overview(&sessions, &self.config().paths.temp_dir)?;

        if self.cli.json {
            let payload = json!({
                "path": path,
                "sessions": sessions.len(),
                "resumable": catalog::resumable_count(&sessions),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            println!("{}", path.display());
        }

        if cmd.open {
            launch::open_in_browser(&launch::file_url(&path))?;
        }
        Ok(())
    }

    /// Print the session catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn list(&self, cmd: &ListCommand) -> Result<()> {
        let sessions: Vec<Session> = catalog::load_catalog(self.config())
            .into_iter()
            .filter(|session| !cmd.resumable || session.resumable)
            .take(cmd.limit.unwrap_or(usize::MAX))
            .collect();

        if self.cli.json {
            println!("{}", serde_json::to_string_pretty(&sessions)?);
            return Ok(());
        }

        if sessions.is_empty() {
            println!("No sessions found.");
            return Ok(());
        }

        print_sessions_table(&sessions);
        Ok(())
    }

    /// Render a session transcript and open it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be resolved, is not resumable, or
    /// the transcript cannot be rendered or opened.
    pub fn open(&self, cmd: &OpenCommand) -> Result<()> {
        let session = self.resumable_session(&cmd.session)?;
        let paths = &self.config().paths;
        let path = render::write_transcript(&session, &paths.projects_dir, &paths.temp_dir)
            .wrap_err_with(|| format!("failed to render transcript for {}", session.session_id))?;

        if self.cli.json {
            let payload = json!({ "session_id": session.session_id, "path": path });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            println!("{}", path.display());
        }

        if !cmd.no_browser {
            launch::open_in_browser(&launch::file_url(&path))?;
        }
        Ok(())
    }

    /// Resume a session in a new terminal, or print the command with `--dry-run`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be resolved, is not resumable, or
    /// the terminal fails to start.
    pub fn resume(&self, cmd: &ResumeCommand) -> Result<()> {
        let session = self.resumable_session(&cmd.session)?;
        let plan = launch::resume_plan(&self.config().resume, &session);

        if cmd.dry_run {
            if self.cli.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("{}", plan.shell_line());
            }
            return Ok(());
        }

        launch::spawn_detached(&plan)
            .wrap_err_with(|| format!("failed to resume session {}", session.session_id))
    }

    /// Execute one of the configuration subcommands.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged configuration cannot be serialized.
    pub fn config_command(&self, cmd: &ConfigCommand) -> Result<()> {
        match cmd {
            ConfigCommand::Where => {
                self.config_where();
                Ok(())
            }
            ConfigCommand::Dump => {
                println!("{}", toml::to_string_pretty(&self.loaded.merged)?);
                Ok(())
            }
        }
    }

    /// Report whether the files and binaries the pipeline depends on exist.
    pub fn doctor(&self) {
        let config = self.config();
        let paths = &config.paths;
        println!("cs doctor");
        println!("=========");

        report_path("history log", &paths.history_path, paths.history_path.is_file());
        report_path("projects directory", &paths.projects_dir, paths.projects_dir.is_dir());
        report_path("temp directory", &paths.temp_dir, paths.temp_dir.is_dir());

        if let Some(terminal) = config.resume.terminal.first() {
            report_binary("terminal", terminal);
        } else {
            println!("- no terminal configured; resume runs the assistant directly");
        }
        report_binary("assistant", &config.resume.bin);
        if config.resume.keep_shell {
            report_binary("shell", &config.resume.shell);
        }

        let sessions = catalog::load_catalog(config);
        println!(
            "\nSessions: {} ({} resumable)",
            sessions.len(),
            catalog::resumable_count(&sessions)
        );
    }

    fn config_where(&self) {
        println!(
            "Configuration directory: {}",
            self.loaded.config_dir.display()
        );
        println!("Sources (in load order):");
        if self.loaded.sources.is_empty() {
            println!("  (none, using defaults)");
        }
        for source in &self.loaded.sources {
            println!("  - {} ({})", source.path.display(), source.kind.as_str());
        }
        let paths = &self.config().paths;
        println!("History log: {}", paths.history_path.display());
        println!("Projects directory: {}", paths.projects_dir.display());
        println!("Temp directory: {}", paths.temp_dir.display());
    }

    fn resumable_session(&self, selector: &str) -> Result<Session> {
        let sessions = catalog::load_catalog(self.config());
        let session = catalog::find_session(&sessions, selector).map_err(AppError::from)?;
        if !session.resumable {
            return Err(AppError::NotResumable(session.session_id.clone()).into());
        }
        Ok(session.clone())
    }
}

fn print_items(items: &[ResultItem]) {
    for item in items {
        println!("{}", item.name);
        println!("    {}", item.description);
        match &item.action {
            Action::OpenUrl { url } => println!("    open: {url}"),
            Action::Resume { session_id, .. } => println!("    run: cs resume {session_id}"),
            Action::Nothing => {}
        }
    }
}

fn print_sessions_table(sessions: &[Session]) {
    println!(
        "{:<8} {:<40} {:<20} {:<16} {:>5}  Status",
        "Session", "Topic", "Folder", "Date", "Msgs"
    );
    println!("{}", "-".repeat(100));
    for session in sessions {
        println!(
            "{:<8} {:<40} {:<20} {:<16} {:>5}  {}",
            session.short_id(),
            util::truncate(&session.topic, 40),
            util::truncate(&session.folder, 20),
            session.date,
            session.messages,
            if session.resumable { "resumable" } else { "expired" },
        );
    }
}

fn report_path(label: &str, path: &std::path::Path, ok: bool) {
    if ok {
        println!("✔ {label} {}", path.display());
    } else {
        println!("✘ {label} missing: {}", path.display());
    }
}

fn report_binary(label: &str, bin: &str) {
    match which(bin) {
        Ok(path) => println!("✔ {label} binary '{bin}' found at {}", path.display()),
        Err(_) => println!("✘ {label} binary '{bin}' not found on PATH"),
    }
}
