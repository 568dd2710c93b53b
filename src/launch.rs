use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use directories::BaseDirs;
use serde::Serialize;
use shell_escape::unix::escape as shell_escape;

use crate::config::model::ResumeConfig;
use crate::session::Session;

/// A fully resolved process launch: argv plus working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    pub display: String,
}

impl LaunchPlan {
    fn new(argv: Vec<String>, cwd: PathBuf) -> Self {
        let display = argv
            .iter()
            .map(|arg| quote(arg).into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        Self { argv, cwd, display }
    }

    /// A copy-pasteable shell line equivalent to running the plan.
    #[must_use]
    pub fn shell_line(&self) -> String {
        format!(
            "cd {} && {}",
            quote(&self.cwd.to_string_lossy()),
            self.display
        )
    }
}

fn quote(arg: &str) -> Cow<'_, str> {
    shell_escape(Cow::Borrowed(arg))
}

/// Build the terminal invocation that resumes `session` in its project.
///
/// The project directory becomes the child's working directory rather than
/// part of any command string. With `keep_shell`, the assistant runs inside
/// an interactive shell that stays open afterwards; every token embedded in
/// that shell line is quoted.
#[must_use]
pub fn resume_plan(resume: &ResumeConfig, session: &Session) -> LaunchPlan {
    let mut argv = resume.terminal.clone();
    if resume.keep_shell {
        let line = format!(
            "{} --resume {}; exec {}",
            quote(&resume.bin),
            quote(&session.session_id),
            quote(&resume.shell),
        );
        argv.extend([resume.shell.clone(), "-ic".to_string(), line]);
    } else {
        argv.extend([
            resume.bin.clone(),
            "--resume".to_string(),
            session.session_id.clone(),
        ]);
    }
    LaunchPlan::new(argv, working_dir(&session.project))
}

fn working_dir(project: &str) -> PathBuf {
    let project_dir = Path::new(project);
    if !project.is_empty() && project_dir.is_dir() {
        return project_dir.to_path_buf();
    }
    tracing::warn!(project, "project directory missing; resuming from home directory");
    BaseDirs::new().map_or_else(|| PathBuf::from("."), |dirs| dirs.home_dir().to_path_buf())
}

/// Start `plan` detached from this process; its exit status is not observed.
///
/// # Errors
///
/// Returns an error if the plan is empty or the program cannot be started.
pub fn spawn_detached(plan: &LaunchPlan) -> Result<()> {
    let (program, args) = plan
        .argv
        .split_first()
        .ok_or_else(|| eyre!("launch plan produced an empty argv"))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&plan.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd
        .spawn()
        .wrap_err_with(|| format!("failed to launch '{program}'"))?;
    tracing::info!(pid = child.id(), command = %plan.display, "launched detached process");
    Ok(())
}

/// `file://` URL for a generated page.
#[must_use]
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Open `url` with the desktop's default handler without waiting on it.
///
/// # Errors
///
/// Returns an error if no handler could be started.
pub fn open_in_browser(url: &str) -> Result<()> {
    open::that_detached(url).wrap_err_with(|| format!("failed to open {url}"))?;
    tracing::info!(url, "opened in browser");
    Ok(())
}
