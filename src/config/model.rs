use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use directories::BaseDirs;
use serde::Deserialize;
use toml::Value;

pub const DEFAULT_SEARCH_LIMIT: usize = 8;
pub const DEFAULT_HISTORY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_TERMINAL: [&str; 2] = ["gnome-terminal", "--"];
const DEFAULT_ASSISTANT_BIN: &str = "claude";
const CLAUDE_HOME_ENV: &str = "CLAUDE_CONFIG_DIR";
const CLAUDE_HOME_DIR: &str = ".claude";

#[derive(Debug, Clone)]
pub struct Config {
    pub paths: Paths,
    pub history_timeout: Duration,
    pub search: SearchConfig,
    pub resume: ResumeConfig,
}

/// Filesystem locations the pipeline reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub history_path: PathBuf,
    pub projects_dir: PathBuf,
    pub temp_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub limit: usize,
}

/// How a session is resumed: `terminal` argv, then either the assistant
/// directly or an interactive `shell` that stays open afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeConfig {
    pub terminal: Vec<String>,
    pub bin: String,
    pub shell: String,
    pub keep_shell: bool,
}

impl Paths {
    /// Layout of a Claude home directory (`history.jsonl`, `projects/`).
    #[must_use]
    pub fn under_claude_home(home: &Path, temp_dir: &Path) -> Self {
        Self {
            history_path: home.join("history.jsonl"),
            projects_dir: home.join("projects"),
            temp_dir: temp_dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn defaults() -> Self {
        Self::under_claude_home(&default_claude_home(), &env::temp_dir())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            terminal: DEFAULT_TERMINAL.iter().map(ToString::to_string).collect(),
            bin: DEFAULT_ASSISTANT_BIN.to_string(),
            shell: default_shell(),
            keep_shell: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_paths(Paths::defaults())
    }
}

impl Config {
    #[must_use]
    pub fn with_paths(paths: Paths) -> Self {
        Self {
            paths,
            history_timeout: DEFAULT_HISTORY_TIMEOUT,
            search: SearchConfig::default(),
            resume: ResumeConfig::default(),
        }
    }

    /// Parse a merged configuration [`Value`] into a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys, wrong value types, paths that fail
    /// to expand, or out-of-range settings.
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawConfig = value
            .clone()
            .try_into()
            .map_err(|err: toml::de::Error| eyre!("failed to decode configuration: {err}"))?;
        raw.into_config()
    }
}

fn default_claude_home() -> PathBuf {
    if let Some(dir) = env::var(CLAUDE_HOME_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
    {
        return PathBuf::from(dir);
    }
    BaseDirs::new().map_or_else(
        || PathBuf::from(CLAUDE_HOME_DIR),
        |dirs| dirs.home_dir().join(CLAUDE_HOME_DIR),
    )
}

fn default_shell() -> String {
    env::var("SHELL")
        .ok()
        .filter(|shell| !shell.trim().is_empty())
        .unwrap_or_else(|| "sh".to_string())
}

fn expand_path(raw: &str, key: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|err| eyre!("failed to expand {key} '{raw}': {err}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default, alias = "historyPath")]
    history_path: Option<String>,
    #[serde(default, alias = "projectsDir")]
    projects_dir: Option<String>,
    #[serde(default, alias = "tempDir")]
    temp_dir: Option<String>,
    #[serde(default, alias = "historyTimeoutMs")]
    history_timeout_ms: Option<u64>,
    #[serde(default)]
    search: RawSearch,
    #[serde(default)]
    resume: RawResume,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSearch {
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResume {
    terminal: Option<TerminalSpec>,
    bin: Option<String>,
    shell: Option<String>,
    #[serde(alias = "keepShell")]
    keep_shell: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TerminalSpec {
    Argv(Vec<String>),
    Line(String),
}

impl TerminalSpec {
    fn into_argv(self) -> Result<Vec<String>> {
        match self {
            TerminalSpec::Argv(argv) => Ok(argv),
            TerminalSpec::Line(line) => shlex::split(&line)
                .ok_or_else(|| eyre!("resume.terminal '{line}' has unbalanced quotes")),
        }
    }
}

impl RawConfig {
    fn into_config(self) -> Result<Config> {
        let mut config = Config::default();

        if let Some(raw) = self.history_path {
            config.paths.history_path = expand_path(&raw, "history_path")?;
        }
        if let Some(raw) = self.projects_dir {
            config.paths.projects_dir = expand_path(&raw, "projects_dir")?;
        }
        if let Some(raw) = self.temp_dir {
            config.paths.temp_dir = expand_path(&raw, "temp_dir")?;
        }
        if let Some(ms) = self.history_timeout_ms {
            if ms == 0 {
                return Err(eyre!("history_timeout_ms must be greater than zero"));
            }
            config.history_timeout = Duration::from_millis(ms);
        }

        if let Some(limit) = self.search.limit {
            if limit == 0 {
                return Err(eyre!("search.limit must be at least 1"));
            }
            config.search.limit = limit;
        }

        if let Some(terminal) = self.resume.terminal {
            config.resume.terminal = terminal
                .into_argv()
                .wrap_err("invalid resume.terminal")?;
        }
        if let Some(bin) = self.resume.bin {
            if bin.trim().is_empty() {
                return Err(eyre!("resume.bin must not be empty"));
            }
            config.resume.bin = bin;
        }
        if let Some(shell) = self.resume.shell.filter(|shell| !shell.trim().is_empty()) {
            config.resume.shell = shell;
        }
        if let Some(keep_shell) = self.resume.keep_shell {
            config.resume.keep_shell = keep_shell;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config> {
        let value: Value = toml::from_str(text)?;
        Config::from_value(&value)
    }

    #[test]
    fn empty_config_uses_defaults() -> Result<()> {
        let config = parse("")?;
        assert_eq!(config.search.limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(config.history_timeout, DEFAULT_HISTORY_TIMEOUT);
        assert_eq!(config.resume.terminal, vec!["gnome-terminal", "--"]);
        assert_eq!(config.resume.bin, "claude");
        assert!(config.resume.keep_shell);
        assert!(config.paths.history_path.ends_with("history.jsonl"));
        assert!(config.paths.projects_dir.ends_with("projects"));
        Ok(())
    }

    #[test]
    fn accepts_camel_case_path_keys() -> Result<()> {
        let config = parse(
            "historyPath = \"/data/h.jsonl\"\nprojectsDir = \"/data/projects\"\ntempDir = \"/data/tmp\"\n",
        )?;
        assert_eq!(
            config.paths,
            Paths {
                history_path: PathBuf::from("/data/h.jsonl"),
                projects_dir: PathBuf::from("/data/projects"),
                temp_dir: PathBuf::from("/data/tmp"),
            }
        );
        Ok(())
    }

    #[test]
    fn terminal_line_is_split_like_a_shell() -> Result<()> {
        let config = parse("[resume]\nterminal = \"kitty --title 'Claude resume' --\"\n")?;
        assert_eq!(
            config.resume.terminal,
            vec!["kitty", "--title", "Claude resume", "--"]
        );
        Ok(())
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse("history = \"/x\"\n").unwrap_err();
        assert!(format!("{err}").contains("unknown field"));
    }

    #[test]
    fn rejects_zero_limit_and_unbalanced_terminal() {
        assert!(parse("[search]\nlimit = 0\n").is_err());
        assert!(parse("[resume]\nterminal = \"xterm -e 'oops\"\n").is_err());
        assert!(parse("[resume]\nbin = \"  \"\n").is_err());
    }

    #[test]
    fn reads_limit_timeout_and_shell_settings() -> Result<()> {
        let config = parse(
            "history_timeout_ms = 250\n[search]\nlimit = 4\n[resume]\nshell = \"zsh\"\nkeep_shell = false\nbin = \"claude-dev\"\n",
        )?;
        assert_eq!(config.history_timeout, Duration::from_millis(250));
        assert_eq!(config.search.limit, 4);
        assert_eq!(config.resume.shell, "zsh");
        assert!(!config.resume.keep_shell);
        assert_eq!(config.resume.bin, "claude-dev");
        Ok(())
    }
}
