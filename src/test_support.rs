use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

use serde_json::{Value, json};

use crate::config::model::Paths;
use crate::session::project_slug;
use crate::summaries::INDEX_FILE;

/// Global mutex for tests that mutate process-wide environment variables.
pub static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Restore an environment variable when dropped.
///
/// Callers should hold [`ENV_LOCK`] while constructing instances of this type.
#[derive(Debug)]
pub struct EnvOverride {
    key: String,
    original: Option<OsString>,
}

impl EnvOverride {
    #[must_use]
    pub fn set_var(key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        let key = key.into();
        let original = std::env::var_os(&key);
        // SAFETY: tests that use this helper hold ENV_LOCK to serialize process-wide env mutation.
        unsafe {
            std::env::set_var(&key, value);
        }
        Self { key, original }
    }

    #[must_use]
    pub fn set_path(key: impl Into<String>, path: &Path) -> Self {
        Self::set_var(key, path.as_os_str())
    }

    #[must_use]
    pub fn remove(key: impl Into<String>) -> Self {
        let key = key.into();
        let original = std::env::var_os(&key);
        // SAFETY: tests that use this helper hold ENV_LOCK to serialize process-wide env mutation.
        unsafe {
            std::env::remove_var(&key);
        }
        Self { key, original }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        // SAFETY: tests that use this helper hold ENV_LOCK to serialize process-wide env mutation.
        unsafe {
            match &self.original {
                Some(value) => std::env::set_var(&self.key, value),
                None => std::env::remove_var(&self.key),
            }
        }
    }
}

/// Render a filesystem path so it can be embedded inside TOML without
/// triggering escape sequences on Windows.
#[must_use]
pub fn toml_path(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    #[cfg(windows)]
    {
        rendered.replace('\\', "\\\\")
    }
    #[cfg(not(windows))]
    {
        rendered.to_string()
    }
}

/// A throwaway Claude home: `history.jsonl`, `projects/`, and an output dir.
#[derive(Debug, Clone)]
pub struct ClaudeHome {
    root: PathBuf,
}

impl ClaudeHome {
    /// Create the layout under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub fn create(root: &Path) -> io::Result<Self> {
        let home = Self {
            root: root.to_path_buf(),
        };
        fs::create_dir_all(home.projects_dir())?;
        fs::create_dir_all(home.temp_dir())?;
        Ok(home)
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.root.join("history.jsonl")
    }

    #[must_use]
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    #[must_use]
    pub fn paths(&self) -> Paths {
        Paths {
            history_path: self.history_path(),
            projects_dir: self.projects_dir(),
            temp_dir: self.temp_dir(),
        }
    }

    /// Append raw lines to the history log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn append_history_lines(&self, lines: &[String]) -> io::Result<()> {
        use std::io::Write;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path())?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
        Ok(())
    }

    /// Append one prompt entry for `session_id` to the history log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn add_prompt(
        &self,
        session_id: &str,
        project: &str,
        display: &str,
        timestamp_ms: i64,
    ) -> io::Result<()> {
        let entry = json!({
            "display": display,
            "pastedContents": {},
            "timestamp": timestamp_ms,
            "project": project,
            "sessionId": session_id,
        });
        self.append_history_lines(&[entry.to_string()])
    }

    /// Write a transcript file made of `records`, one JSON value per line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_transcript(
        &self,
        project: &str,
        session_id: &str,
        records: &[Value],
    ) -> io::Result<PathBuf> {
        let lines: Vec<String> = records.iter().map(Value::to_string).collect();
        self.write_transcript_lines(project, session_id, &lines)
    }

    /// Write a transcript file verbatim, which allows malformed lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_transcript_lines(
        &self,
        project: &str,
        session_id: &str,
        lines: &[String],
    ) -> io::Result<PathBuf> {
        let dir = self.projects_dir().join(project_slug(project));
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{session_id}.jsonl"));
        let mut contents = lines.join("\n");
        contents.push('\n');
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write `sessions-index.json` for `project` with `(session id, summary)` entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_index(&self, project: &str, entries: &[(&str, &str)]) -> io::Result<PathBuf> {
        let dir = self.projects_dir().join(project_slug(project));
        fs::create_dir_all(&dir)?;
        let entries: Vec<Value> = entries
            .iter()
            .map(|(id, summary)| json!({ "sessionId": id, "summary": summary }))
            .collect();
        let path = dir.join(INDEX_FILE);
        fs::write(
            &path,
            json!({ "version": 1, "originalPath": project, "entries": entries }).to_string(),
        )?;
        Ok(path)
    }
}

/// A user message record as Claude Code writes it.
#[must_use]
pub fn user_record(text: &str) -> Value {
    json!({ "type": "user", "message": { "role": "user", "content": text } })
}

/// An assistant message record with the given content blocks.
#[must_use]
pub fn assistant_record(blocks: Value) -> Value {
    json!({ "type": "assistant", "message": { "role": "assistant", "content": blocks } })
}
