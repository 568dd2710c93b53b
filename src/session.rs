use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Topic shown for sessions with neither an index summary nor a first prompt.
pub const UNTITLED_TOPIC: &str = "(untitled)";

const SHORT_ID_LEN: usize = 8;
const TRANSCRIPT_EXT: &str = "jsonl";

static SLUG_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9-]").unwrap());

/// One conversation reconstructed from the history log.
///
/// Records are rebuilt on every invocation; nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub session_id: String,
    pub project: String,
    pub folder: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<i64>,
    pub messages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_prompt: Option<String>,
    pub topic: String,
    pub resumable: bool,
}

impl Session {
    #[must_use]
    pub fn short_id(&self) -> &str {
        short_id(&self.session_id)
    }

    #[must_use]
    pub fn has_topic(&self) -> bool {
        !self.topic.trim().is_empty()
    }

    /// Location of the full transcript the assistant keeps for this session.
    #[must_use]
    pub fn transcript_path(&self, projects_dir: &Path) -> PathBuf {
        projects_dir
            .join(project_slug(&self.project))
            .join(format!("{}.{TRANSCRIPT_EXT}", self.session_id))
    }
}

/// Convert a project path to the directory name Claude Code stores it under.
///
/// Leading and trailing slashes are stripped, every character outside
/// `[A-Za-z0-9-]` becomes a hyphen, and the result is prefixed with `-`.
#[must_use]
pub fn project_slug(project: &str) -> String {
    let trimmed = project.trim_matches('/');
    format!("-{}", SLUG_UNSAFE.replace_all(trimmed, "-"))
}

/// Display name for a project: its final path component.
#[must_use]
pub fn folder_name(project: &str) -> String {
    Path::new(project)
        .file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| project.to_string(), str::to_string)
}

#[must_use]
pub fn short_id(session_id: &str) -> &str {
    match session_id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &session_id[..idx],
        None => session_id,
    }
}
