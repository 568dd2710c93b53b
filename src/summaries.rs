use std::collections::HashMap;
use std::fs;
use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use walkdir::WalkDir;

use crate::session::{Session, UNTITLED_TOPIC};

pub const INDEX_FILE: &str = "sessions-index.json";

/// Summaries starting with this marker record a failed summarization.
const ERROR_PREFIX: &str = "API Error";

#[derive(Debug, Deserialize)]
struct SessionsIndex {
    #[serde(default)]
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    modified: Option<String>,
}

#[derive(Debug)]
struct Candidate {
    summary: String,
    modified: Option<OffsetDateTime>,
}

/// Collect `session id -> summary` from every project's index file.
///
/// When several entries name the same session, the one with the latest
/// `modified` stamp wins; undated entries lose to dated ones and otherwise
/// the later-scanned entry wins. Unreadable files are skipped.
#[must_use]
pub fn load_summaries(projects_dir: &Path) -> HashMap<String, String> {
    if !projects_dir.is_dir() {
        tracing::debug!(path = %projects_dir.display(), "projects directory missing; no summaries");
        return HashMap::new();
    }

    let mut best: HashMap<String, Candidate> = HashMap::new();
    let index_files = WalkDir::new(projects_dir)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == INDEX_FILE);

    for file in index_files {
        let index = match read_index(file.path()) {
            Ok(index) => index,
            Err(err) => {
                tracing::debug!(path = %file.path().display(), error = %err, "skipping session index");
                continue;
            }
        };

        for entry in index.entries {
            let Some(session_id) = entry.session_id.filter(|id| !id.is_empty()) else {
                continue;
            };
            let summary = entry.summary.as_deref().unwrap_or_default().trim();
            if summary.is_empty() || summary.starts_with(ERROR_PREFIX) {
                continue;
            }
            let candidate = Candidate {
                summary: summary.to_string(),
                modified: entry
                    .modified
                    .as_deref()
                    .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok()),
            };
            match best.get(&session_id) {
                Some(existing) if candidate.modified < existing.modified => {}
                _ => {
                    best.insert(session_id, candidate);
                }
            }
        }
    }

    best.into_iter()
        .map(|(id, candidate)| (id, candidate.summary))
        .collect()
}

fn read_index(path: &Path) -> Result<SessionsIndex> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

/// Attach summaries to sessions that have no topic yet; returns how many changed.
pub fn apply_summaries(sessions: &mut [Session], summaries: &HashMap<String, String>) -> usize {
    let mut applied = 0;
    for session in sessions.iter_mut().filter(|session| !session.has_topic()) {
        if let Some(summary) = summaries.get(&session.session_id) {
            session.topic.clone_from(summary);
            applied += 1;
        }
    }
    applied
}

/// Give every still-untitled session its first prompt or a placeholder.
pub fn apply_fallback_topics(sessions: &mut [Session]) {
    for session in sessions.iter_mut().filter(|session| !session.has_topic()) {
        session.topic = session
            .first_prompt
            .clone()
            .unwrap_or_else(|| UNTITLED_TOPIC.to_string());
    }
}
