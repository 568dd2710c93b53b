use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::session::{Session, folder_name};
use crate::util;

const PROMPT_PREVIEW_CHARS: usize = 80;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to read history log")]
    Io(#[from] io::Error),
    #[error("history log took longer than the configured timeout")]
    TimedOut,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    display: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

#[derive(Debug, Default)]
struct SessionAccumulator {
    project: Option<String>,
    first_prompt: Option<String>,
    last_active: Option<i64>,
    messages: usize,
}

impl SessionAccumulator {
    fn absorb(&mut self, entry: HistoryEntry) {
        self.messages += 1;
        if self.project.is_none() {
            self.project = entry.project.filter(|project| !project.is_empty());
        }
        if self.first_prompt.is_none() {
            self.first_prompt = entry.display.as_deref().and_then(prompt_preview);
        }
        if let Some(ts) = entry.timestamp.as_ref().and_then(parse_timestamp) {
            self.last_active = Some(self.last_active.map_or(ts, |current| current.max(ts)));
        }
    }

    fn into_session(self, session_id: String, offset: UtcOffset) -> Session {
        let project = self.project.unwrap_or_default();
        Session {
            folder: folder_name(&project),
            date: util::format_millis(self.last_active, offset),
            session_id,
            project,
            last_active: self.last_active,
            messages: self.messages,
            first_prompt: self.first_prompt,
            topic: String::new(),
            resumable: false,
        }
    }
}

/// Load sessions from the history log, degrading to an empty list on failure.
///
/// A missing file, an I/O error, or exceeding `timeout` all yield no
/// sessions; malformed lines are skipped individually. Opening and reading
/// happen on a worker thread so a stalled file cannot block past `timeout`.
pub fn load_sessions(path: &Path, timeout: Duration) -> Vec<Session> {
    let (tx, rx) = mpsc::channel();
    let owned: PathBuf = path.to_path_buf();
    let spawned = thread::Builder::new()
        .name("history-loader".to_string())
        .spawn(move || {
            let deadline = Instant::now() + timeout;
            let _ = tx.send(read_history(&owned, deadline));
        });
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "failed to start history loader");
        return Vec::new();
    }

    match rx.recv_timeout(timeout) {
        Ok(Ok(sessions)) => {
            tracing::debug!(count = sessions.len(), "loaded history sessions");
            sessions
        }
        Ok(Err(HistoryError::Io(err))) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "history log unavailable");
            Vec::new()
        }
        Ok(Err(err)) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to load history log");
            Vec::new()
        }
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(
                path = %path.display(),
                ?timeout,
                "history log took too long; continuing without it"
            );
            Vec::new()
        }
        Err(RecvTimeoutError::Disconnected) => {
            tracing::warn!(path = %path.display(), "history loader exited without a result");
            Vec::new()
        }
    }
}

fn read_history(path: &Path, deadline: Instant) -> Result<Vec<Session>, HistoryError> {
    let file = File::open(path)?;
    sessions_from_reader(BufReader::new(file), deadline)
}

/// Group history entries by session id, newest activity first.
///
/// # Errors
///
/// Returns an error if reading fails or `deadline` passes before the log is
/// fully consumed.
pub fn sessions_from_reader<R: BufRead>(
    reader: R,
    deadline: Instant,
) -> Result<Vec<Session>, HistoryError> {
    let mut groups: IndexMap<String, SessionAccumulator> = IndexMap::new();

    for (idx, line) in reader.split(b'\n').enumerate() {
        if Instant::now() >= deadline {
            return Err(HistoryError::TimedOut);
        }
        let line = line?;
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }
        let entry: HistoryEntry = match serde_json::from_slice(trimmed) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(line = idx + 1, error = %err, "skipping malformed history line");
                continue;
            }
        };
        let Some(session_id) = entry
            .session_id
            .clone()
            .filter(|id| !id.trim().is_empty())
        else {
            continue;
        };
        groups.entry(session_id).or_default().absorb(entry);
    }

    let offset = util::local_offset();
    Ok(groups
        .into_iter()
        .map(|(id, acc)| acc.into_session(id, offset))
        .sorted_by(|a, b| b.last_active.cmp(&a.last_active))
        .collect())
}

fn prompt_preview(display: &str) -> Option<String> {
    let collapsed = display.split_whitespace().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(util::truncate(&collapsed, PROMPT_PREVIEW_CHARS))
    }
}

/// Accept epoch milliseconds (number or numeric string) or RFC 3339 text.
fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        #[allow(clippy::cast_possible_truncation)]
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok().or_else(|| {
            OffsetDateTime::parse(text.trim(), &Rfc3339)
                .ok()
                .and_then(|datetime| i64::try_from(datetime.unix_timestamp_nanos() / 1_000_000).ok())
        }),
        _ => None,
    }
}
