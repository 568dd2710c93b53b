use std::path::Path;

use crate::config::model::Config;
use crate::history;
use crate::session::Session;
use crate::summaries;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("session '{0}' not found")]
    NotFound(String),
    #[error("session prefix '{selector}' is ambiguous ({count} matches)")]
    Ambiguous { selector: String, count: usize },
}

/// Set `resumable` from the presence of each session's transcript file.
///
/// Always hits the filesystem; callers re-run it for every request.
pub fn mark_resumable(sessions: &mut [Session], projects_dir: &Path) {
    for session in sessions.iter_mut() {
        session.resumable = session.transcript_path(projects_dir).is_file();
    }
}

/// Run the full load pipeline: history, summaries, fallback topics, resumability.
#[must_use]
pub fn load_catalog(config: &Config) -> Vec<Session> {
    let paths = &config.paths;
    let mut sessions = history::load_sessions(&paths.history_path, config.history_timeout);

    let summaries = summaries::load_summaries(&paths.projects_dir);
    let applied = summaries::apply_summaries(&mut sessions, &summaries);
    summaries::apply_fallback_topics(&mut sessions);
    mark_resumable(&mut sessions, &paths.projects_dir);

    tracing::debug!(
        sessions = sessions.len(),
        summaries = applied,
        resumable = resumable_count(&sessions),
        "session catalog loaded"
    );
    sessions
}

#[must_use]
pub fn resumable_count(sessions: &[Session]) -> usize {
    sessions.iter().filter(|session| session.resumable).count()
}

/// Resolve a session by full id, falling back to a unique id prefix.
///
/// # Errors
///
/// Returns [`LookupError::NotFound`] when nothing matches and
/// [`LookupError::Ambiguous`] when a prefix matches several sessions.
pub fn find_session<'a>(sessions: &'a [Session], selector: &str) -> Result<&'a Session, LookupError> {
    if let Some(exact) = sessions.iter().find(|session| session.session_id == selector) {
        return Ok(exact);
    }

    let mut matches = sessions
        .iter()
        .filter(|session| !selector.is_empty() && session.session_id.starts_with(selector));
    match (matches.next(), matches.count()) {
        (Some(session), 0) => Ok(session),
        (Some(_), rest) => Err(LookupError::Ambiguous {
            selector: selector.to_string(),
            count: rest + 1,
        }),
        (None, _) => Err(LookupError::NotFound(selector.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn session(id: &str, project: &str) -> Session {
        Session {
            session_id: id.into(),
            project: project.into(),
            ..Session::default()
        }
    }

    #[test]
    fn resumable_flips_when_transcript_removed() {
        let temp = tempfile::tempdir().unwrap();
        let projects = temp.path();
        let mut sessions = vec![session("live", "/home/dev/app"), session("gone", "/home/dev/app")];
        let transcript = sessions[0].transcript_path(projects);
        fs::create_dir_all(transcript.parent().unwrap()).unwrap();
        fs::write(&transcript, "{}\n").unwrap();

        mark_resumable(&mut sessions, projects);
        assert!(sessions[0].resumable);
        assert!(!sessions[1].resumable);
        assert_eq!(resumable_count(&sessions), 1);

        fs::remove_file(&transcript).unwrap();
        mark_resumable(&mut sessions, projects);
        assert!(!sessions[0].resumable);
    }

    #[test]
    fn finds_by_exact_id_or_unique_prefix() {
        let sessions = vec![
            session("abc123", "/p"),
            session("abd456", "/p"),
            session("abc", "/p"),
        ];
        assert_eq!(find_session(&sessions, "abc").unwrap().session_id, "abc");
        assert_eq!(find_session(&sessions, "abd").unwrap().session_id, "abd456");
        assert!(matches!(
            find_session(&sessions, "ab"),
            Err(LookupError::Ambiguous { count: 3, .. })
        ));
        assert!(matches!(
            find_session(&sessions, "zzz"),
            Err(LookupError::NotFound(_))
        ));
        assert!(matches!(
            find_session(&sessions, ""),
            Err(LookupError::NotFound(_))
        ));
    }
}
