//! Maps a launcher query to result items and each item to an action.

use color_eyre::Result;
use serde::Serialize;

use crate::catalog;
use crate::config::model::Config;
use crate::launch::file_url;
use crate::render;
use crate::search::search_sessions;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub name: String,
    pub description: String,
    pub action: Action,
}

/// What selecting a result does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    OpenUrl { url: String },
    Resume { session_id: String, project: String },
    Nothing,
}

/// Answer a query against a freshly loaded catalog.
///
/// # Errors
///
/// Returns an error if the overview page cannot be written.
pub fn dispatch(config: &Config, query: Option<&str>) -> Result<Vec<ResultItem>> {
    let sessions = catalog::load_catalog(config);
    dispatch_sessions(config, &sessions, query)
}

/// Answer a query against already loaded sessions.
///
/// A blank query renders the overview page. Otherwise only resumable
/// sessions are searched and each match yields a resume item followed by a
/// transcript item, up to `search.limit` matches.
///
/// # Errors
///
/// Returns an error if the overview page cannot be written.
pub fn dispatch_sessions(
    config: &Config,
    sessions: &[Session],
    query: Option<&str>,
) -> Result<Vec<ResultItem>> {
    let query = query.map(str::trim).filter(|query| !query.is_empty());
    let Some(query) = query else {
        return overview_items(config, sessions);
    };

    let resumable: Vec<Session> = sessions
        .iter()
        .filter(|session| session.resumable)
        .cloned()
        .collect();
    let matches = search_sessions(&resumable, query);
    tracing::debug!(query, matches = matches.len(), "search complete");

    if matches.is_empty() {
        return Ok(vec![ResultItem {
            name: "No matching sessions".to_string(),
            description: format!("No sessions matching \"{query}\""),
            action: Action::Nothing,
        }]);
    }

    let mut items = Vec::new();
    for session in matches.into_iter().take(config.search.limit) {
        items.push(resume_item(session));
        match render::write_transcript(session, &config.paths.projects_dir, &config.paths.temp_dir) {
            Ok(path) => items.push(ResultItem {
                name: "└ View transcript".to_string(),
                description: format!("{} · Open conversation in browser", session.short_id()),
                action: Action::OpenUrl {
                    url: file_url(&path),
                },
            }),
            Err(err) => {
                tracing::warn!(session = %session.session_id, error = %err, "failed to render transcript");
            }
        }
    }
    Ok(items)
}

fn overview_items(config: &Config, sessions: &[Session]) -> Result<Vec<ResultItem>> {
    let path = render::write_overview(sessions, &config.paths.temp_dir)?;
    Ok(vec![ResultItem {
        name: format!(
            "View all sessions ({}, {} resumable)",
            sessions.len(),
            catalog::resumable_count(sessions)
        ),
        description: "Open HTML table in browser".to_string(),
        action: Action::OpenUrl {
            url: file_url(&path),
        },
    }])
}

fn resume_item(session: &Session) -> ResultItem {
    ResultItem {
        name: session.topic.clone(),
        description: format!(
            "{} · {} · {} · {} msgs · Enter to resume",
            session.short_id(),
            session.folder,
            session.date,
            session.messages
        ),
        action: Action::Resume {
            session_id: session.session_id.clone(),
            project: session.project.clone(),
        },
    }
}
