use crate::session::Session;

/// Case-insensitive substring match over topic, folder, and session id.
///
/// Order is preserved. Callers handle the empty query themselves.
#[must_use]
pub fn search_sessions<'a>(sessions: &'a [Session], query: &str) -> Vec<&'a Session> {
    let needle = query.to_lowercase();
    sessions
        .iter()
        .filter(|session| {
            [&session.topic, &session.folder, &session.session_id]
                .into_iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}
