use std::path::{Path, PathBuf};

use color_eyre::Result;

use super::{escape_html, write_page};
use crate::session::Session;
use crate::transcript::{TranscriptMessage, read_transcript};

const STYLE: &str = r"
  body { font-family: system-ui, sans-serif; max-width: 900px; margin: 2rem auto; }
  .msg { margin: 1rem 0; padding: 1rem; border-radius: 8px; }
  .msg pre { white-space: pre-wrap; word-wrap: break-word; margin: 0.5rem 0 0 0; font-size: 0.9rem; }
  .label { font-weight: bold; font-size: 0.85rem; text-transform: uppercase; }
  .user { background: #e8f0fe; }
  .assistant { background: #f0f0f0; }
  h2 { border-bottom: 1px solid #ddd; padding-bottom: 0.5rem; }
";

/// File name for a session's transcript page, keyed by its short id.
///
/// Characters that are unsafe in a file name are replaced with `_`.
#[must_use]
pub fn transcript_file_name(session: &Session) -> String {
    let key: String = session
        .short_id()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("claude-transcript-{key}.html")
}

#[must_use]
pub fn render_transcript_html(session: &Session, messages: &[TranscriptMessage]) -> String {
    let mut body = String::new();
    for message in messages {
        body.push_str(&format!(
            "<div class=\"msg {class}\"><span class=\"label\">{label}</span><pre>{text}</pre></div>\n",
            class = message.role.css_class(),
            label = message.role.label(),
            text = escape_html(&message.text),
        ));
    }

    let sid = escape_html(session.short_id());
    let topic = escape_html(&session.topic);
    format!(
        "<!DOCTYPE html>
<html><head><meta charset=\"utf-8\"><title>Session {sid}</title>
<style>{STYLE}</style></head>
<body>
<h2>{topic} <small style=\"color:#888\">({sid})</small></h2>
{body}</body></html>
"
    )
}

/// Render a session's transcript into `temp_dir` and return the page path.
///
/// # Errors
///
/// Returns an error if the transcript cannot be read or the page cannot be
/// written.
pub fn write_transcript(session: &Session, projects_dir: &Path, temp_dir: &Path) -> Result<PathBuf> {
    let messages = read_transcript(&session.transcript_path(projects_dir))?;
    let html = render_transcript_html(session, &messages);
    write_page(temp_dir, &transcript_file_name(session), &html)
}
