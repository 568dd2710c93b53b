use std::path::{Path, PathBuf};

use color_eyre::Result;

use super::{escape_html, write_page};
use crate::session::Session;

pub const OVERVIEW_FILE: &str = "claude-sessions.html";

const STYLE: &str = r"
  body { font-family: system-ui, sans-serif; margin: 2rem; }
  table { border-collapse: collapse; width: 100%; }
  th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
  th { background: #4A90D9; color: white; position: sticky; top: 0; }
  tr:nth-child(even) { background: #f9f9f9; }
  tr:hover { background: #e9e9e9; }
  tr.expired { color: #888; }
";

#[must_use]
pub fn render_overview_html(sessions: &[Session]) -> String {
    let mut rows = String::new();
    for session in sessions {
        let class = if session.resumable {
            ""
        } else {
            r#" class="expired""#
        };
        rows.push_str(&format!(
            "<tr{class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(session.short_id()),
            escape_html(&session.topic),
            escape_html(&session.folder),
            escape_html(&session.date),
            session.messages,
        ));
    }

    format!(
        "<!DOCTYPE html>
<html><head><meta charset=\"utf-8\"><title>Claude Sessions</title>
<style>{STYLE}</style></head>
<body>
<h2>Claude Code Sessions ({count})</h2>
<table>
<tr><th>Session</th><th>Topic</th><th>Folder</th><th>Date</th><th>Messages</th></tr>
{rows}</table></body></html>
",
        count = sessions.len(),
    )
}

/// Render the overview table to the shared overview file in `temp_dir`.
///
/// # Errors
///
/// Returns an error if the page cannot be written.
pub fn write_overview(sessions: &[Session], temp_dir: &Path) -> Result<PathBuf> {
    write_page(temp_dir, OVERVIEW_FILE, &render_overview_html(sessions))
}
