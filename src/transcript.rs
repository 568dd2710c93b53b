use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;

/// Maximum characters of a tool result shown inline.
pub const RESULT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Claude",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub text: String,
}

/// Read the readable user/assistant messages from a transcript file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn read_transcript(path: &Path) -> Result<Vec<TranscriptMessage>> {
    let file =
        File::open(path).with_context(|| format!("failed to open transcript {}", path.display()))?;
    messages_from_reader(BufReader::new(file))
        .with_context(|| format!("failed to read transcript {}", path.display()))
}

/// Parse transcript lines, skipping malformed JSON and non-conversation records.
///
/// # Errors
///
/// Returns an error only when the underlying reader fails.
pub fn messages_from_reader<R: BufRead>(reader: R) -> io::Result<Vec<TranscriptMessage>> {
    let mut messages = Vec::new();
    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_slice::<Value>(trimmed) {
            Ok(record) => messages.extend(message_from_record(&record)),
            Err(err) => {
                tracing::debug!(line = idx + 1, error = %err, "skipping malformed transcript line");
            }
        }
    }
    Ok(messages)
}

/// Convert one transcript record; `None` for other record types or empty text.
#[must_use]
pub fn message_from_record(record: &Value) -> Option<TranscriptMessage> {
    let role = record.get("type").and_then(Value::as_str).and_then(Role::from_type)?;
    let content = match record.get("message") {
        Some(Value::Object(message)) => message.get("content").unwrap_or(&Value::Null),
        Some(other) => other,
        None => &Value::Null,
    };
    let text = extract_text(content).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(TranscriptMessage { role, text })
    }
}

/// Flatten message content into display text.
///
/// Strings pass through; block lists contribute their `text` blocks, a
/// `[Tool: name]` marker per tool call, and a bounded preview per tool result.
#[must_use]
pub fn extract_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(blocks) => blocks.iter().filter_map(block_text).join("\n"),
        _ => String::new(),
    }
}

fn block_text(block: &Value) -> Option<String> {
    match block.get("type").and_then(Value::as_str)? {
        "text" => Some(
            block
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        "tool_use" => {
            let name = block.get("name").and_then(Value::as_str).unwrap_or("tool");
            Some(format!("[Tool: {name}]"))
        }
        "tool_result" => {
            let inner = match block.get("content") {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Array(parts)) => parts
                    .iter()
                    .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .join("\n"),
                _ => String::new(),
            };
            if inner.is_empty() {
                None
            } else {
                let preview: String = inner.chars().take(RESULT_PREVIEW_CHARS).collect();
                Some(format!("[Result: {preview}]"))
            }
        }
        _ => None,
    }
}
