use time::{OffsetDateTime, UtcOffset};

const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Format an epoch-milliseconds timestamp for display, `-` when absent.
pub fn format_millis(millis: Option<i64>, offset: UtcOffset) -> String {
    millis
        .and_then(|value| {
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(value) * 1_000_000).ok()
        })
        .and_then(|datetime| datetime.to_offset(offset).format(DATE_FORMAT).ok())
        .unwrap_or_else(|| "-".to_string())
}

pub fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        input.to_string()
    } else {
        let mut out = input.chars().take(max.saturating_sub(1)).collect::<String>();
        out.push('…');
        out
    }
}
