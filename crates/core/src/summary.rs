pub const SUMMARY_PREFIX: &str = "Message - ";

/// Issue title: the first line of the message, or `fallback` when that line is blank.
pub fn extract_summary(text: &str, fallback: &str) -> String {
    let first_line = text.split('\n').next().unwrap_or_default().trim();
    if first_line.is_empty() {
        format!("{SUMMARY_PREFIX}{fallback}")
    } else {
        format!("{SUMMARY_PREFIX}{first_line}")
    }
}
