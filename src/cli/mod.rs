pub mod apply;
pub mod ask;
pub mod duplicates;
pub mod import;
pub mod log;
pub mod reindex;
pub mod search;
pub mod staging;
pub mod stats;

/// Clamp `text` to `max_chars`, appending an ellipsis when it was cut.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}
