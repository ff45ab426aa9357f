//! Common utility functions used across Parley components

/// Rough completion length: whitespace-separated words
pub fn approximate_word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Truncate string to `max_chars` characters with ellipsis
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

/// Join a base URL and an endpoint path with exactly one slash
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
