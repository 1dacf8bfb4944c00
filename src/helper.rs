use log::trace;

/// Lowercases a string for case-insensitive matching and ordering.
pub fn fold(s: &str) -> String {
    s.to_lowercase()
}

/// Normalizes a tag list: trims whitespace, drops empty entries, and removes
/// duplicates while preserving first-occurrence order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            trace!("Dropping empty tag entry");
            continue;
        }
        if seen.iter().any(|existing: &String| existing == trimmed) {
            trace!("Dropping duplicate tag entry: {}", trimmed);
            continue;
        }
        seen.push(trimmed.to_string());
    }
    seen
}

// Helper method for parsing comma-separated tag input
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    normalize_tags(
        tags.map(|t| t.split(',').map(|s| s.to_string()).collect())
            .unwrap_or_default(),
    )
}
