//! Search source deduplication and citation formatting.
//!
//! Dedup is keyed by URL with the first-seen occurrence retained, which makes
//! it stable and idempotent. Formatting renders the citation block the model
//! sees: title, URL, and snippet are always preserved; raw content is truncated
//! to a per-source token budget (rough estimate: 4 chars per token).

use planweave_core::search::{SearchBundle, SearchDocument};

/// Approximate characters per token for budget purposes.
const CHARS_PER_TOKEN: usize = 4;

/// Flatten bundles in arrival order, keeping the first document seen per URL.
pub fn dedup_documents(bundles: &[SearchBundle]) -> Vec<&SearchDocument> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for bundle in bundles {
        for doc in &bundle.documents {
            if seen.insert(doc.url.as_str()) {
                unique.push(doc);
            }
        }
    }
    unique
}

/// Render deduplicated documents as a citation block for model consumption.
pub fn format_sources(
    documents: &[&SearchDocument],
    max_tokens_per_source: usize,
    include_raw_content: bool,
) -> String {
    let char_budget = max_tokens_per_source * CHARS_PER_TOKEN;

    let mut out = String::from("Sources:\n");
    for doc in documents {
        out.push('\n');
        out.push_str(&format!("Source: {}\n", doc.title));
        out.push_str("===\n");
        out.push_str(&format!("URL: {}\n", doc.url));
        out.push_str("===\n");
        out.push_str(&format!("Most relevant content from source: {}\n", doc.snippet));
        if include_raw_content {
            if let Some(raw) = &doc.raw_content {
                out.push_str("===\n");
                out.push_str(&format!(
                    "Full source content limited to {max_tokens_per_source} tokens: {}\n",
                    truncate_chars(raw, char_budget)
                ));
            }
        }
        out.push_str("===\n");
    }
    out
}

/// Truncate on a char boundary and mark the cut.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{truncated}... [truncated]")
}
