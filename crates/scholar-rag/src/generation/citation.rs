//! Snippet shaping for source citations

use regex::RegexBuilder;

/// Words too common to be worth highlighting
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "what", "which", "who", "how", "why", "when",
    "does", "did", "this", "that", "with", "from", "about", "into", "they", "their", "there",
    "have", "has", "been", "paper", "document",
];

/// Highlight query terms in citation snippets
pub fn highlight_snippet(snippet: &str, query_terms: &[&str]) -> String {
    // Skip very short terms; longest first so one pass never nests marks
    let mut terms: Vec<&str> = query_terms
        .iter()
        .copied()
        .filter(|t| t.chars().count() >= 3)
        .collect();
    if terms.is_empty() {
        return snippet.to_string();
    }
    terms.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));

    let pattern = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");

    match RegexBuilder::new(&format!(r"\b(?:{})\b", pattern))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re
            .replace_all(snippet, |caps: &regex::Captures| {
                format!("<mark>{}</mark>", &caps[0])
            })
            .into_owned(),
        Err(_) => snippet.to_string(),
    }
}

/// Distinct, lowercased content words of a question
pub fn query_terms(question: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in question.split(|c: char| !c.is_alphanumeric() && c != '-') {
        let word = word.trim_matches('-').to_lowercase();
        if word.chars().count() < 3 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        if !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

/// Cut a snippet to `max_chars` characters, appending "..." when anything was cut
pub fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    match snippet.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &snippet[..end]),
        None => snippet.to_string(),
    }
}
