//! Single-document topic extraction by term frequency.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ProviderError;
use crate::providers::TopicExtractor;

/// Texts shorter than this have no topics.
pub const MIN_TOPIC_TEXT_CHARS: usize = 100;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{3,}\b").expect("valid token regex"));

/// English stop-words dropped before counting.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "couldn", "couldn't", "d", "did", "didn", "didn't",
    "do", "does", "doesn", "doesn't", "doing", "don", "don't", "down", "during", "each", "few",
    "for", "from", "further", "had", "hadn", "hadn't", "has", "hasn", "hasn't", "have", "haven",
    "haven't", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "i", "if", "in", "into", "is", "isn", "isn't", "it", "it's", "its", "itself", "just", "ll",
    "m", "ma", "me", "mightn", "mightn't", "more", "most", "mustn", "mustn't", "my", "myself",
    "needn", "needn't", "no", "nor", "not", "now", "o", "of", "off", "on", "once", "only", "or",
    "other", "our", "ours", "ourselves", "out", "over", "own", "re", "s", "same", "shan",
    "shan't", "she", "she's", "should", "should've", "shouldn", "shouldn't", "so", "some",
    "such", "t", "than", "that", "that'll", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "ve", "very", "was", "wasn", "wasn't", "we", "were", "weren", "weren't", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "won", "won't",
    "wouldn", "wouldn't", "y", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves",
];

/// The local [`TopicExtractor`]: words and two-word phrases ranked by count.
pub struct FrequencyTopics;

impl TopicExtractor for FrequencyTopics {
    fn extract(&self, text: &str, limit: usize) -> Result<Vec<String>, ProviderError> {
        Ok(extract_topics(text, limit))
    }
}

/// Rank the terms of one document by frequency.
///
/// Terms are lowercase runs of three or more ASCII letters with stop-words
/// removed, plus every pair of adjacent remaining terms. Ranking is by count
/// descending; equal counts keep the order in which each term was first
/// completed while scanning left to right (a word, then the phrase it ends).
#[must_use]
pub fn extract_topics(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() < MIN_TOPIC_TEXT_CHARS || limit == 0 {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut bump = |term: String| {
        let count = counts.entry(term.clone()).or_insert(0);
        if *count == 0 {
            order.push(term);
        }
        *count += 1;
    };

    for (i, token) in tokens.iter().enumerate() {
        bump((*token).to_string());
        if i > 0 {
            bump(format!("{} {token}", tokens[i - 1]));
        }
    }

    let mut ranked: Vec<(usize, String)> = order
        .into_iter()
        .map(|term| (counts.get(&term).copied().unwrap_or(0), term))
        .collect();
    // Stable sort keeps first-seen order among equal counts.
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().take(limit).map(|(_, term)| term).collect()
}
