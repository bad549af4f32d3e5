//! Local NLP providers used when no inference endpoint is configured.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;

use super::{SentimentProvider, Summarizer};
use crate::error::ProviderError;
use crate::types::{ProviderSentiment, SummaryLength};

/// Strong and mild market-news cues, weighted 0.5 and 0.25.
const STRONG_POSITIVE: &[&str] = &[
    "soar", "soared", "soars", "surge", "surged", "surges", "profitable", "record",
    "breakthrough", "outperform", "outperformed", "success", "successful", "approval",
    "approved",
];
const MILD_POSITIVE: &[&str] = &[
    "growth", "growing", "grew", "profit", "profits", "beat", "beats", "rally", "rallied",
    "gain", "gains", "strong", "upgrade", "upgraded", "innovative", "launch", "launched",
    "expands", "expansion", "partnership", "deal", "wins", "optimistic", "rebound",
];
const STRONG_NEGATIVE: &[&str] = &[
    "plunge", "plunged", "plunges", "fraud", "scandal", "bankruptcy", "bankrupt", "recall",
    "crash", "crashed", "collapse", "collapsed", "indicted",
];
const MILD_NEGATIVE: &[&str] = &[
    "loss", "losses", "decline", "declined", "drop", "dropped", "slump", "miss", "missed",
    "downgrade", "downgraded", "layoffs", "lawsuit", "sued", "investigation", "probe",
    "fined", "weak", "weaker", "warning", "concerns", "delay", "delayed", "cuts", "risk",
];

/// Words that flip the polarity of the next scored word.
const NEGATORS: &[&str] = &["not", "no", "never", "without", "despite"];

static WEIGHTS: LazyLock<HashMap<&'static str, f32>> = LazyLock::new(|| {
    [
        (STRONG_POSITIVE, 0.5),
        (MILD_POSITIVE, 0.25),
        (STRONG_NEGATIVE, -0.5),
        (MILD_NEGATIVE, -0.25),
    ]
    .into_iter()
    .flat_map(|(words, weight)| words.iter().map(move |w| (*w, weight)))
    .collect()
});

/// Sum of lexicon weights over the words of `text`, clamped to `[-1, 1]`.
///
/// A negator flips the sign of the next lexicon hit ("no growth" is negative).
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
    let mut total = 0.0_f32;
    let mut negate = false;
    for token in text.split(|c: char| !c.is_alphanumeric() && c != '\'') {
        if token.is_empty() {
            continue;
        }
        let word = token.to_lowercase();
        if NEGATORS.contains(&word.as_str()) || word.ends_with("n't") {
            negate = true;
        } else if let Some(weight) = WEIGHTS.get(word.as_str()) {
            total += if negate { -weight } else { *weight };
            negate = false;
        }
    }
    total.clamp(-1.0, 1.0)
}

/// Sign of [`lexicon_score`] picks the class; magnitude raises confidence
/// from 0.5 towards 1.0.
pub struct LexiconSentiment;

#[async_trait]
impl SentimentProvider for LexiconSentiment {
    async fn classify(&self, text: &str) -> Result<ProviderSentiment, ProviderError> {
        let score = f64::from(lexicon_score(text));
        let class = match score.partial_cmp(&0.0) {
            Some(std::cmp::Ordering::Greater) => "POSITIVE",
            Some(std::cmp::Ordering::Less) => "NEGATIVE",
            _ => "NEUTRAL",
        };
        Ok(ProviderSentiment {
            class: class.to_string(),
            score: 0.5 + score.abs() / 2.0,
        })
    }
}

/// Extractive summary: the leading `length.max` words.
pub struct LeadSummarizer;

#[async_trait]
impl Summarizer for LeadSummarizer {
    async fn summarize(&self, text: &str, length: SummaryLength) -> Result<String, ProviderError> {
        let lead = text
            .split_whitespace()
            .take(length.max)
            .collect::<Vec<_>>()
            .join(" ");
        if lead.is_empty() {
            Err(ProviderError::EmptyResponse("lead_summarizer"))
        } else {
            Ok(lead)
        }
    }
}
