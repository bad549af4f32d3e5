//! Per-article analysis with independent fallbacks for each sub-analysis.
//!
//! Summary, sentiment, and topics are computed separately. A failure or
//! timeout in one yields that step's default and never touches the others.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ProviderError;
use crate::pipeline::call_with_timeout;
use crate::providers::{SentimentProvider, Summarizer, TopicExtractor};
use crate::topics::MIN_TOPIC_TEXT_CHARS;
use crate::types::{
    ArticleAnalysis, RawArticle, SentimentLabel, SentimentResult, SummaryLength, MAX_TOPICS,
};

/// Bodies shorter than this are returned as their own summary.
const MIN_SUMMARY_INPUT_CHARS: usize = 50;
/// Hard cap for the pass-through summary of a short body.
const SHORT_SUMMARY_CAP: usize = 150;
const MIN_SUMMARY_WORDS: usize = 30;
const MAX_SUMMARY_WORDS: usize = 150;

const MIN_SENTIMENT_INPUT_CHARS: usize = 20;
/// Sentiment models only see this prefix of the body.
const SENTIMENT_INPUT_CHARS: usize = 512;

pub struct ArticleAnalyzer {
    summarizer: Arc<dyn Summarizer>,
    sentiment: Arc<dyn SentimentProvider>,
    topics: Arc<dyn TopicExtractor>,
    provider_timeout: Duration,
}

impl ArticleAnalyzer {
    #[must_use]
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        sentiment: Arc<dyn SentimentProvider>,
        topics: Arc<dyn TopicExtractor>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            summarizer,
            sentiment,
            topics,
            provider_timeout,
        }
    }

    /// Analyze one accepted article. Never fails.
    pub async fn analyze(&self, raw: &RawArticle) -> ArticleAnalysis {
        let (summary, sentiment) = tokio::join!(
            self.summarize(&raw.body, &raw.locator),
            self.classify(&raw.body, &raw.locator),
        );
        let topics = self.topics(&raw.body, &raw.locator);

        ArticleAnalysis {
            title: raw.title.clone(),
            locator: raw.locator.clone(),
            summary,
            sentiment,
            topics,
        }
    }

    async fn summarize(&self, body: &str, locator: &str) -> String {
        if body.chars().count() < MIN_SUMMARY_INPUT_CHARS {
            return truncate_with_ellipsis(body, SHORT_SUMMARY_CAP);
        }

        let length = summary_length(body.split_whitespace().count());
        let result = call_with_timeout(
            "summarize",
            self.provider_timeout,
            self.summarizer.summarize(body, length),
        )
        .await;

        match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(url = locator, stage = "summarize", error = %e, "summarization failed, truncating body");
                let mut fallback: String = body.chars().take(length.max).collect();
                fallback.push_str("...");
                fallback
            }
        }
    }

    async fn classify(&self, body: &str, locator: &str) -> SentimentResult {
        if body.chars().count() < MIN_SENTIMENT_INPUT_CHARS {
            return SentimentResult::default();
        }

        let input: String = body.chars().take(SENTIMENT_INPUT_CHARS).collect();
        let result = call_with_timeout(
            "sentiment",
            self.provider_timeout,
            self.sentiment.classify(&input),
        )
        .await
        .and_then(|raw| {
            let label = SentimentLabel::from_class(&raw.class)
                .ok_or_else(|| ProviderError::UnsupportedLabel(raw.class.clone()))?;
            Ok(SentimentResult {
                label,
                score: clamp_unit(raw.score),
            })
        });

        result.unwrap_or_else(|e| {
            tracing::warn!(url = locator, stage = "sentiment", error = %e, "sentiment analysis failed, using neutral");
            SentimentResult::default()
        })
    }

    fn topics(&self, body: &str, locator: &str) -> Vec<String> {
        if body.chars().count() < MIN_TOPIC_TEXT_CHARS {
            return Vec::new();
        }
        match self.topics.extract(body, MAX_TOPICS) {
            Ok(mut topics) => {
                topics.truncate(MAX_TOPICS);
                topics
            }
            Err(e) => {
                tracing::warn!(url = locator, stage = "topics", error = %e, "topic extraction failed");
                Vec::new()
            }
        }
    }
}

/// Summary bounds for a body of `word_count` words: the target is 70% of the
/// words clamped to `30..=150`, the minimum half the target.
#[must_use]
pub fn summary_length(word_count: usize) -> SummaryLength {
    let max = (word_count * 7 / 10).clamp(MIN_SUMMARY_WORDS, MAX_SUMMARY_WORDS);
    SummaryLength { min: max / 2, max }
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Finite scores are clamped into `[0, 1]`; non-finite ones pass through
/// for the aggregator to exclude.
fn clamp_unit(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        score
    }
}
