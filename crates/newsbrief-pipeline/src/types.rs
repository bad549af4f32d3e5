use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Opaque reference to a candidate article (a URL).
pub type ArticleLocator = String;

/// Bodies at or below this many characters never reach analysis.
pub const MIN_BODY_CHARS: usize = 100;

/// Most topics kept per article and in the comparative report.
pub const MAX_TOPICS: usize = 5;

/// Title and body text extracted from one locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub body: String,
}

/// An article accepted for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    pub body: String,
    pub locator: ArticleLocator,
}

impl RawArticle {
    /// Accept extracted content only when its body exceeds `min_body_chars`.
    #[must_use]
    pub fn accept(
        locator: ArticleLocator,
        content: ExtractedContent,
        min_body_chars: usize,
    ) -> Option<Self> {
        if content.body.chars().count() <= min_body_chars {
            return None;
        }
        Some(Self {
            title: content.title,
            body: content.body,
            locator,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Map a provider class name (`POSITIVE`, `negative`, ...) onto a label.
    #[must_use]
    pub fn from_class(class: &str) -> Option<Self> {
        match class.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" => Some(Self::Positive),
            "negative" | "neg" => Some(Self::Negative),
            "neutral" | "neu" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "Positive"),
            SentimentLabel::Negative => write!(f, "Negative"),
            SentimentLabel::Neutral => write!(f, "Neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Provider confidence in `[0, 1]`.
    pub score: f64,
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
        }
    }
}

/// Raw output of a [`crate::providers::SentimentProvider`] before label mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSentiment {
    pub class: String,
    pub score: f64,
}

/// Length bounds handed to a summarizer, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLength {
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAnalysis {
    pub title: String,
    #[serde(rename = "url")]
    pub locator: ArticleLocator,
    pub summary: String,
    pub sentiment: SentimentResult,
    /// Most salient first, at most [`MAX_TOPICS`].
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeReport {
    pub total_articles: usize,
    /// Labels that never occurred are absent, not zero.
    pub sentiment_distribution: BTreeMap<SentimentLabel, usize>,
    pub average_sentiment_score: f64,
    pub common_topics: Vec<TopicCount>,
}

impl ComparativeReport {
    #[must_use]
    pub fn count_for(&self, label: SentimentLabel) -> usize {
        self.sentiment_distribution.get(&label).copied().unwrap_or(0)
    }
}

/// Output of a successful localization: both halves or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedAudio {
    pub audio_reference: String,
    pub localized_text: String,
}

pub const FALLBACK_MESSAGE: &str = "No valid articles found";

/// Result of one pipeline run for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub company_name: String,
    pub articles: Vec<ArticleAnalysis>,
    pub comparative_report: Option<ComparativeReport>,
    pub narration_text: Option<String>,
    pub localized_text: Option<String>,
    pub audio_reference: Option<String>,
    /// Set when zero articles were analyzable.
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalysisRun {
    /// Terminal state for a run where nothing was analyzable.
    #[must_use]
    pub fn fallback(company_name: &str) -> Self {
        Self {
            company_name: company_name.to_string(),
            articles: Vec::new(),
            comparative_report: None,
            narration_text: None,
            localized_text: None,
            audio_reference: None,
            fallback: true,
            message: Some(FALLBACK_MESSAGE.to_string()),
        }
    }
}

/// Tunables for one [`crate::PipelineOrchestrator`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_articles: usize,
    pub min_body_chars: usize,
    pub max_concurrent_articles: usize,
    pub provider_timeout: Duration,
    pub request_timeout: Duration,
    pub target_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_articles: newsbrief_core::MAX_ARTICLE_CEILING,
            min_body_chars: MIN_BODY_CHARS,
            max_concurrent_articles: 4,
            provider_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(120),
            target_language: "hi".to_string(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &newsbrief_core::AppConfig) -> Self {
        let max_articles = config
            .max_articles
            .clamp(1, newsbrief_core::MAX_ARTICLE_CEILING);
        Self {
            max_articles,
            min_body_chars: MIN_BODY_CHARS,
            max_concurrent_articles: config.max_concurrent_articles.clamp(1, max_articles),
            provider_timeout: Duration::from_secs(config.provider_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            target_language: config.target_language.clone(),
        }
    }
}
