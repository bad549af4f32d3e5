//! Collaborator interfaces and their concrete implementations.
//!
//! Every external concern the pipeline depends on sits behind one of the traits
//! below and reports failure as a [`ProviderError`]. Handles are built once per
//! process by [`Providers::from_app_config`] and shared read-only by every run.

mod discovery;
mod google_news;
mod html;
mod huggingface;
mod newsapi;
mod offline;
mod translate;
mod tts;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ProviderError;
use crate::retry::RetryPolicy;
use crate::topics::FrequencyTopics;
use crate::types::{ArticleLocator, ExtractedContent, ProviderSentiment, SummaryLength};

pub use discovery::FallbackDiscovery;
pub use google_news::{parse_rss_links, GoogleNewsRssDiscovery};
pub use html::{extract_content, HtmlExtractor};
pub use huggingface::{HfSentiment, HfSummarizer};
pub use newsapi::NewsApiDiscovery;
pub use offline::{lexicon_score, LeadSummarizer, LexiconSentiment};
pub use translate::GoogleTranslator;
pub use tts::{chunk_for_speech, GoogleTts};

/// Finds candidate article locators for a company.
#[async_trait]
pub trait ArticleDiscovery: Send + Sync {
    async fn discover(&self, company_name: &str) -> Result<Vec<ArticleLocator>, ProviderError>;
}

/// Fetches a locator and extracts its title and body text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<ExtractedContent, ProviderError>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, length: SummaryLength) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ProviderSentiment, ProviderError>;
}

/// Picks the most salient terms of a single document.
///
/// Synchronous: implementations are local and CPU-bound.
pub trait TopicExtractor: Send + Sync {
    fn extract(&self, text: &str, limit: usize) -> Result<Vec<String>, ProviderError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError>;
}

/// Turns text into speech and returns a reference (path or URL) to the audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<String, ProviderError>;
}

/// Which NLP and discovery backends [`Providers::from_app_config`] wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// NewsAPI (when keyed) with Google News fallback, Hugging Face NLP.
    Online,
    /// Google News discovery with local lexicon sentiment and lead summaries.
    Offline,
}

/// Shared handles to every collaborator one orchestrator needs.
#[derive(Clone)]
pub struct Providers {
    pub discovery: Arc<dyn ArticleDiscovery>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
    pub sentiment: Arc<dyn SentimentProvider>,
    pub topics: Arc<dyn TopicExtractor>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Providers {
    /// Build the production provider set from process configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if an HTTP client cannot be constructed.
    pub fn from_app_config(
        config: &newsbrief_core::AppConfig,
        mode: ProviderMode,
    ) -> Result<Self, ProviderError> {
        let retry = RetryPolicy {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        };
        // The orchestrator bounds each provider call by the stage budget, so a
        // single HTTP attempt must be shorter or a timed-out attempt is never
        // retried.
        let stage_budget = Duration::from_secs(config.provider_timeout_secs);
        let client = build_http_client(retry.attempt_timeout(stage_budget), &config.user_agent)?;

        let google: Arc<dyn ArticleDiscovery> =
            Arc::new(GoogleNewsRssDiscovery::new(client.clone(), retry));
        let discovery: Arc<dyn ArticleDiscovery> = match (mode, config.newsapi_key.as_deref()) {
            (ProviderMode::Online, Some(key)) => Arc::new(FallbackDiscovery::new(
                Arc::new(NewsApiDiscovery::new(client.clone(), key, retry)),
                google,
            )),
            _ => google,
        };

        let (summarizer, sentiment): (Arc<dyn Summarizer>, Arc<dyn SentimentProvider>) =
            match (mode, config.hf_api_token.as_deref()) {
                (ProviderMode::Online, Some(token)) => (
                    Arc::new(HfSummarizer::with_base_url(
                        client.clone(),
                        &config.hf_base_url,
                        &config.summary_model,
                        token,
                        retry,
                    )),
                    Arc::new(HfSentiment::with_base_url(
                        client.clone(),
                        &config.hf_base_url,
                        &config.sentiment_model,
                        token,
                        retry,
                    )),
                ),
                (ProviderMode::Online, None) => {
                    tracing::warn!(
                        "HF_API_TOKEN not set; using offline summarizer and lexicon sentiment"
                    );
                    (Arc::new(LeadSummarizer), Arc::new(LexiconSentiment))
                }
                (ProviderMode::Offline, _) => (Arc::new(LeadSummarizer), Arc::new(LexiconSentiment)),
            };

        Ok(Self {
            discovery,
            extractor: Arc::new(HtmlExtractor::new(client.clone(), retry)),
            summarizer,
            sentiment,
            topics: Arc::new(FrequencyTopics),
            translator: Arc::new(GoogleTranslator::new(client.clone(), retry)),
            synthesizer: Arc::new(GoogleTts::new(client, &config.audio_dir, retry)),
        })
    }
}

/// Build the process-wide HTTP client; `timeout` bounds one request attempt.
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if the client cannot be constructed.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> Result<Client, ProviderError> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Convert a non-2xx response into [`ProviderError::UnexpectedStatus`].
pub(crate) fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProviderError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// Trim a trailing slash so `format!("{base}/path")` never doubles it.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
