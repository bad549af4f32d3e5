//! Hugging Face Inference API clients for summarization and sentiment.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ensure_success, normalize_base_url, SentimentProvider, Summarizer};
use crate::error::ProviderError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{ProviderSentiment, SummaryLength};

/// Summarization models accept roughly this many characters of input.
const SUMMARY_INPUT_CHARS: usize = 1024;

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    parameters: SummarizeParameters,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct SummarizeParameters {
    max_length: usize,
    min_length: usize,
    do_sample: bool,
}

#[derive(Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct ClassScore {
    label: String,
    score: f64,
}

/// Text-classification responses come nested per input or flat.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Nested(Vec<Vec<ClassScore>>),
    Flat(Vec<ClassScore>),
}

/// Shared request plumbing for one hosted model.
struct ModelEndpoint {
    client: Client,
    url: String,
    token: String,
    retry: RetryPolicy,
}

impl ModelEndpoint {
    fn new(client: Client, base_url: &str, model: &str, token: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            url: format!("{}/models/{model}", normalize_base_url(base_url)),
            token: token.to_owned(),
            retry,
        }
    }

    async fn post<B, T>(&self, provider: &'static str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        retry_with_backoff(self.retry, provider, || async move {
            let response = self
                .client
                .post(&self.url)
                .bearer_auth(&self.token)
                .json(body)
                .send()
                .await?;
            let text = ensure_success(response)?.text().await?;
            serde_json::from_str(&text).map_err(|source| ProviderError::Deserialize {
                context: format!("{provider} response from {}", self.url),
                source,
            })
        })
        .await
    }
}

pub struct HfSummarizer {
    endpoint: ModelEndpoint,
}

impl HfSummarizer {
    #[must_use]
    pub fn with_base_url(
        client: Client,
        base_url: &str,
        model: &str,
        token: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            endpoint: ModelEndpoint::new(client, base_url, model, token, retry),
        }
    }
}

#[async_trait]
impl Summarizer for HfSummarizer {
    async fn summarize(&self, text: &str, length: SummaryLength) -> Result<String, ProviderError> {
        let inputs: String = text.chars().take(SUMMARY_INPUT_CHARS).collect();
        let request = SummarizeRequest {
            inputs: &inputs,
            parameters: SummarizeParameters {
                max_length: length.max,
                min_length: length.min,
                do_sample: false,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };
        let items: Vec<SummaryItem> = self.endpoint.post("hf_summarizer", &request).await?;
        items
            .into_iter()
            .next()
            .map(|item| item.summary_text.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ProviderError::EmptyResponse("hf_summarizer"))
    }
}

pub struct HfSentiment {
    endpoint: ModelEndpoint,
}

impl HfSentiment {
    #[must_use]
    pub fn with_base_url(
        client: Client,
        base_url: &str,
        model: &str,
        token: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            endpoint: ModelEndpoint::new(client, base_url, model, token, retry),
        }
    }
}

#[async_trait]
impl SentimentProvider for HfSentiment {
    async fn classify(&self, text: &str) -> Result<ProviderSentiment, ProviderError> {
        let request = ClassifyRequest {
            inputs: text,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };
        let response: ClassifyResponse = self.endpoint.post("hf_sentiment", &request).await?;
        let scores = match response {
            ClassifyResponse::Nested(mut per_input) => {
                if per_input.is_empty() {
                    Vec::new()
                } else {
                    per_input.swap_remove(0)
                }
            }
            ClassifyResponse::Flat(scores) => scores,
        };
        scores
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|best| ProviderSentiment {
                class: best.label,
                score: best.score,
            })
            .ok_or(ProviderError::EmptyResponse("hf_sentiment"))
    }
}
