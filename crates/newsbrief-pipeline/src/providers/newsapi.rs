//! NewsAPI `everything` search.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{normalize_base_url, ArticleDiscovery};
use crate::error::ProviderError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::ArticleLocator;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    url: Option<String>,
}

pub struct NewsApiDiscovery {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl NewsApiDiscovery {
    #[must_use]
    pub fn new(client: Client, api_key: &str, retry: RetryPolicy) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL, retry)
    }

    /// Point the client at another host (a wiremock server in tests).
    #[must_use]
    pub fn with_base_url(
        client: Client,
        api_key: &str,
        base_url: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            api_key: api_key.to_owned(),
            base_url: normalize_base_url(base_url),
            retry,
        }
    }

    async fn search_once(&self, company_name: &str) -> Result<Vec<ArticleLocator>, ProviderError> {
        let url = format!("{}/v2/everything", self.base_url);
        // The key travels in a header so it never appears in a request URL,
        // and therefore never in a transport error or a log line.
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .query(&[("q", company_name)])
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;

        // NewsAPI reports errors (bad key, rate limit) as JSON with a non-2xx
        // status, so decode before looking at the status code.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;
        let parsed: NewsApiResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::UnexpectedStatus {
                    status: status.as_u16(),
                    url,
                })
            }
            Err(source) => {
                return Err(ProviderError::Deserialize {
                    context: format!("newsapi everything(q={company_name})"),
                    source,
                })
            }
        };

        if parsed.status != "ok" {
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(ProviderError::UnexpectedStatus {
                    status: status.as_u16(),
                    url,
                });
            }
            return Err(ProviderError::Api(
                parsed
                    .message
                    .unwrap_or_else(|| format!("status {}", parsed.status)),
            ));
        }

        Ok(parsed
            .articles
            .into_iter()
            .filter_map(|a| a.url)
            .filter(|u| !u.trim().is_empty())
            .take(newsbrief_core::MAX_ARTICLE_CEILING)
            .collect())
    }
}

#[async_trait]
impl ArticleDiscovery for NewsApiDiscovery {
    async fn discover(&self, company_name: &str) -> Result<Vec<ArticleLocator>, ProviderError> {
        let locators =
            retry_with_backoff(self.retry, "newsapi", || self.search_once(company_name)).await?;
        tracing::debug!(
            company = company_name,
            count = locators.len(),
            "NewsAPI discovery complete"
        );
        Ok(locators)
    }
}
