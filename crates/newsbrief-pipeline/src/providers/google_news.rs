//! Google News RSS search.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

use super::{ensure_success, normalize_base_url, ArticleDiscovery};
use crate::error::ProviderError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::ArticleLocator;

const DEFAULT_BASE_URL: &str = "https://news.google.com";

pub struct GoogleNewsRssDiscovery {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GoogleNewsRssDiscovery {
    #[must_use]
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, retry)
    }

    #[must_use]
    pub fn with_base_url(client: Client, base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            retry,
        }
    }

    async fn search_once(&self, company_name: &str) -> Result<Vec<ArticleLocator>, ProviderError> {
        let encoded = utf8_percent_encode(company_name, NON_ALPHANUMERIC);
        let url = format!(
            "{}/rss/search?q={encoded}&hl=en-US&gl=US&ceid=US:en",
            self.base_url
        );
        let response = self.client.get(&url).send().await?;
        let body = ensure_success(response)?.text().await?;
        let mut links = parse_rss_links(&body)?;
        links.truncate(newsbrief_core::MAX_ARTICLE_CEILING);
        Ok(links)
    }
}

#[async_trait]
impl ArticleDiscovery for GoogleNewsRssDiscovery {
    async fn discover(&self, company_name: &str) -> Result<Vec<ArticleLocator>, ProviderError> {
        let locators =
            retry_with_backoff(self.retry, "google_news_rss", || self.search_once(company_name))
                .await?;
        tracing::debug!(
            company = company_name,
            count = locators.len(),
            "Google News RSS discovery complete"
        );
        Ok(locators)
    }
}

/// Extract every `<item><link>` of an RSS feed, in document order.
///
/// # Errors
///
/// Returns [`ProviderError::Xml`] if the XML is malformed.
pub fn parse_rss_links(xml: &str) -> Result<Vec<ArticleLocator>, ProviderError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut links = Vec::new();
    let mut in_item = false;
    let mut in_link = false;
    let mut link = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    link.clear();
                }
                b"link" if in_item => in_link = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"link" => in_link = false,
                b"item" if in_item => {
                    in_item = false;
                    let trimmed = link.trim();
                    if !trimmed.is_empty() {
                        links.push(trimmed.to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_link {
                    link.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::CData(e)) => {
                if in_link {
                    link.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ProviderError::Xml(e)),
            _ => {}
        }
    }

    Ok(links)
}
