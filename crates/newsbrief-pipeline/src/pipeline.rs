//! Request-scoped orchestration of discovery, per-article analysis,
//! aggregation, narration, and localization.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::task::{JoinError, JoinHandle};

use crate::aggregate::aggregate;
use crate::analyzer::ArticleAnalyzer;
use crate::error::{PipelineError, ProviderError};
use crate::localize::LocalizedAudioProducer;
use crate::narrate::render;
use crate::normalize::normalize_run;
use crate::providers::{ContentExtractor, Providers};
use crate::types::{
    AnalysisRun, ArticleAnalysis, ArticleLocator, PipelineConfig, RawArticle,
};

/// Turns a company name into an [`AnalysisRun`].
///
/// Built once per process from shared [`Providers`]; `run` may be called
/// concurrently and keeps no state between calls.
pub struct PipelineOrchestrator {
    providers: Providers,
    analyzer: Arc<ArticleAnalyzer>,
    localizer: LocalizedAudioProducer,
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(providers: Providers, config: PipelineConfig) -> Self {
        let analyzer = Arc::new(ArticleAnalyzer::new(
            Arc::clone(&providers.summarizer),
            Arc::clone(&providers.sentiment),
            Arc::clone(&providers.topics),
            config.provider_timeout,
        ));
        let localizer = LocalizedAudioProducer::new(
            Arc::clone(&providers.translator),
            Arc::clone(&providers.synthesizer),
            &config.target_language,
            config.provider_timeout,
        );
        Self {
            providers,
            analyzer,
            localizer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline for one company.
    ///
    /// Provider failures are absorbed stage by stage; zero analyzable
    /// articles is the `fallback` state, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyCompanyName`] for a blank name and
    /// [`PipelineError::Internal`] if an article task panics.
    pub async fn run(&self, company_name: &str) -> Result<AnalysisRun, PipelineError> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(PipelineError::EmptyCompanyName);
        }
        let started = tokio::time::Instant::now();
        tracing::info!(company = company_name, "analysis run started");

        let locators = self.discover(company_name).await;
        let analyses = self.analyze_articles(company_name, locators).await?;

        if analyses.is_empty() {
            tracing::info!(company = company_name, "no analyzable articles, returning fallback");
            return Ok(AnalysisRun::fallback(company_name));
        }

        let report = aggregate(&analyses);
        let narration = render(company_name, &report);
        let localized = self.localizer.produce(&narration).await;
        let (localized_text, audio_reference) = match localized {
            Some(l) => (Some(l.localized_text), Some(l.audio_reference)),
            None => (None, None),
        };

        let mut run = AnalysisRun {
            company_name: company_name.to_string(),
            articles: analyses,
            comparative_report: Some(report),
            narration_text: Some(narration),
            localized_text,
            audio_reference,
            fallback: false,
            message: None,
        };
        normalize_run(&mut run);

        tracing::info!(
            company = company_name,
            articles = run.articles.len(),
            localized = run.audio_reference.is_some(),
            elapsed_ms = started.elapsed().as_millis(),
            "analysis run complete"
        );
        Ok(run)
    }

    /// Discovery never fails the run: errors become an empty list. The
    /// result is de-duplicated and cut to the configured ceiling.
    async fn discover(&self, company_name: &str) -> Vec<ArticleLocator> {
        let result = call_with_timeout(
            "discovery",
            self.config.provider_timeout,
            self.providers.discovery.discover(company_name),
        )
        .await;

        let raw = match result {
            Ok(locators) => locators,
            Err(e) => {
                tracing::warn!(company = company_name, stage = "discovery", error = %e, "discovery failed");
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let locators: Vec<ArticleLocator> = raw
            .into_iter()
            .filter(|l| !l.trim().is_empty() && seen.insert(l.clone()))
            .take(self.config.max_articles)
            .collect();
        tracing::debug!(company = company_name, count = locators.len(), "discovered locators");
        locators
    }

    /// Extract and analyze every locator on its own task, at most
    /// `max_concurrent_articles` at a time, keeping discovery order.
    ///
    /// When the request deadline passes, finished articles are kept and the
    /// remaining tasks are aborted.
    async fn analyze_articles(
        &self,
        company_name: &str,
        locators: Vec<ArticleLocator>,
    ) -> Result<Vec<ArticleAnalysis>, PipelineError> {
        let deadline = tokio::time::Instant::now() + self.config.request_timeout;
        let total = locators.len();

        let extractor = Arc::clone(&self.providers.extractor);
        let analyzer = Arc::clone(&self.analyzer);
        let provider_timeout = self.config.provider_timeout;
        let min_body_chars = self.config.min_body_chars;

        let tasks = stream::iter(locators)
            .map(|locator| {
                AbortOnDrop(tokio::spawn(process_article(
                    Arc::clone(&extractor),
                    Arc::clone(&analyzer),
                    locator,
                    provider_timeout,
                    min_body_chars,
                )))
            })
            .buffered(self.config.max_concurrent_articles.max(1));
        let mut tasks = std::pin::pin!(tasks);

        let mut analyses = Vec::with_capacity(total);
        loop {
            match tokio::time::timeout_at(deadline, tasks.next()).await {
                Ok(Some(Ok(Some(analysis)))) => analyses.push(analysis),
                Ok(Some(Ok(None))) => {}
                Ok(Some(Err(e))) => {
                    tracing::error!(company = company_name, error = %e, "article task failed");
                    return Err(PipelineError::Internal(format!("article task failed: {e}")));
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        company = company_name,
                        completed = analyses.len(),
                        total,
                        timeout_ms = self.config.request_timeout.as_millis(),
                        "request deadline reached, keeping finished articles"
                    );
                    break;
                }
            }
        }

        tracing::debug!(
            company = company_name,
            analyzed = analyses.len(),
            total,
            "article stage complete"
        );
        Ok(analyses)
    }
}

async fn process_article(
    extractor: Arc<dyn ContentExtractor>,
    analyzer: Arc<ArticleAnalyzer>,
    locator: ArticleLocator,
    provider_timeout: Duration,
    min_body_chars: usize,
) -> Option<ArticleAnalysis> {
    let content = match call_with_timeout("extract", provider_timeout, extractor.fetch(&locator)).await
    {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(url = %locator, stage = "extract", error = %e, "skipping article");
            return None;
        }
    };

    let Some(raw) = RawArticle::accept(locator.clone(), content, min_body_chars) else {
        tracing::debug!(url = %locator, min_body_chars, "skipping article with short body");
        return None;
    };

    Some(analyzer.analyze(&raw).await)
}

/// Run one collaborator call under a timeout; an elapsed timer is an
/// ordinary [`ProviderError`].
pub(crate) async fn call_with_timeout<T, F>(
    stage: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            stage,
            after_ms: limit.as_millis(),
        }),
    }
}

/// A spawned task that is aborted when its handle is dropped unfinished.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
