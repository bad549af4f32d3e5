//! End-to-end orchestrator behaviour with in-process stub providers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use newsbrief_pipeline::providers::{
    ArticleDiscovery, ContentExtractor, SentimentProvider, SpeechSynthesizer, Summarizer,
    Translator,
};
use newsbrief_pipeline::{
    AnalysisRun, ArticleLocator, ExtractedContent, FrequencyTopics, PipelineConfig,
    PipelineError, PipelineOrchestrator, ProviderError, ProviderSentiment, Providers,
    SentimentLabel, SummaryLength, FALLBACK_MESSAGE,
};

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

struct StaticDiscovery(Result<Vec<&'static str>, ()>);

#[async_trait]
impl ArticleDiscovery for StaticDiscovery {
    async fn discover(&self, _: &str) -> Result<Vec<ArticleLocator>, ProviderError> {
        match &self.0 {
            Ok(urls) => Ok(urls.iter().map(|u| (*u).to_string()).collect()),
            Err(()) => Err(ProviderError::Api("search down".into())),
        }
    }
}

struct SingleLocator(String);

#[async_trait]
impl ArticleDiscovery for SingleLocator {
    async fn discover(&self, _: &str) -> Result<Vec<ArticleLocator>, ProviderError> {
        Ok(vec![self.0.clone()])
    }
}

enum Page {
    Body(String),
    Fails,
    Slow(Duration),
}

#[derive(Default)]
struct MapExtractor {
    pages: HashMap<&'static str, Page>,
    calls: AtomicUsize,
}

impl MapExtractor {
    fn with(mut self, url: &'static str, page: Page) -> Self {
        self.pages.insert(url, page);
        self
    }
}

#[async_trait]
impl ContentExtractor for MapExtractor {
    async fn fetch(&self, locator: &str) -> Result<ExtractedContent, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = match self.pages.get(locator) {
            Some(Page::Body(body)) => body.clone(),
            Some(Page::Slow(delay)) => {
                tokio::time::sleep(*delay).await;
                article_body("late")
            }
            Some(Page::Fails) | None => {
                return Err(ProviderError::UnexpectedStatus {
                    status: 403,
                    url: locator.to_string(),
                })
            }
        };
        Ok(ExtractedContent {
            title: format!("Title for {locator}"),
            body,
        })
    }
}

/// Sleeps `delays[locator]` and records the peak number of fetches in flight.
struct TrackingExtractor {
    delays: HashMap<&'static str, Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl TrackingExtractor {
    fn new(delays: &[(&'static str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|&(url, ms)| (url, Duration::from_millis(ms)))
                .collect(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentExtractor for TrackingExtractor {
    async fn fetch(&self, locator: &str) -> Result<ExtractedContent, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let delay = self.delays.get(locator).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ExtractedContent {
            title: format!("Title for {locator}"),
            body: article_body("steady"),
        })
    }
}

struct FirstSentenceSummarizer;

#[async_trait]
impl Summarizer for FirstSentenceSummarizer {
    async fn summarize(&self, text: &str, _: SummaryLength) -> Result<String, ProviderError> {
        Ok(text.split('.').next().unwrap_or_default().to_string())
    }
}

struct PanickingSummarizer;

#[async_trait]
impl Summarizer for PanickingSummarizer {
    async fn summarize(&self, _: &str, _: SummaryLength) -> Result<String, ProviderError> {
        panic!("model crashed");
    }
}

/// "good" → POSITIVE 0.9, "bad" → NEGATIVE 0.7, "weird" → NaN, else NEUTRAL 0.5.
struct KeywordSentiment;

#[async_trait]
impl SentimentProvider for KeywordSentiment {
    async fn classify(&self, text: &str) -> Result<ProviderSentiment, ProviderError> {
        let (class, score) = if text.contains("good") {
            ("POSITIVE", 0.9)
        } else if text.contains("bad") {
            ("NEGATIVE", 0.7)
        } else if text.contains("weird") {
            ("POSITIVE", f64::NAN)
        } else {
            ("NEUTRAL", 0.5)
        };
        Ok(ProviderSentiment {
            class: class.to_string(),
            score,
        })
    }
}

struct StubTranslator {
    fail: bool,
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(&self, text: &str, lang: &str) -> Result<String, ProviderError> {
        if self.fail {
            Err(ProviderError::Api("translate down".into()))
        } else {
            Ok(format!("[{lang}] {text}"))
        }
    }
}

struct StubSynthesizer;

#[async_trait]
impl SpeechSynthesizer for StubSynthesizer {
    async fn synthesize(&self, _: &str, lang: &str) -> Result<String, ProviderError> {
        Ok(format!("audio/run-{lang}.mp3"))
    }
}

fn article_body(keyword: &str) -> String {
    format!(
        "Acme {keyword} quarter announced. {}",
        "Acme battery factory output expanded across regional markets. ".repeat(4)
    )
}

fn providers(
    discovery: StaticDiscovery,
    extractor: MapExtractor,
    translator_fails: bool,
) -> Providers {
    Providers {
        discovery: Arc::new(discovery),
        extractor: Arc::new(extractor),
        summarizer: Arc::new(FirstSentenceSummarizer),
        sentiment: Arc::new(KeywordSentiment),
        topics: Arc::new(FrequencyTopics),
        translator: Arc::new(StubTranslator {
            fail: translator_fails,
        }),
        synthesizer: Arc::new(StubSynthesizer),
    }
}

fn orchestrator(providers: Providers) -> PipelineOrchestrator {
    PipelineOrchestrator::new(providers, PipelineConfig::default())
}

fn urls(run: &AnalysisRun) -> Vec<&str> {
    run.articles.iter().map(|a| a.locator.as_str()).collect()
}

fn assert_all_finite(run: &AnalysisRun) {
    for article in &run.articles {
        assert!(article.sentiment.score.is_finite(), "article score not finite");
    }
    if let Some(report) = &run.comparative_report {
        assert!(report.average_sentiment_score.is_finite(), "average not finite");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failed_extraction_of_five_keeps_the_other_four() {
    let extractor = MapExtractor::default()
        .with("https://n/1", Page::Body(article_body("good")))
        .with("https://n/2", Page::Fails)
        .with("https://n/3", Page::Body(article_body("bad")))
        .with("https://n/4", Page::Body(article_body("good")))
        .with("https://n/5", Page::Body(article_body("steady")));
    let discovery = StaticDiscovery(Ok(vec![
        "https://n/1",
        "https://n/2",
        "https://n/3",
        "https://n/4",
        "https://n/5",
    ]));

    let run = orchestrator(providers(discovery, extractor, false))
        .run("Acme")
        .await
        .expect("run succeeds");

    assert!(!run.fallback);
    assert_eq!(urls(&run), vec!["https://n/1", "https://n/3", "https://n/4", "https://n/5"]);
    let report = run.comparative_report.as_ref().expect("report present");
    assert_eq!(report.total_articles, 4);
    assert_eq!(report.count_for(SentimentLabel::Positive), 2);
    assert_eq!(report.count_for(SentimentLabel::Negative), 1);
    assert_eq!(report.count_for(SentimentLabel::Neutral), 1);
    // (0.9 + 0.7 + 0.9 + 0.5) / 4
    assert!((report.average_sentiment_score - 0.75).abs() < f64::EPSILON);
    assert!(report.common_topics.len() <= 5);
    assert_eq!(run.articles[0].summary, "Acme good quarter announced");
}

#[tokio::test]
async fn narration_and_localization_are_populated() {
    let extractor = MapExtractor::default().with("https://n/1", Page::Body(article_body("good")));
    let run = orchestrator(providers(
        StaticDiscovery(Ok(vec!["https://n/1"])),
        extractor,
        false,
    ))
    .run("  Acme  ")
    .await
    .expect("run succeeds");

    assert_eq!(run.company_name, "Acme");
    let narration = run.narration_text.as_deref().expect("narration present");
    assert!(narration.starts_with("Analysis for Acme:\nA total of 1 articles were analyzed.\n"));
    assert!(narration.contains(
        "Sentiment distribution: 1 positive articles, 0 negative articles, and 0 neutral articles.\n"
    ));
    assert!(narration.ends_with("The average sentiment score across all articles was 0.90.\n"));
    assert_eq!(run.localized_text.as_deref(), Some(format!("[hi] {narration}").as_str()));
    assert_eq!(run.audio_reference.as_deref(), Some("audio/run-hi.mp3"));
    assert!(run.message.is_none());
}

#[tokio::test]
async fn empty_discovery_is_the_fallback_state() {
    let run = orchestrator(providers(
        StaticDiscovery(Ok(vec![])),
        MapExtractor::default(),
        false,
    ))
    .run("Acme")
    .await
    .expect("fallback is not an error");

    assert!(run.fallback);
    assert_eq!(run.message.as_deref(), Some(FALLBACK_MESSAGE));
    assert!(run.articles.is_empty());
    assert!(run.comparative_report.is_none());
    assert!(run.narration_text.is_none());
    assert!(run.audio_reference.is_none());
}

#[tokio::test]
async fn discovery_failure_degrades_to_fallback() {
    let run = orchestrator(providers(
        StaticDiscovery(Err(())),
        MapExtractor::default(),
        false,
    ))
    .run("Acme")
    .await
    .expect("fallback is not an error");
    assert!(run.fallback);
}

#[tokio::test]
async fn short_bodies_never_reach_analysis() {
    let extractor = MapExtractor::default()
        .with("https://n/short", Page::Body("Too short to analyze.".into()))
        .with("https://n/exact", Page::Body("x".repeat(100)));
    let run = orchestrator(providers(
        StaticDiscovery(Ok(vec!["https://n/short", "https://n/exact"])),
        extractor,
        false,
    ))
    .run("Acme")
    .await
    .expect("run succeeds");
    assert!(run.fallback);
}

#[tokio::test]
async fn localization_failure_keeps_the_run_successful() {
    let extractor = MapExtractor::default().with("https://n/1", Page::Body(article_body("bad")));
    let run = orchestrator(providers(
        StaticDiscovery(Ok(vec!["https://n/1"])),
        extractor,
        true,
    ))
    .run("Acme")
    .await
    .expect("run succeeds");

    assert!(!run.fallback);
    assert!(run.narration_text.is_some());
    assert!(run.localized_text.is_none());
    assert!(run.audio_reference.is_none());
}

#[tokio::test]
async fn non_finite_scores_never_leave_the_pipeline() {
    let extractor = MapExtractor::default()
        .with("https://n/1", Page::Body(article_body("weird")))
        .with("https://n/2", Page::Body(article_body("good")));
    let run = orchestrator(providers(
        StaticDiscovery(Ok(vec!["https://n/1", "https://n/2"])),
        extractor,
        false,
    ))
    .run("Acme")
    .await
    .expect("run succeeds");

    assert_all_finite(&run);
    assert!(run.articles[0].sentiment.score.abs() < f64::EPSILON);
    let report = run.comparative_report.as_ref().expect("report");
    assert!((report.average_sentiment_score - 0.9).abs() < f64::EPSILON);

    let json = serde_json::to_value(&run).expect("serialize");
    assert_eq!(json["articles"][0]["sentiment"]["score"], 0.0);
}

#[tokio::test]
async fn duplicates_are_dropped_and_ceiling_applied() {
    let mut extractor = MapExtractor::default();
    let all: Vec<&'static str> = vec![
        "https://n/a", "https://n/a", "https://n/b", "https://n/c", "https://n/d",
    ];
    for url in ["https://n/a", "https://n/b", "https://n/c", "https://n/d"] {
        extractor = extractor.with(url, Page::Body(article_body("steady")));
    }
    let config = PipelineConfig {
        max_articles: 3,
        ..PipelineConfig::default()
    };
    let orchestrator =
        PipelineOrchestrator::new(providers(StaticDiscovery(Ok(all)), extractor, false), config);

    let run = orchestrator.run("Acme").await.expect("run succeeds");
    assert_eq!(urls(&run), vec!["https://n/a", "https://n/b", "https://n/c"]);
}

#[tokio::test]
async fn blank_company_name_is_rejected() {
    let result = orchestrator(providers(
        StaticDiscovery(Ok(vec![])),
        MapExtractor::default(),
        false,
    ))
    .run("   ")
    .await;
    assert!(matches!(result, Err(PipelineError::EmptyCompanyName)));
}

#[tokio::test(start_paused = true)]
async fn request_deadline_keeps_finished_articles() {
    let extractor = MapExtractor::default()
        .with("https://n/1", Page::Body(article_body("good")))
        .with("https://n/2", Page::Body(article_body("bad")))
        .with("https://n/slow", Page::Slow(Duration::from_secs(600)));
    let config = PipelineConfig {
        provider_timeout: Duration::from_secs(3600),
        request_timeout: Duration::from_secs(30),
        ..PipelineConfig::default()
    };
    let orchestrator = PipelineOrchestrator::new(
        providers(
            StaticDiscovery(Ok(vec!["https://n/1", "https://n/2", "https://n/slow"])),
            extractor,
            false,
        ),
        config,
    );

    let run = orchestrator.run("Acme").await.expect("partial run succeeds");
    assert!(!run.fallback);
    assert_eq!(urls(&run), vec!["https://n/1", "https://n/2"]);
}

#[tokio::test(start_paused = true)]
async fn slow_extraction_times_out_like_any_failure() {
    let extractor = MapExtractor::default()
        .with("https://n/slow", Page::Slow(Duration::from_secs(600)))
        .with("https://n/ok", Page::Body(article_body("good")));
    let config = PipelineConfig {
        provider_timeout: Duration::from_secs(5),
        ..PipelineConfig::default()
    };
    let orchestrator = PipelineOrchestrator::new(
        providers(
            StaticDiscovery(Ok(vec!["https://n/slow", "https://n/ok"])),
            extractor,
            false,
        ),
        config,
    );

    let run = orchestrator.run("Acme").await.expect("run succeeds");
    assert_eq!(urls(&run), vec!["https://n/ok"]);
}

#[tokio::test]
async fn panicking_article_task_is_an_internal_fault() {
    let extractor = MapExtractor::default().with("https://n/1", Page::Body(article_body("good")));
    let mut p = providers(StaticDiscovery(Ok(vec!["https://n/1"])), extractor, false);
    p.summarizer = Arc::new(PanickingSummarizer);

    let result = orchestrator(p).run("Acme").await;
    assert!(matches!(result, Err(PipelineError::Internal(_))));
}

#[tokio::test]
async fn runs_are_independent() {
    let extractor = Arc::new(
        MapExtractor::default().with("https://n/1", Page::Body(article_body("good"))),
    );
    let p = Providers {
        extractor: Arc::clone(&extractor) as Arc<dyn ContentExtractor>,
        ..providers(StaticDiscovery(Ok(vec!["https://n/1"])), MapExtractor::default(), false)
    };
    let orchestrator = orchestrator(p);

    let first = orchestrator.run("Acme").await.expect("first run");
    let second = orchestrator.run("Acme").await.expect("second run");
    assert_eq!(first, second);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn articles_keep_discovery_order_and_respect_the_worker_bound() {
    // Later locators finish first.
    let order = [
        "https://n/1",
        "https://n/2",
        "https://n/3",
        "https://n/4",
        "https://n/5",
        "https://n/6",
    ];
    let extractor = Arc::new(TrackingExtractor::new(&[
        ("https://n/1", 600),
        ("https://n/2", 500),
        ("https://n/3", 400),
        ("https://n/4", 300),
        ("https://n/5", 200),
        ("https://n/6", 100),
    ]));
    let p = Providers {
        extractor: Arc::clone(&extractor) as Arc<dyn ContentExtractor>,
        ..providers(StaticDiscovery(Ok(order.to_vec())), MapExtractor::default(), false)
    };
    let config = PipelineConfig {
        max_concurrent_articles: 2,
        ..PipelineConfig::default()
    };

    let run = PipelineOrchestrator::new(p, config)
        .run("Acme")
        .await
        .expect("run succeeds");

    assert_eq!(urls(&run), order.to_vec());
    let peak = extractor.peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "{peak} fetches ran at once, bound is 2");
    assert_eq!(peak, 2, "fetches should overlap up to the bound");
}

// ---------------------------------------------------------------------------
// Providers wired from configuration
// ---------------------------------------------------------------------------

fn offline_app_config(provider_timeout_secs: u64, max_retries: u32) -> newsbrief_core::AppConfig {
    newsbrief_core::AppConfig {
        env: newsbrief_core::Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("socket addr"),
        log_level: "warn".into(),
        newsapi_key: None,
        hf_api_token: None,
        hf_base_url: "http://127.0.0.1:1".into(),
        summary_model: "unused".into(),
        sentiment_model: "unused".into(),
        target_language: "hi".into(),
        audio_dir: std::env::temp_dir().join("newsbrief-wired-test"),
        max_articles: 10,
        max_concurrent_articles: 4,
        provider_timeout_secs,
        request_timeout_secs: 30,
        user_agent: newsbrief_core::DEFAULT_USER_AGENT.into(),
        max_retries,
        retry_backoff_base_ms: 0,
    }
}

#[tokio::test]
async fn timed_out_fetch_is_retried_within_the_stage_budget() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    let html = format!(
        "<html><head><title>Acme</title></head><body><article><p>{}</p></article></body></html>",
        article_body("good")
    );
    Mock::given(method("GET"))
        .and(path("/story"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.clone())
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/story"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(&server)
        .await;

    let config = offline_app_config(1, 2);
    let story = format!("{}/story", server.uri());
    let p = Providers {
        discovery: Arc::new(SingleLocator(story.clone())),
        translator: Arc::new(StubTranslator { fail: false }),
        synthesizer: Arc::new(StubSynthesizer),
        ..Providers::from_app_config(&config, newsbrief_pipeline::ProviderMode::Offline)
            .expect("providers")
    };
    let orchestrator = PipelineOrchestrator::new(p, PipelineConfig::from_app_config(&config));

    let run = orchestrator.run("Acme").await.expect("run succeeds");
    assert!(!run.fallback, "the retried fetch should land inside the 1 s budget");
    assert_eq!(urls(&run), vec![story.as_str()]);
}
