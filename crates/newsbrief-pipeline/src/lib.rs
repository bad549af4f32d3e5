//! Company news analysis pipeline.
//!
//! A run takes a company name through discovery, per-article extraction and
//! analysis (summary, sentiment, topics), cross-article aggregation, a fixed
//! narration template, and localization into translated speech. Every
//! external concern is a trait in [`providers`]; failures there are absorbed
//! stage by stage so a run degrades instead of failing.
//!
//! ```no_run
//! # async fn demo(config: newsbrief_core::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
//! use newsbrief_pipeline::{PipelineConfig, PipelineOrchestrator, ProviderMode, Providers};
//!
//! let providers = Providers::from_app_config(&config, ProviderMode::Online)?;
//! let orchestrator = PipelineOrchestrator::new(providers, PipelineConfig::from_app_config(&config));
//! let run = orchestrator.run("Tesla").await?;
//! println!("{}", serde_json::to_string_pretty(&run)?);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod analyzer;
pub mod error;
pub mod localize;
pub mod narrate;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod retry;
pub mod topics;
pub mod types;

pub use aggregate::aggregate;
pub use analyzer::ArticleAnalyzer;
pub use error::{PipelineError, ProviderError};
pub use localize::LocalizedAudioProducer;
pub use narrate::render;
pub use pipeline::PipelineOrchestrator;
pub use providers::{ProviderMode, Providers};
pub use retry::RetryPolicy;
pub use topics::{extract_topics, FrequencyTopics};
pub use types::{
    AnalysisRun, ArticleAnalysis, ArticleLocator, ComparativeReport, ExtractedContent,
    LocalizedAudio, PipelineConfig, ProviderSentiment, RawArticle, SentimentLabel,
    SentimentResult, SummaryLength, TopicCount, FALLBACK_MESSAGE, MAX_TOPICS, MIN_BODY_CHARS,
};
