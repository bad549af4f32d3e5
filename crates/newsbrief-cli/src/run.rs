//! Command handlers: build the orchestrator, run once, print.

use newsbrief_core::AppConfig;
use newsbrief_pipeline::{
    AnalysisRun, PipelineConfig, PipelineOrchestrator, ProviderMode, Providers,
};

pub(crate) fn mode(offline: bool) -> ProviderMode {
    if offline {
        ProviderMode::Offline
    } else {
        ProviderMode::Online
    }
}

async fn run_pipeline(
    config: &AppConfig,
    company: &str,
    offline: bool,
) -> anyhow::Result<AnalysisRun> {
    let provider_mode = mode(offline);
    tracing::debug!(?config, mode = ?provider_mode, "configuration loaded");
    let providers = Providers::from_app_config(config, provider_mode)?;
    let orchestrator = PipelineOrchestrator::new(providers, PipelineConfig::from_app_config(config));
    let run = orchestrator.run(company).await?;
    tracing::info!(
        company = %run.company_name,
        articles = run.articles.len(),
        fallback = run.fallback,
        localized = run.audio_reference.is_some(),
        "analysis finished"
    );
    Ok(run)
}

/// Print the full run as JSON.
///
/// # Errors
///
/// Returns an error for a blank company name, an internal pipeline fault,
/// or an HTTP client that cannot be built.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    company: &str,
    offline: bool,
    compact: bool,
) -> anyhow::Result<()> {
    let run = run_pipeline(config, company, offline).await?;
    println!("{}", render_json(&run, compact)?);
    Ok(())
}

/// Print the narration, or a notice when nothing was analyzable.
///
/// # Errors
///
/// Same as [`run_analyze`].
pub(crate) async fn run_narrate(
    config: &AppConfig,
    company: &str,
    offline: bool,
) -> anyhow::Result<()> {
    let run = run_pipeline(config, company, offline).await?;
    println!("{}", narration_or_notice(&run));
    if let Some(audio) = &run.audio_reference {
        eprintln!("audio: {audio}");
    }
    Ok(())
}

pub(crate) fn render_json(run: &AnalysisRun, compact: bool) -> anyhow::Result<String> {
    let text = if compact {
        serde_json::to_string(run)?
    } else {
        serde_json::to_string_pretty(run)?
    };
    Ok(text)
}

pub(crate) fn narration_or_notice(run: &AnalysisRun) -> String {
    match (&run.narration_text, &run.message) {
        (Some(text), _) => text.trim_end().to_string(),
        (None, Some(message)) => format!("{}: {message}", run.company_name),
        (None, None) => format!("{}: no narration produced", run.company_name),
    }
}
