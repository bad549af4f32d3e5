//! Replacement of non-finite floats before a run leaves the pipeline.

use crate::types::AnalysisRun;

/// `NaN` and `±inf` become `0.0`; finite values are untouched.
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Normalize every float in the run in place.
pub fn normalize_run(run: &mut AnalysisRun) {
    for article in &mut run.articles {
        article.sentiment.score = finite_or_zero(article.sentiment.score);
    }
    if let Some(report) = run.comparative_report.as_mut() {
        report.average_sentiment_score = finite_or_zero(report.average_sentiment_score);
    }
}
