//! Fixed-template prose rendering of a comparative report.

use std::fmt::Write as _;

use crate::types::{ComparativeReport, SentimentLabel, MAX_TOPICS};

/// Render the narration handed to localization.
///
/// One line each: header, article count, sentiment distribution (when any
/// article was labelled), topics (when any), average score (when non-zero).
/// Every line ends with `\n`; downstream consumers display it verbatim.
#[must_use]
pub fn render(company_name: &str, report: &ComparativeReport) -> String {
    let mut text = format!("Analysis for {company_name}:\n");
    let _ = writeln!(
        text,
        "A total of {} articles were analyzed.",
        report.total_articles
    );

    if !report.sentiment_distribution.is_empty() {
        let _ = writeln!(
            text,
            "Sentiment distribution: {} positive articles, {} negative articles, and {} neutral articles.",
            report.count_for(SentimentLabel::Positive),
            report.count_for(SentimentLabel::Negative),
            report.count_for(SentimentLabel::Neutral),
        );
    }

    if !report.common_topics.is_empty() {
        let topics = report
            .common_topics
            .iter()
            .take(MAX_TOPICS)
            .map(|t| t.topic.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(text, "The most frequently discussed topics were: {topics}.");
    }

    let average = report.average_sentiment_score;
    if average.is_finite() && average.abs() > 0.0 {
        let _ = writeln!(
            text,
            "The average sentiment score across all articles was {average:.2}."
        );
    }

    text
}
