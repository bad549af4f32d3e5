//! Cross-article statistics for one run.

use std::collections::{BTreeMap, HashMap};

use crate::types::{ArticleAnalysis, ComparativeReport, TopicCount, MAX_TOPICS};

/// Build the comparative report for a set of analyses.
///
/// Pure and deterministic: the same input always yields the same report.
/// Non-finite sentiment scores are left out of the mean.
#[must_use]
pub fn aggregate(analyses: &[ArticleAnalysis]) -> ComparativeReport {
    let mut sentiment_distribution = BTreeMap::new();
    for analysis in analyses {
        *sentiment_distribution
            .entry(analysis.sentiment.label)
            .or_insert(0) += 1;
    }

    ComparativeReport {
        total_articles: analyses.len(),
        sentiment_distribution,
        average_sentiment_score: average_score(analyses),
        common_topics: common_topics(analyses),
    }
}

fn average_score(analyses: &[ArticleAnalysis]) -> f64 {
    let finite: Vec<f64> = analyses
        .iter()
        .map(|a| a.sentiment.score)
        .filter(|s| s.is_finite())
        .collect();
    if finite.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    let rounded = round2(mean);
    if rounded.is_finite() {
        rounded
    } else {
        0.0
    }
}

/// Round half away from zero to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn common_topics(analyses: &[ArticleAnalysis]) -> Vec<TopicCount> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for topic in analyses.iter().flat_map(|a| a.topics.iter()) {
        let count = counts.entry(topic.as_str()).or_insert(0);
        if *count == 0 {
            order.push(topic.as_str());
        }
        *count += 1;
    }

    let mut ranked: Vec<TopicCount> = order
        .into_iter()
        .map(|topic| TopicCount {
            topic: topic.to_string(),
            count: counts.get(topic).copied().unwrap_or(0),
        })
        .collect();
    // Stable: equal counts stay in first-seen order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(MAX_TOPICS);
    ranked
}
