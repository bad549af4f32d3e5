//! Article page fetching and text extraction.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;

use super::{ensure_success, ContentExtractor};
use crate::error::ProviderError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::ExtractedContent;

/// A container whose text is shorter than this is passed over for the next one.
const SUBSTANTIAL_TEXT_CHARS: usize = 500;

const DEFAULT_TITLE: &str = "News Article";

static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>|<!--.*?-->",
    )
    .expect("valid noise regex")
});

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(p|h1|h2|h3)\b[^>]*>(.*?)</(?:p|h1|h2|h3)\s*>").expect("valid block regex")
});

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").expect("valid paragraph regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tags regex"));

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));

static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld script regex")
});

/// Candidate body containers in preference order. The `article-body` pattern
/// matches only the opening tag; see [`element_tail`].
static CONTAINER_RES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"(?is)<article\b[^>]*>(.*?)</article\s*>",
        r"(?is)<main\b[^>]*>(.*?)</main\s*>",
        r#"(?is)<[a-z0-9]+\b[^>]*class\s*=\s*["'][^"']*\barticle-body\b[^"']*["'][^>]*>"#,
        r"(?is)<body\b[^>]*>(.*?)</body\s*>",
    ]
    .map(|pattern| Regex::new(pattern).expect("valid container regex"))
});

/// Fetches article pages with a browser-like UA and extracts readable text.
pub struct HtmlExtractor {
    client: Client,
    retry: RetryPolicy,
}

impl HtmlExtractor {
    #[must_use]
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn fetch_once(&self, locator: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(locator)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await?;
        Ok(ensure_success(response)?.text().await?)
    }
}

#[async_trait]
impl ContentExtractor for HtmlExtractor {
    async fn fetch(&self, locator: &str) -> Result<ExtractedContent, ProviderError> {
        let html = retry_with_backoff(self.retry, "article_fetch", || self.fetch_once(locator)).await?;
        Ok(extract_content(&html))
    }
}

/// Extract a title and body text from an HTML document.
///
/// The body comes from the first source whose text exceeds 500 characters:
/// JSON-LD `articleBody`, then the `p`/`h1`/`h2`/`h3` text of `<article>`,
/// `<main>`, an `article-body` element, and `<body>`. When none qualifies,
/// every `<p>` on the page is joined instead.
#[must_use]
pub fn extract_content(html: &str) -> ExtractedContent {
    let title = extract_title(html);
    let cleaned = NOISE_RE.replace_all(html, " ");

    if let Some(body) = extract_json_ld_body(html) {
        if body.chars().count() > SUBSTANTIAL_TEXT_CHARS {
            return ExtractedContent { title, body };
        }
    }

    let [article, main, article_body, body_el] = &*CONTAINER_RES;
    let containers = [
        element_inner(&cleaned, article),
        element_inner(&cleaned, main),
        element_tail(&cleaned, article_body),
        element_inner(&cleaned, body_el),
    ];

    for container in containers.into_iter().flatten() {
        let text = block_text(container);
        if text.chars().count() > SUBSTANTIAL_TEXT_CHARS {
            return ExtractedContent { title, body: text };
        }
    }

    let body = PARAGRAPH_RE
        .captures_iter(&cleaned)
        .filter_map(|cap| cap.get(1).map(|m| clean_text(m.as_str())))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    ExtractedContent { title, body }
}

fn extract_title(html: &str) -> String {
    TITLE_RE
        .captures(html)
        .and_then(|cap| cap.get(1).map(|m| clean_text(m.as_str())))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Inner HTML of the first element matched by `re` (group 1).
fn element_inner<'a>(html: &'a str, re: &Regex) -> Option<&'a str> {
    re.captures(html).and_then(|cap| cap.get(1)).map(|m| m.as_str())
}

/// Everything after the opening tag matched by `re`.
///
/// Used where the closing tag cannot be paired without a real parser; the
/// block regex only picks up paragraphs anyway.
fn element_tail<'a>(html: &'a str, re: &Regex) -> Option<&'a str> {
    re.find(html).map(|m| &html[m.end()..])
}

fn block_text(container: &str) -> String {
    BLOCK_RE
        .captures_iter(container)
        .filter_map(|cap| cap.get(2).map(|m| clean_text(m.as_str())))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_json_ld_body(html: &str) -> Option<String> {
    let mut best = String::new();
    for cap in JSON_LD_RE.captures_iter(html) {
        let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            continue;
        };
        collect_article_bodies(&value, &mut best);
    }

    (!best.is_empty()).then_some(best)
}

fn collect_article_bodies(value: &Value, best: &mut String) {
    match value {
        Value::Object(map) => {
            if let Some(body) = map.get("articleBody").and_then(Value::as_str) {
                let body = clean_text(body);
                if body.len() > best.len() {
                    *best = body;
                }
            }
            for child in map.values() {
                collect_article_bodies(child, best);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_article_bodies(child, best);
            }
        }
        _ => {}
    }
}

/// Strip tags, decode common entities, and collapse whitespace.
pub(crate) fn clean_text(input: &str) -> String {
    let no_tags = TAG_RE.replace_all(input, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        let Some(end) = after.find(';').filter(|&i| i <= 10) else {
            out.push('&');
            rest = &after[1..];
            continue;
        };
        let entity = &after[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" | "rdquo" | "ldquo" => Some('"'),
            "apos" | "#39" | "rsquo" | "lsquo" => Some('\''),
            "nbsp" => Some(' '),
            "mdash" | "ndash" => Some('-'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        if let Some(c) = decoded {
            out.push(c);
            rest = &after[end + 1..];
        } else {
            out.push('&');
            rest = &after[1..];
        }
    }
    out.push_str(rest);
    out
}
