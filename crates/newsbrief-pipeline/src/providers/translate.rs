//! Google Translate web endpoint (`translate_a/single`).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{ensure_success, normalize_base_url, Translator};
use crate::error::ProviderError;
use crate::retry::{retry_with_backoff, RetryPolicy};

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// The endpoint rejects query strings much past this.
const MAX_CHUNK_CHARS: usize = 1800;

pub struct GoogleTranslator {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GoogleTranslator {
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

    async fn translate_chunk(&self, chunk: &str, target_lang: &str) -> Result<String, ProviderError> {
        let url = format!("{}/translate_a/single", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", chunk),
            ])
            .send()
            .await?;
        let body = ensure_success(response)?.text().await?;
        let value: Value =
            serde_json::from_str(&body).map_err(|source| ProviderError::Deserialize {
                context: format!("google translate (tl={target_lang})"),
                source,
            })?;
        parse_translation(&value).ok_or(ProviderError::EmptyResponse("google_translate"))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError> {
        let mut translated = Vec::new();
        for chunk in chunk_lines(text, MAX_CHUNK_CHARS) {
            let part = retry_with_backoff(self.retry, "google_translate", || {
                self.translate_chunk(&chunk, target_lang)
            })
            .await?;
            translated.push(part);
        }
        if translated.is_empty() {
            return Err(ProviderError::EmptyResponse("google_translate"));
        }
        tracing::debug!(
            target_lang,
            chunks = translated.len(),
            "translation complete"
        );
        Ok(translated.join("\n"))
    }
}

/// Concatenate the translated segments at `[0][i][0]` of a `gtx` response.
fn parse_translation(value: &Value) -> Option<String> {
    let segments = value.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    let trimmed = text.trim_end_matches('\n');
    (!trimmed.trim().is_empty()).then(|| trimmed.to_string())
}

/// Group whole lines into chunks of at most `max_chars` characters.
///
/// A single line longer than `max_chars` is split at word boundaries, and a
/// single word longer than that is cut. Blank lines are dropped.
fn chunk_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        for piece in split_words(line, max_chars) {
            let needed = if current.is_empty() {
                piece.chars().count()
            } else {
                current.chars().count() + 1 + piece.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split `text` at spaces into pieces of at most `max_chars` characters.
pub(crate) fn split_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for part in chars.chunks(max_chars) {
                pieces.push(part.iter().collect());
            }
            continue;
        }
        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
