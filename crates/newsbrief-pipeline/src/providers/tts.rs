//! Google Translate text-to-speech, written to local MP3 files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};

use super::translate::split_words;
use super::{ensure_success, normalize_base_url, SpeechSynthesizer};
use crate::error::ProviderError;
use crate::retry::{retry_with_backoff, RetryPolicy};

const DEFAULT_BASE_URL: &str = "https://translate.google.com";

/// `translate_tts` refuses requests with longer `q` values.
const MAX_SPEECH_CHARS: usize = 200;

/// Synthesizes speech chunk by chunk and stores the concatenated MP3 under
/// `audio_dir`, named by content hash so repeat runs reuse the same path.
pub struct GoogleTts {
    client: Client,
    base_url: String,
    audio_dir: PathBuf,
    retry: RetryPolicy,
}

impl GoogleTts {
    #[must_use]
    pub fn new(client: Client, audio_dir: &Path, retry: RetryPolicy) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, audio_dir, retry)
    }

    #[must_use]
    pub fn with_base_url(
        client: Client,
        base_url: &str,
        audio_dir: &Path,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            audio_dir: audio_dir.to_path_buf(),
            retry,
        }
    }

    async fn synthesize_chunk(&self, chunk: &str, lang: &str) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/translate_tts", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("q", chunk),
            ])
            .send()
            .await?;
        let bytes = ensure_success(response)?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<String, ProviderError> {
        let chunks = chunk_for_speech(text);
        if chunks.is_empty() {
            return Err(ProviderError::EmptyResponse("google_tts"));
        }

        let mut audio = Vec::new();
        for chunk in &chunks {
            let bytes = retry_with_backoff(self.retry, "google_tts", || {
                self.synthesize_chunk(chunk, lang)
            })
            .await?;
            audio.extend_from_slice(&bytes);
        }
        if audio.is_empty() {
            return Err(ProviderError::EmptyResponse("google_tts"));
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let path = self.audio_dir.join(audio_file_name(text, lang));
        tokio::fs::write(&path, &audio).await?;
        tracing::debug!(
            lang,
            chunks = chunks.len(),
            bytes = audio.len(),
            path = %path.display(),
            "speech synthesized"
        );
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Split text into speakable pieces of at most 200 characters, at word
/// boundaries. Blank input yields no pieces.
#[must_use]
pub fn chunk_for_speech(text: &str) -> Vec<String> {
    split_words(text, MAX_SPEECH_CHARS)
}

/// `{sha256(lang + text)}.mp3`, lowercase hex.
fn audio_file_name(text: &str, lang: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(lang.as_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}.mp3", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_for_speech("Analysis for Acme"), vec!["Analysis for Acme"]);
    }

    #[test]
    fn chunks_respect_the_length_limit() {
        let text = "शेयर बाजार में तेजी ".repeat(40);
        let chunks = chunk_for_speech(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_SPEECH_CHARS));
        assert_eq!(
            chunks.join(" "),
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        );
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_for_speech("  \n ").is_empty());
    }

    #[test]
    fn file_name_is_stable_and_language_sensitive() {
        let a = audio_file_name("hello", "hi");
        assert_eq!(a, audio_file_name("hello", "hi"));
        assert_ne!(a, audio_file_name("hello", "en"));
        assert!(a.ends_with(".mp3"));
        assert_eq!(a.len(), 64 + 4);
    }
}
