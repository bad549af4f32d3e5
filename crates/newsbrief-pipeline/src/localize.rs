//! Translation of the narration followed by speech synthesis.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ProviderError;
use crate::pipeline::call_with_timeout;
use crate::providers::{SpeechSynthesizer, Translator};
use crate::types::LocalizedAudio;

pub struct LocalizedAudioProducer {
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    target_language: String,
    provider_timeout: Duration,
}

impl LocalizedAudioProducer {
    #[must_use]
    pub fn new(
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        target_language: &str,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            translator,
            synthesizer,
            target_language: target_language.to_string(),
            provider_timeout,
        }
    }

    /// Translate then synthesize. Either step failing yields `None`; there is
    /// no state with text but no audio.
    pub async fn produce(&self, narration: &str) -> Option<LocalizedAudio> {
        match self.try_produce(narration).await {
            Ok(localized) => Some(localized),
            Err(e) => {
                tracing::warn!(
                    lang = %self.target_language,
                    error = %e,
                    "localization failed, continuing without audio"
                );
                None
            }
        }
    }

    async fn try_produce(&self, narration: &str) -> Result<LocalizedAudio, ProviderError> {
        let lang = self.target_language.as_str();
        let localized_text = call_with_timeout(
            "translate",
            self.provider_timeout,
            self.translator.translate(narration, lang),
        )
        .await?;
        if localized_text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse("translator"));
        }

        let audio_reference = call_with_timeout(
            "synthesize",
            self.provider_timeout,
            self.synthesizer.synthesize(&localized_text, lang),
        )
        .await?;
        if audio_reference.trim().is_empty() {
            return Err(ProviderError::EmptyResponse("synthesizer"));
        }

        tracing::debug!(lang, audio = %audio_reference, "localization complete");
        Ok(LocalizedAudio {
            audio_reference,
            localized_text,
        })
    }
}
