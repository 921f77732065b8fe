use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    audio::{AudioClip, AudioFormat},
    config::AssistantConfig,
    error::AssistantError,
    model::Language,
    provider::truncate_body,
};

use super::{AdviceRequest, AdvisoryAssistant, SpeechSynthesizer, Transcriber, weather_context};

/// Client for an OpenAI-compatible API: chat completions, transcriptions and speech.
#[derive(Debug, Clone)]
pub struct HostedAssistant {
    http: Client,
    api_key: String,
    config: AssistantConfig,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl HostedAssistant {
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AssistantError::NotConfigured)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Unavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self { http, api_key, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn system_prompt(request: &AdviceRequest<'_>) -> String {
        let mut prompt = String::from(
            "You are an agricultural advisor helping smallholder farmers plan field work \
             around the weather. Give short, practical advice grounded in the forecast below. \
             Mention flood risk when it is medium or high.",
        );
        if let Some(crop) = request.crop {
            prompt.push_str(&format!(" The farmer grows {crop}."));
        }
        prompt.push_str(&format!(" Reply in {}.", request.language.name()));
        prompt.push_str("\n\n");
        prompt.push_str(&weather_context(request.summary));
        prompt
    }

    async fn check(response: Response, what: &str) -> Result<Response, AssistantError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AssistantError::Unavailable(format!(
            "{what} failed with status {status}: {}",
            truncate_body(&body)
        )))
    }
}

const GENERAL_QUESTION: &str =
    "Based on this forecast, what should I do on my farm over the coming days?";

#[async_trait]
impl AdvisoryAssistant for HostedAssistant {
    #[instrument(skip(self, request), fields(model = %self.config.model, history = request.history.len()))]
    async fn advise(&self, request: &AdviceRequest<'_>) -> Result<String, AssistantError> {
        let system = Self::system_prompt(request);
        let question = request.question.unwrap_or(GENERAL_QUESTION);

        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage { role: "system", content: &system });
        messages.extend(
            request
                .history
                .iter()
                .map(|turn| ChatMessage { role: turn.role.as_str(), content: &turn.text }),
        );
        messages.push(ChatMessage { role: "user", content: question });

        let body = ChatRequest { model: &self.config.model, messages, temperature: 0.3 };

        let response = self
            .http
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Unavailable(format!("chat request failed: {e}")))?;

        let parsed: ChatResponse = Self::check(response, "chat completion")
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::Unavailable(format!("invalid chat response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AssistantError::Unavailable("empty chat response".to_string()))?;

        debug!(chars = text.len(), "Received advice");
        Ok(text)
    }
}

#[async_trait]
impl Transcriber for HostedAssistant {
    #[instrument(skip(self, clip), fields(bytes = clip.len(), format = ?clip.format()))]
    async fn transcribe(
        &self,
        clip: &AudioClip,
        language: Language,
    ) -> Result<String, AssistantError> {
        let part = Part::bytes(clip.data().to_vec())
            .file_name(clip.file_name("question"))
            .mime_str(clip.format().mime_type())
            .map_err(|e| AssistantError::UnsupportedAudio(format!("invalid MIME type: {e}")))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.config.stt_model.clone())
            .text("language", language.code());

        let response = self
            .http
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssistantError::Unavailable(format!("transcription request failed: {e}")))?;

        let parsed: TranscriptionResponse = Self::check(response, "transcription")
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::Unavailable(format!("invalid transcription: {e}")))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(AssistantError::UnsupportedAudio("no speech recognised".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl SpeechSynthesizer for HostedAssistant {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<AudioClip, AssistantError> {
        let body = SpeechRequest {
            model: &self.config.tts_model,
            input: text,
            voice: &self.config.voice,
            response_format: "mp3",
        };

        let response = self
            .http
            .post(self.url("audio/speech"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Unavailable(format!("speech request failed: {e}")))?;

        let bytes = Self::check(response, "speech synthesis")
            .await?
            .bytes()
            .await
            .map_err(|e| AssistantError::Unavailable(format!("failed to read audio: {e}")))?;

        AudioClip::new(AudioFormat::Mp3, bytes.to_vec())
            .map_err(|_| AssistantError::Unavailable("speech service returned no audio".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Crop;

    #[test]
    fn new_requires_api_key() {
        let err = HostedAssistant::new(AssistantConfig::default()).unwrap_err();
        assert!(matches!(err, AssistantError::NotConfigured));
    }

    #[test]
    fn url_joins_base_without_double_slash() {
        let config = AssistantConfig {
            api_key: Some("k".into()),
            base_url: "http://localhost:9000/v1/".into(),
            ..Default::default()
        };
        let assistant = HostedAssistant::new(config).unwrap();
        assert_eq!(assistant.url("chat/completions"), "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn system_prompt_carries_crop_and_language() {
        let request = AdviceRequest {
            summary: &[],
            question: None,
            crop: Some(Crop::Maize),
            language: Language::Gujarati,
            history: &[],
        };
        let prompt = HostedAssistant::system_prompt(&request);
        assert!(prompt.contains("grows Maize"));
        assert!(prompt.contains("Reply in Gujarati"));
        assert!(prompt.contains("Daily forecast summary"));
    }
}
