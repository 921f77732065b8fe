//! Farming advice from the daily summary.
//!
//! [`HostedAssistant`] forwards questions to a hosted language model and also
//! handles voice transcription and speech. [`RuleAdvisor`] is the offline
//! fallback used whenever the hosted assistant is missing or unavailable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Write};

use crate::{
    audio::AudioClip,
    error::AssistantError,
    model::{Crop, DailySummary, Language},
};

pub mod hosted;
pub mod rules;

pub use hosted::HostedAssistant;
pub use rules::RuleAdvisor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One line of the chat history kept in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

/// Everything an assistant may use to produce advice.
#[derive(Debug, Clone, Copy)]
pub struct AdviceRequest<'a> {
    pub summary: &'a [DailySummary],
    /// `None` asks for general guidance for the period.
    pub question: Option<&'a str>,
    pub crop: Option<Crop>,
    pub language: Language,
    pub history: &'a [ChatTurn],
}

impl<'a> AdviceRequest<'a> {
    pub fn general(summary: &'a [DailySummary], language: Language) -> Self {
        Self { summary, question: None, crop: None, language, history: &[] }
    }
}

#[async_trait]
pub trait AdvisoryAssistant: Send + Sync + Debug {
    async fn advise(&self, request: &AdviceRequest<'_>) -> Result<String, AssistantError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    async fn transcribe(&self, clip: &AudioClip, language: Language)
    -> Result<String, AssistantError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, AssistantError>;
}

/// Plain-text rendering of the summary handed to the language model.
pub fn weather_context(summary: &[DailySummary]) -> String {
    let mut out = String::from("Daily forecast summary:\n");
    for day in summary {
        let _ = writeln!(
            out,
            "- {}: rain {:.1} mm, temperature {:.1} to {:.1} °C (mean {:.1}), \
             max wind {:.1} km/h, humidity {:.0}%, flood risk {}",
            day.date,
            day.rainfall_total_mm,
            day.temp_min_c,
            day.temp_max_c,
            day.temp_mean_c,
            day.wind_max_kmh,
            day.humidity_mean_pct,
            day.flood_risk,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{FloodThresholds, summarize, tests::reading};

    #[test]
    fn weather_context_lists_every_day() {
        let summary = summarize(
            &[reading("2024-06-01 00:00", 12.0, 24.0), reading("2024-06-02 00:00", 0.0, 31.0)],
            &FloodThresholds::default(),
        )
        .unwrap();

        let ctx = weather_context(&summary);
        assert!(ctx.contains("2024-06-01: rain 12.0 mm"));
        assert!(ctx.contains("flood risk medium"));
        assert!(ctx.contains("2024-06-02: rain 0.0 mm"));
    }

    #[test]
    fn chat_turn_constructors_set_roles() {
        assert_eq!(ChatTurn::user("hi").role, Role::User);
        assert_eq!(ChatTurn::assistant("hello").role.as_str(), "assistant");
    }
}
