//! Session state and event handling for one dashboard user.
//!
//! A [`Session`] is owned by the presentation layer and passed into every
//! call. [`Dashboard::handle`] is the render boundary: each event runs one
//! fetch → summarize → advise pass, and any error becomes a [`View::Message`].

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, instrument, warn};

use crate::{
    Config,
    advisory::{
        AdviceRequest, AdvisoryAssistant, ChatTurn, HostedAssistant, RuleAdvisor,
        SpeechSynthesizer, Transcriber,
    },
    aggregate::{FloodThresholds, outlook, summarize},
    audio::AudioClip,
    error::{AssistantError, DashboardError, SummaryError},
    model::{Crop, DailySummary, Forecast, Language, Outlook},
    provider::{ProviderId, WeatherProvider, default_provider_from_config, provider_from_config},
    radar::RadarEmbed,
};

/// Oldest turns are dropped beyond this many.
pub const MAX_HISTORY: usize = 20;

pub const FALLBACK_NOTICE: &str =
    "The advisory assistant is unavailable right now, so here is our standard guidance.";

/// Per-user state that survives between events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub city: String,
    pub language: Language,
    pub crop: Option<Crop>,
    pub history: Vec<ChatTurn>,
}

impl Session {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into(), ..Default::default() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            city: config.dashboard.default_city.clone().unwrap_or_default(),
            language: config.dashboard.language,
            crop: config.dashboard.crop,
            history: Vec::new(),
        }
    }

    fn remember(&mut self, question: &str, answer: &str) {
        self.history.push(ChatTurn::user(question));
        self.history.push(ChatTurn::assistant(answer));
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub text: String,
    /// Produced by the offline rules instead of the hosted assistant.
    pub fallback: bool,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub forecast: Forecast,
    pub summary: Vec<DailySummary>,
    pub outlook: Outlook,
}

#[derive(Debug, Clone)]
pub struct VoiceReply {
    pub transcript: String,
    pub advice: Advice,
}

#[derive(Debug, Clone)]
pub enum Event {
    SetCity(String),
    SetLanguage(Language),
    SetCrop(Option<Crop>),
    Refresh,
    Ask(String),
    Voice(AudioClip),
    ClearHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub enum View {
    Dashboard { report: Box<Report>, advice: Advice },
    Answer { question: String, advice: Advice },
    Voice(VoiceReply),
    Message { level: Level, text: String },
}

impl View {
    /// The advice this view shows, if any.
    pub fn advice(&self) -> Option<&Advice> {
        match self {
            View::Dashboard { advice, .. } | View::Answer { advice, .. } => Some(advice),
            View::Voice(reply) => Some(&reply.advice),
            View::Message { .. } => None,
        }
    }

    fn info(text: impl Into<String>) -> Self {
        View::Message { level: Level::Info, text: text.into() }
    }

    fn error(err: &DashboardError) -> Self {
        View::Message { level: Level::Error, text: err.user_message() }
    }
}

#[derive(Debug)]
pub struct Dashboard {
    provider: Box<dyn WeatherProvider>,
    thresholds: FloodThresholds,
    assistant: Option<Arc<dyn AdvisoryAssistant>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    rules: RuleAdvisor,
}

impl Dashboard {
    pub fn new(provider: Box<dyn WeatherProvider>, thresholds: FloodThresholds) -> Self {
        Self {
            provider,
            thresholds,
            assistant: None,
            transcriber: None,
            speech: None,
            rules: RuleAdvisor::new(),
        }
    }

    /// Wire provider, thresholds and (if configured) the hosted assistant from config.
    pub fn from_config(config: &Config, provider: Option<ProviderId>) -> anyhow::Result<Self> {
        let provider = match provider {
            Some(id) => provider_from_config(id, config)?,
            None => default_provider_from_config(config)?,
        };
        let mut dashboard = Self::new(provider, config.flood_thresholds()?);

        if config.assistant.is_enabled() {
            let hosted = HostedAssistant::new(config.assistant.clone())
                .context("Failed to set up the advisory assistant")?;
            dashboard = dashboard.with_hosted(hosted);
        }

        Ok(dashboard)
    }

    /// Use one hosted service for advice, transcription and speech.
    pub fn with_hosted(self, hosted: HostedAssistant) -> Self {
        let hosted = Arc::new(hosted);
        self.with_assistant(hosted.clone())
            .with_transcriber(hosted.clone())
            .with_speech(hosted)
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn AdvisoryAssistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Fetch and summarize the session's city.
    #[instrument(skip(self, session), fields(city = %session.city))]
    pub async fn report(&self, session: &Session) -> Result<Report, DashboardError> {
        let city = session.city.trim();
        if city.is_empty() {
            return Err(DashboardError::EmptyCity);
        }

        let forecast = self.provider.fetch(city).await?;
        let summary = summarize(&forecast.readings, &self.thresholds)?;
        let outlook = outlook(&summary).ok_or(SummaryError::EmptyInput)?;

        info!(
            location = %forecast.location,
            days = summary.len(),
            peak_risk = %outlook.peak_risk,
            "Built forecast report"
        );

        Ok(Report { forecast, summary, outlook })
    }

    /// General guidance for an already fetched report.
    pub async fn general_advice(&self, session: &Session, report: &Report) -> Advice {
        let request = AdviceRequest {
            summary: &report.summary,
            question: None,
            crop: session.crop,
            language: session.language,
            history: &[],
        };
        self.advise(&request).await
    }

    /// Answer a question about the session's city and record it in the history.
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<Advice, DashboardError> {
        let report = self.report(session).await?;
        let question = question.trim();
        if question.is_empty() {
            return Ok(self.general_advice(session, &report).await);
        }

        let request = AdviceRequest {
            summary: &report.summary,
            question: Some(question),
            crop: session.crop,
            language: session.language,
            history: &session.history,
        };
        let advice = self.advise(&request).await;

        session.remember(question, &advice.text);
        Ok(advice)
    }

    /// Transcribe a spoken question, then answer it like [`Dashboard::ask`].
    pub async fn ask_voice(
        &self,
        session: &mut Session,
        clip: &AudioClip,
    ) -> Result<VoiceReply, DashboardError> {
        let transcriber = self.transcriber.as_ref().ok_or(AssistantError::NotConfigured)?;
        let transcript = transcriber.transcribe(clip, session.language).await?;
        info!(chars = transcript.len(), "Transcribed voice question");

        let advice = self.ask(session, &transcript).await?;
        Ok(VoiceReply { transcript, advice })
    }

    pub async fn speak(&self, text: &str) -> Result<AudioClip, DashboardError> {
        let speech = self.speech.as_ref().ok_or(AssistantError::NotConfigured)?;
        Ok(speech.synthesize(text).await?)
    }

    pub fn radar(&self, report: &Report) -> RadarEmbed {
        RadarEmbed::new(Some(report.forecast.location.coordinates()))
    }

    /// Apply one user event. Errors never escape; they become messages.
    pub async fn handle(&self, session: &mut Session, event: Event) -> View {
        match event {
            Event::SetCity(city) => {
                session.city = city.trim().to_string();
                self.refresh(session).await
            }
            Event::SetLanguage(language) => {
                session.language = language;
                View::info(format!("Language set to {language}."))
            }
            Event::SetCrop(crop) => {
                session.crop = crop;
                match crop {
                    Some(crop) => View::info(format!("Crop set to {crop}.")),
                    None => View::info("Crop cleared."),
                }
            }
            Event::ClearHistory => {
                session.history.clear();
                View::info("Chat history cleared.")
            }
            Event::Refresh => self.refresh(session).await,
            Event::Ask(question) => match self.ask(session, &question).await {
                Ok(advice) => View::Answer { question, advice },
                Err(err) => self.fail(err),
            },
            Event::Voice(clip) => match self.ask_voice(session, &clip).await {
                Ok(reply) => View::Voice(reply),
                Err(err) => self.fail(err),
            },
        }
    }

    async fn refresh(&self, session: &Session) -> View {
        match self.report(session).await {
            Ok(report) => {
                let advice = self.general_advice(session, &report).await;
                View::Dashboard { report: Box::new(report), advice }
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&self, err: DashboardError) -> View {
        warn!(error = %err, "Dashboard event failed");
        View::error(&err)
    }

    async fn advise(&self, request: &AdviceRequest<'_>) -> Advice {
        let Some(assistant) = &self.assistant else {
            return Advice { text: self.rules.respond(request), fallback: true };
        };

        match assistant.advise(request).await {
            Ok(text) => Advice { text, fallback: false },
            Err(err) => {
                warn!(error = %err, "Advisory assistant failed, using rule-based advice");
                let text = format!("{FALLBACK_NOTICE}\n{}", self.rules.respond(request));
                Advice { text, fallback: true }
            }
        }
    }
}
