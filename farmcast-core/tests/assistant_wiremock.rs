//! Hosted advisory assistant against a mock OpenAI-compatible server.

use farmcast_core::{
    AssistantConfig, AssistantError, Crop, FloodThresholds, HourlyReading, Language, summarize,
    advisory::{
        AdviceRequest, AdvisoryAssistant, ChatTurn, HostedAssistant, SpeechSynthesizer,
        Transcriber,
    },
    audio::{AudioClip, AudioFormat},
};
use chrono::NaiveDateTime;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, body_string_contains, header, method, path},
};

fn assistant(server: &MockServer) -> HostedAssistant {
    HostedAssistant::new(AssistantConfig {
        api_key: Some("sk-test".into()),
        base_url: format!("{}/v1", server.uri()),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

fn reading(ts: &str, rain: f64, temp: f64) -> HourlyReading {
    HourlyReading {
        timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
        rainfall_mm: rain,
        temperature_c: temp,
        wind_kmh: 12.0,
        humidity_pct: 75,
        condition: "Rain".into(),
    }
}

fn chat_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": text }, "finish_reason": "stop" }
        ]
    })
}

#[tokio::test]
async fn advise_sends_summary_history_and_question() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({ "model": "gpt-4o-mini" })))
        .and(body_string_contains("2024-06-01: rain 40.0 mm"))
        .and(body_string_contains("Reply in Hindi"))
        .and(body_string_contains("Can I spray today?"))
        .and(body_string_contains("Earlier question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("  Wait for dry weather.  ")))
        .expect(1)
        .mount(&server)
        .await;

    let summary = summarize(
        &[reading("2024-06-01 06:00", 25.0, 24.0), reading("2024-06-01 18:00", 15.0, 27.0)],
        &FloodThresholds::default(),
    )
    .unwrap();
    let history = [ChatTurn::user("Earlier question"), ChatTurn::assistant("Earlier answer")];
    let request = AdviceRequest {
        summary: &summary,
        question: Some("Can I spray today?"),
        crop: Some(Crop::Rice),
        language: Language::Hindi,
        history: &history,
    };

    let text = assistant(&server).advise(&request).await.unwrap();
    assert_eq!(text, "Wait for dry weather.");
}

#[tokio::test]
async fn advise_maps_server_error_to_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let request = AdviceRequest::general(&[], Language::English);
    let err = assistant(&server).advise(&request).await.unwrap_err();
    assert!(matches!(err, AssistantError::Unavailable(ref msg) if msg.contains("503")));
}

#[tokio::test]
async fn advise_rejects_empty_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let request = AdviceRequest::general(&[], Language::English);
    let err = assistant(&server).advise(&request).await.unwrap_err();
    assert!(matches!(err, AssistantError::Unavailable(_)));
}

#[tokio::test]
async fn transcribe_uploads_clip_with_language_hint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .and(body_string_contains("whisper-1"))
        .and(body_string_contains("question.m4a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": " खाद कब डालें? " })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let clip = AudioClip::new(AudioFormat::M4a, vec![7; 64]).unwrap();
    let text = assistant(&server).transcribe(&clip, Language::Hindi).await.unwrap();
    assert_eq!(text, "खाद कब डालें?");
}

#[tokio::test]
async fn synthesize_returns_mp3_clip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(body_partial_json(serde_json::json!({ "voice": "alloy", "response_format": "mp3" })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90, 0x00]))
        .mount(&server)
        .await;

    let clip = assistant(&server).synthesize("Delay irrigation.").await.unwrap();
    assert_eq!(clip.format(), AudioFormat::Mp3);
    assert_eq!(clip.data(), &[0xFF, 0xFB, 0x90, 0x00]);
}

#[tokio::test]
async fn synthesize_with_empty_body_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = assistant(&server).synthesize("Hello").await.unwrap_err();
    assert!(matches!(err, AssistantError::Unavailable(_)));
}
