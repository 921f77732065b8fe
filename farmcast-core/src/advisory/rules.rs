use async_trait::async_trait;

use crate::{
    aggregate::outlook,
    error::AssistantError,
    model::{Crop, Outlook},
};

use super::{AdviceRequest, AdvisoryAssistant};

const HEAVY_RAIN_MM: f64 = 30.0;
const MODERATE_RAIN_MM: f64 = 10.0;
const HOT_C: f64 = 35.0;
const COOL_C: f64 = 20.0;
const HUMID_PCT: f64 = 85.0;

/// Question keywords in English, Gujarati and Hindi, checked in order.
const TOPICS: &[(&[&str], &str)] = &[
    (
        &["irrigate", "irrigation", "water", "પાણી", "सिंचाई"],
        "Delay irrigation if rain is expected; otherwise, water early morning.",
    ),
    (&["fertilizer", "fertiliser", "ખાતર", "खाद"], "Apply fertilizer on dry days; avoid heavy rain."),
    (
        &["disease", "fungus", "fungal", "રોગ", "रोग"],
        "Monitor crops for fungal disease; apply protection if high humidity.",
    ),
    (&["harvest", "કાપણી", "कटाई"], "Harvest on dry days; avoid rain periods."),
];

const GENERAL_ANSWER: &str = "Weather looks moderate. Follow general advisory.";

/// Offline advice from fixed rainfall, temperature and humidity bands.
#[derive(Debug, Clone, Default)]
pub struct RuleAdvisor;

impl RuleAdvisor {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(&self, outlook: &Outlook, crop: Option<Crop>) -> String {
        let rain = outlook.today_rain_mm;
        let mut advice = if rain > HEAVY_RAIN_MM {
            "Heavy rain: avoid fertilizer, secure crops and livestock.".to_string()
        } else if rain > MODERATE_RAIN_MM {
            "Moderate rain: delay irrigation, prepare drainage.".to_string()
        } else if rain > 0.0 {
            "Light rain: minimal irrigation needed.".to_string()
        } else {
            "No rain: schedule irrigation and fertilizer application.".to_string()
        };

        if outlook.mean_temp_c > HOT_C {
            advice.push_str(" High temperature: irrigate in cooler hours.");
        } else if outlook.mean_temp_c < COOL_C {
            advice.push_str(" Cooler weather: good for sowing wheat or mustard.");
        }

        if outlook.mean_humidity_pct > HUMID_PCT {
            advice.push_str(" High humidity: monitor fungal diseases.");
        }

        if let Some(crop) = crop {
            advice.push_str(&format!(" {}", crop_note(crop)));
        }

        advice
    }

    /// Keyword answer for a question, otherwise guidance for the period.
    pub fn respond(&self, request: &AdviceRequest<'_>) -> String {
        if let Some(question) = request.question {
            return self.answer(question).to_string();
        }

        match outlook(request.summary) {
            Some(outlook) => self.compose(&outlook, request.crop),
            None => GENERAL_ANSWER.to_string(),
        }
    }

    pub fn answer(&self, question: &str) -> &'static str {
        let q = question.to_lowercase();
        TOPICS
            .iter()
            .find(|(words, _)| words.iter().any(|w| q.contains(w)))
            .map(|(_, answer)| *answer)
            .unwrap_or(GENERAL_ANSWER)
    }
}

fn crop_note(crop: Crop) -> &'static str {
    match crop {
        Crop::Wheat => "Wheat: avoid waterlogging and irrigate at crown root initiation.",
        Crop::Rice => "Rice: keep bunds intact to hold standing water.",
        Crop::Maize => "Maize: ensure field drainage; maize is sensitive to waterlogging.",
    }
}

#[async_trait]
impl AdvisoryAssistant for RuleAdvisor {
    async fn advise(&self, request: &AdviceRequest<'_>) -> Result<String, AssistantError> {
        Ok(self.respond(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FloodRisk, Language};

    fn outlook(rain: f64, temp: f64, humidity: f64) -> Outlook {
        Outlook {
            today_rain_mm: rain,
            mean_temp_c: temp,
            mean_humidity_pct: humidity,
            peak_risk: FloodRisk::Low,
        }
    }

    #[test]
    fn rain_bands_pick_headline() {
        let rules = RuleAdvisor::new();
        assert!(rules.compose(&outlook(45.0, 25.0, 50.0), None).starts_with("Heavy rain"));
        assert!(rules.compose(&outlook(12.0, 25.0, 50.0), None).starts_with("Moderate rain"));
        assert!(rules.compose(&outlook(0.4, 25.0, 50.0), None).starts_with("Light rain"));
        assert!(rules.compose(&outlook(0.0, 25.0, 50.0), None).starts_with("No rain"));
    }

    #[test]
    fn temperature_humidity_and_crop_notes_are_appended() {
        let rules = RuleAdvisor::new();
        let text = rules.compose(&outlook(0.0, 37.0, 90.0), Some(Crop::Rice));
        assert!(text.contains("cooler hours"));
        assert!(text.contains("fungal diseases"));
        assert!(text.contains("Rice:"));

        let cool = rules.compose(&outlook(0.0, 15.0, 40.0), None);
        assert!(cool.contains("sowing wheat"));
        assert!(!cool.contains("fungal"));
    }

    #[test]
    fn keywords_match_in_every_language() {
        let rules = RuleAdvisor::new();
        assert!(rules.answer("When should I IRRIGATE?").starts_with("Delay irrigation"));
        assert!(rules.answer("ખાતર ક્યારે નાખવું?").starts_with("Apply fertilizer"));
        assert!(rules.answer("गेहूं की कटाई कब करें").starts_with("Harvest"));
        assert_eq!(rules.answer("tell me a joke"), GENERAL_ANSWER);
    }

    #[tokio::test]
    async fn advise_without_summary_is_general() {
        let request = AdviceRequest::general(&[], Language::English);
        let text = RuleAdvisor::new().advise(&request).await.unwrap();
        assert_eq!(text, GENERAL_ANSWER);
    }
}
