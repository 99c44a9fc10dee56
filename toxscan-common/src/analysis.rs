//! Analysis response types
//!
//! Mirrors the JSON body returned by the external analysis backend:
//!
//! ```json
//! { "full_transcript": "...",
//!   "sentences": [ { "text": "Hi", "start": 0.0, "end": 1.0, "duration": 1.0,
//!                    "label": "not hatespeech", "explanation": "...", "toxicity": 3.5 } ] }
//! ```
//!
//! Unknown fields (`status`, `metadata`, ...) are tolerated on input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification label attached to a sentence
///
/// Parsed case-insensitively. Labels outside the known set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    Hatespeech,
    NotHatespeech,
    PotentialHatespeech,
    Other(String),
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::Hatespeech => "hatespeech",
            Label::NotHatespeech => "not hatespeech",
            Label::PotentialHatespeech => "potential hatespeech",
            Label::Other(raw) => raw,
        }
    }
}

impl From<String> for Label {
    fn from(raw: String) -> Self {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match normalized.as_str() {
            "hatespeech" => Label::Hatespeech,
            "not hatespeech" => Label::NotHatespeech,
            "potential hatespeech" => Label::PotentialHatespeech,
            _ => Label::Other(raw),
        }
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped unit of the backend's classification output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceDetection {
    pub text: String,
    /// Seconds from the start of the media
    pub start: f64,
    /// Seconds from the start of the media, `>= start`
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toxicity: Option<f64>,
}

/// Full transcript plus chronologically ordered sentence detections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub full_transcript: String,
    pub sentences: Vec<SentenceDetection>,
}

impl AnalysisResponse {
    /// Parse and structurally check a backend body.
    ///
    /// The error string describes the first problem found.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        let response: AnalysisResponse =
            serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
        response.check_structure()?;
        Ok(response)
    }

    /// Timestamps must be finite, `end >= start`, and `start` non-decreasing.
    pub fn check_structure(&self) -> Result<(), String> {
        let mut previous_start = f64::NEG_INFINITY;
        for (index, sentence) in self.sentences.iter().enumerate() {
            if !sentence.start.is_finite() || !sentence.end.is_finite() {
                return Err(format!("sentence {} has a non-finite timestamp", index));
            }
            if sentence.start < 0.0 {
                return Err(format!("sentence {} starts before zero", index));
            }
            if sentence.end < sentence.start {
                return Err(format!(
                    "sentence {} ends ({}) before it starts ({})",
                    index, sentence.end, sentence.start
                ));
            }
            if sentence.start < previous_start {
                return Err(format!("sentence {} is out of chronological order", index));
            }
            previous_start = sentence.start;
        }
        Ok(())
    }

    /// End of the last sentence, or zero for an empty report
    pub fn total_duration(&self) -> f64 {
        self.sentences.last().map(|s| s.end).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_sentence_parses() {
        let body = json!({
            "full_transcript": "Hi",
            "sentences": [{ "text": "Hi", "start": 0, "end": 1 }]
        });
        let response = AnalysisResponse::from_value(&body).unwrap();
        assert_eq!(response.sentences.len(), 1);
        assert_eq!(response.sentences[0].label, None);
        assert_eq!(response.total_duration(), 1.0);
    }

    #[test]
    fn test_extra_fields_are_tolerated() {
        let body = json!({
            "status": "success",
            "full_transcript": "",
            "sentences": [],
            "metadata": { "filename": "a.mp3" }
        });
        assert!(AnalysisResponse::from_value(&body).is_ok());
    }

    #[test]
    fn test_label_parsing_is_case_insensitive() {
        assert_eq!(Label::from("NOT Hatespeech".to_string()), Label::NotHatespeech);
        assert_eq!(Label::from("Hatespeech".to_string()), Label::Hatespeech);
        assert_eq!(
            Label::from("Potential  hatespeech".to_string()),
            Label::PotentialHatespeech
        );
        assert_eq!(
            Label::from("offensive".to_string()),
            Label::Other("offensive".to_string())
        );
    }

    #[test]
    fn test_missing_transcript_is_malformed() {
        let body = json!({ "sentences": [] });
        assert!(AnalysisResponse::from_value(&body).is_err());
    }

    #[test]
    fn test_end_before_start_is_malformed() {
        let body = json!({
            "full_transcript": "x",
            "sentences": [{ "text": "x", "start": 2.0, "end": 1.0 }]
        });
        let err = AnalysisResponse::from_value(&body).unwrap_err();
        assert!(err.contains("ends"));
    }

    #[test]
    fn test_out_of_order_sentences_are_malformed() {
        let body = json!({
            "full_transcript": "a b",
            "sentences": [
                { "text": "b", "start": 3.0, "end": 4.0 },
                { "text": "a", "start": 1.0, "end": 2.0 }
            ]
        });
        assert!(AnalysisResponse::from_value(&body).is_err());
    }
}
