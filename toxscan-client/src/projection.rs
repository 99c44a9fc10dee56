//! Display model for an analysis result
//!
//! Presentation-agnostic: the CLI renders [`ReportView`] as plain text via
//! `Display`, other front ends can walk the rows themselves.

use std::fmt;

use serde::Serialize;
use toxscan_common::human_time::format_timestamp;
use toxscan_common::{AnalysisResponse, Label, SentenceDetection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub fn from_label(label: Option<&Label>) -> Self {
        match label {
            Some(Label::Hatespeech) => Severity::High,
            Some(Label::PotentialHatespeech) => Severity::Medium,
            Some(Label::NotHatespeech) => Severity::Low,
            Some(Label::Other(_)) | None => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "-",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceRow {
    /// `start` as `MM:SS`
    pub timestamp: String,
    pub text: String,
    pub label: Option<String>,
    pub severity: Severity,
    pub explanation: Option<String>,
    pub toxicity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub file_name: String,
    pub duration_label: String,
    pub flagged_count: usize,
    pub potential_count: usize,
    pub full_transcript: String,
    pub rows: Vec<SentenceRow>,
}

/// Reshape a response into rows, keeping the backend's sentence order.
pub fn project(file_name: &str, response: &AnalysisResponse) -> ReportView {
    let rows: Vec<SentenceRow> = response.sentences.iter().map(row).collect();
    let count = |severity: Severity| rows.iter().filter(|r| r.severity == severity).count();

    ReportView {
        file_name: file_name.to_string(),
        duration_label: format_timestamp(response.total_duration()),
        flagged_count: count(Severity::High),
        potential_count: count(Severity::Medium),
        full_transcript: response.full_transcript.clone(),
        rows,
    }
}

fn row(sentence: &SentenceDetection) -> SentenceRow {
    SentenceRow {
        timestamp: format_timestamp(sentence.start),
        text: sentence.text.clone(),
        label: sentence.label.as_ref().map(|l| l.as_str().to_string()),
        severity: Severity::from_label(sentence.label.as_ref()),
        explanation: sentence.explanation.clone(),
        toxicity: sentence.toxicity,
    }
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis of {} ({})", self.file_name, self.duration_label)?;
        writeln!(
            f,
            "{} flagged, {} potential, {} sentences",
            self.flagged_count,
            self.potential_count,
            self.rows.len()
        )?;
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "[{}] {:<6} {}", row.timestamp, row.severity, row.text)?;
            if let Some(toxicity) = row.toxicity {
                write!(f, " (toxicity {:.2})", toxicity)?;
            }
            writeln!(f)?;
            if let Some(explanation) = &row.explanation {
                writeln!(f, "        {}", explanation)?;
            }
        }

        if !self.full_transcript.is_empty() {
            writeln!(f)?;
            writeln!(f, "Transcript:")?;
            writeln!(f, "{}", self.full_transcript)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> AnalysisResponse {
        AnalysisResponse::from_value(&value).unwrap()
    }

    #[test]
    fn test_single_sentence_at_zero() {
        let view = project(
            "hello.wav",
            &response(json!({
                "full_transcript": "Hi",
                "sentences": [{"text": "Hi", "start": 0, "end": 1}]
            })),
        );

        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].timestamp, "00:00");
        assert_eq!(view.rows[0].text, "Hi");
        assert_eq!(view.rows[0].severity, Severity::Unknown);
        assert_eq!(view.duration_label, "00:01");
        assert_eq!(view.flagged_count, 0);
    }

    #[test]
    fn test_counts_and_severity_follow_labels() {
        let view = project(
            "talk.mp3",
            &response(json!({
                "full_transcript": "a b c d",
                "sentences": [
                    {"text": "a", "start": 0.0, "end": 2.0, "label": "hatespeech", "toxicity": 0.91},
                    {"text": "b", "start": 2.0, "end": 4.0, "label": "POTENTIAL hatespeech"},
                    {"text": "c", "start": 65.5, "end": 70.0, "label": "not hatespeech"},
                    {"text": "d", "start": 70.0, "end": 71.0, "label": "sarcasm"}
                ]
            })),
        );

        let severities: Vec<_> = view.rows.iter().map(|r| r.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::High, Severity::Medium, Severity::Low, Severity::Unknown]
        );
        assert_eq!(view.flagged_count, 1);
        assert_eq!(view.potential_count, 1);
        assert_eq!(view.rows[2].timestamp, "01:05");
        assert_eq!(view.rows[3].label.as_deref(), Some("sarcasm"));
    }

    #[test]
    fn test_text_rendering_lists_rows_in_order() {
        let view = project(
            "x.wav",
            &response(json!({
                "full_transcript": "first second",
                "sentences": [
                    {"text": "first", "start": 0, "end": 1, "label": "hatespeech", "explanation": "slur"},
                    {"text": "second", "start": 1, "end": 2}
                ]
            })),
        );

        let text = view.to_string();
        let first = text.find("[00:00] HIGH   first").unwrap();
        let second = text.find("[00:01] -      second").unwrap();
        assert!(first < second);
        assert!(text.contains("        slur"));
        assert!(text.ends_with("first second\n"));
    }
}
