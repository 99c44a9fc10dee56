//! Demo report served only when `demo_fallback` is enabled and no backend is
//! configured. The body is marked as demo data in `metadata.note`.

use serde_json::{json, Value};

pub fn demo_body(file_name: &str) -> Value {
    json!({
        "status": "success",
        "full_transcript": "This is a demo transcript. Configure an analysis backend to get real results.",
        "sentences": [
            {
                "text": "This is a demo sentence showing how the analysis works.",
                "start": 0.0,
                "end": 3.5,
                "duration": 3.5,
                "label": "not hatespeech",
                "explanation": "This is demo data. Configure an analysis backend for real analysis.",
                "toxicity": 5.2
            },
            {
                "text": "Another example sentence with moderate toxicity.",
                "start": 3.5,
                "end": 7.2,
                "duration": 3.7,
                "label": "potential hatespeech",
                "explanation": "Demo explanation showing the analysis format.",
                "toxicity": 42.8
            },
            {
                "text": "High toxicity example for demonstration purposes.",
                "start": 7.2,
                "end": 10.5,
                "duration": 3.3,
                "label": "hatespeech",
                "explanation": "Flagged as an example of how detection is reported.",
                "toxicity": 78.5
            }
        ],
        "metadata": {
            "filename": file_name,
            "note": "Demo data - configure backend_url for real analysis"
        }
    })
}
