use crate::settings::config::VisionSettings;
use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use reqwest::blocking::Client;
use samcamcore::prelude::{AnalysisError, AnalysisResult, Frame, Posture, VisionAnalyzer};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const QUESTIONS: &str = "Now, answer these questions:

1. Is there a dog in the crate?
2. If yes, is the dog sitting, standing or lying down?
3. What is the probability (0.0 to 1.0) that the dog is panting? If it's not clear, respond with 0.0.

Respond using JSON following the provided schema.";

/// Asks a Gemini model whether the dog is in the crate and what it is doing.
pub struct GeminiAnalyzer {
    client: Client,
    url: String,
    api_key: String,
}

impl GeminiAnalyzer {
    pub fn new(settings: &VisionSettings) -> anyhow::Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .context("GEMINI_API_KEY is not set")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("building vision HTTP client")?;
        let url = format!(
            "{}/models/{}:generateContent",
            settings.endpoint.trim_end_matches('/'),
            settings.model
        );

        Ok(Self {
            client,
            url,
            api_key,
        })
    }
}

impl VisionAnalyzer for GeminiAnalyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<AnalysisResult, AnalysisError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(frame))
            .send()
            .map_err(|err| AnalysisError::Request(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| AnalysisError::Request(err.to_string()))?;
        if !status.is_success() {
            return Err(AnalysisError::Request(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        debug!("model replied for {}", frame.name);
        parse_response(&body)
    }
}

fn request_body(frame: &Frame) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": "Analyze this image:" },
                {
                    "inline_data": {
                        "mime_type": "image/jpeg",
                        "data": STANDARD.encode(&frame.bytes),
                    }
                },
                { "text": QUESTIONS },
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "is_dog": { "type": "BOOLEAN" },
                    "dog_state": {
                        "type": "STRING",
                        "enum": ["none", "sitting", "standing", "lying_down"],
                    },
                    "probability_is_panting": { "type": "NUMBER" },
                },
                "required": ["is_dog", "dog_state", "probability_is_panting"],
            },
        },
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Schema the model is asked to answer with.
#[derive(Debug, Deserialize)]
struct DogAnalysis {
    is_dog: bool,
    dog_state: Posture,
    probability_is_panting: f32,
}

pub fn parse_response(body: &str) -> Result<AnalysisResult, AnalysisError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|err| AnalysisError::Malformed(err.to_string()))?;

    let text = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.text)
        .ok_or(AnalysisError::MissingResponse)?;

    let analysis: DogAnalysis =
        serde_json::from_str(&text).map_err(|err| AnalysisError::Malformed(err.to_string()))?;

    AnalysisResult::new(
        analysis.is_dog,
        analysis.dog_state,
        analysis.probability_is_panting,
    )
}
