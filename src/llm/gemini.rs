//! Cliente da API `generateContent` do Gemini.
//!
//! A API devolve um candidato por chamada, então as `n` amostras são `n`
//! requisições sequenciais. Qualquer falha interrompe o lote inteiro.

use serde::{Deserialize, Serialize};

use super::{check_status, http_client, GenerationOptions, LlmError, TextGenerator};

const ENV_API_KEY: &str = "GOOGLE_API_KEY";
const ENV_BASE_URL: &str = "GEMINI_BASE_URL";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: impl Into<String>,
        options: GenerationOptions,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            options,
        })
    }

    /// Lê `GOOGLE_API_KEY` (obrigatória) e `GEMINI_BASE_URL` (opcional).
    pub fn from_env(options: GenerationOptions) -> Result<Self, LlmError> {
        let api_key =
            std::env::var(ENV_API_KEY).map_err(|_| LlmError::MissingApiKey(ENV_API_KEY))?;
        let base_url =
            std::env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url, options)
    }

    fn request<'a>(&self, system_prompt: &'a str, user_prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part {
                    text: system_prompt,
                }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: user_prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.options.max_output_tokens,
                temperature: self.options.temperature,
                top_p: self.options.top_p,
            },
        }
    }

    fn generate_one(&self, url: &str, body: &GenerateRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()?;
        let parsed: GenerateResponse = check_status(response)?.json()?;
        first_candidate_text(parsed)
    }
}

impl TextGenerator for GeminiClient {
    fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        n: usize,
    ) -> Result<Vec<String>, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.options.model
        );
        let body = self.request(system_prompt, user_prompt);

        let mut texts = Vec::with_capacity(n);
        for i in 0..n {
            tracing::debug!(url = %url, sample = i, "Gemini: enviando requisição");
            texts.push(self.generate_one(&url, &body)?);
        }
        Ok(texts)
    }
}

/// Texto do primeiro candidato, com as partes concatenadas.
fn first_candidate_text(response: GenerateResponse) -> Result<String, LlmError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;
    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;

    #[test]
    fn request_body_shape() {
        let client = GeminiClient::new(
            "key".into(),
            "http://localhost:1",
            GenerationOptions::for_provider(Provider::Gemini),
        )
        .unwrap();
        let body = serde_json::to_value(client.request("sys", "user")).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["generationConfig"]["temperature"], 1.0);
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let json = r#"{"candidates":[
            {"content":{"role":"model","parts":[{"text":"```prolog\n"},{"text":"?- male(tom).\n```"}]}},
            {"content":{"role":"model","parts":[{"text":"ignored"}]}}
        ]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            first_candidate_text(parsed).unwrap(),
            "```prolog\n?- male(tom).\n```"
        );
    }

    #[test]
    fn missing_candidates_is_an_error() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            first_candidate_text(parsed),
            Err(LlmError::EmptyResponse)
        ));
    }
}
