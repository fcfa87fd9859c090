//! Cliente da API Chat Completions da OpenAI.
//!
//! As `n` amostras saem de uma única requisição (parâmetro `n`), cada uma
//! em um `choice` da resposta.

use serde::{Deserialize, Serialize};

use super::{check_status, http_client, GenerationOptions, LlmError, TextGenerator};

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    n: usize,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
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

    /// Lê `OPENAI_API_KEY` (obrigatória) e `OPENAI_BASE_URL` (opcional).
    pub fn from_env(options: GenerationOptions) -> Result<Self, LlmError> {
        let api_key =
            std::env::var(ENV_API_KEY).map_err(|_| LlmError::MissingApiKey(ENV_API_KEY))?;
        let base_url =
            std::env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url, options)
    }

    fn request<'a>(&'a self, system_prompt: &'a str, user_prompt: &'a str, n: usize) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.options.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            n,
            max_tokens: self.options.max_output_tokens,
            temperature: self.options.temperature,
            top_p: self.options.top_p,
        }
    }
}

impl TextGenerator for OpenAiClient {
    fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        n: usize,
    ) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request(system_prompt, user_prompt, n);
        tracing::debug!(url = %url, n, "OpenAI: enviando requisição");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;
        let parsed: ChatResponse = check_status(response)?.json()?;
        texts_from(parsed)
    }
}

/// Um texto por `choice`; conteúdo nulo vira string vazia para manter a
/// correspondência entre amostras e candidatos.
fn texts_from(response: ChatResponse) -> Result<Vec<String>, LlmError> {
    if response.choices.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(response
        .choices
        .into_iter()
        .map(|choice| choice.message.content.unwrap_or_default())
        .collect())
}
