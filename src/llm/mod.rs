//! # Módulo LLM: Serviços de Geração de Texto
//!
//! Fronteira com os modelos de linguagem externos. Todo provedor expõe uma
//! única operação, [`TextGenerator::generate`]: dado um prompt de sistema e
//! um prompt de usuário, devolve `n` respostas amostradas de forma
//! independente.
//!
//! ## Provedores
//!
//! | Provedor | Sub-módulo | Modelo padrão | Max tokens padrão | Amostras |
//! |----------|------------|---------------|-------------------|----------|
//! | `openai` | [`openai`] | `gpt-4o` | 4096 | uma requisição com `n` |
//! | `gemini` | [`gemini`] | `gemini-1.5-pro` | 8192 | `n` requisições |
//!
//! O provedor é escolhido na inicialização (flag `--provider`) e não muda
//! durante a sessão. As chamadas são bloqueantes e sequenciais.

/// Cliente da API Chat Completions da OpenAI.
pub mod openai;

/// Cliente da API `generateContent` do Gemini.
pub mod gemini;

use thiserror::Error;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// Erros da fronteira com o serviço de geração.
///
/// Todos são tratados no [`Translator`](crate::nlu::Translator): logados e
/// convertidos em "tradução indisponível".
#[derive(Debug, Error)]
pub enum LlmError {
    /// Variável de ambiente com a chave da API não definida.
    #[error("missing API key: set {0}")]
    MissingApiKey(&'static str),

    /// Falha de rede, TLS ou decodificação do corpo.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// O serviço respondeu com status de erro (auth, quota, ...).
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Resposta sem nenhum candidato de texto.
    #[error("service returned no candidates")]
    EmptyResponse,
}

/// Provedor de geração de texto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    /// OpenAI Chat Completions.
    #[value(alias = "gpt")]
    Openai,
    /// Google Gemini.
    Gemini,
}

impl Provider {
    /// Modelo usado quando `--model` não é informado.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Openai => "gpt-4o",
            Provider::Gemini => "gemini-1.5-pro",
        }
    }

    /// Limite de tokens de saída usado quando `--max-tokens` não é informado.
    pub fn default_max_output_tokens(self) -> u32 {
        match self {
            Provider::Openai => 4096,
            Provider::Gemini => 8192,
        }
    }
}

/// Opções de amostragem enviadas em cada requisição.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOptions {
    /// Identificador do modelo no provedor.
    pub model: String,
    /// Máximo de tokens gerados por resposta.
    pub max_output_tokens: u32,
    /// Temperatura de amostragem.
    pub temperature: f32,
    /// Probabilidade acumulada do nucleus sampling (top-p).
    pub top_p: f32,
}

impl GenerationOptions {
    /// Opções padrão de um provedor (temperatura 1.0, top-p 0.95).
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            model: provider.default_model().to_string(),
            max_output_tokens: provider.default_max_output_tokens(),
            temperature: 1.0,
            top_p: 0.95,
        }
    }
}

/// Serviço capaz de gerar `n` respostas independentes para um prompt.
pub trait TextGenerator {
    /// Gera `n` respostas para o par (prompt de sistema, prompt de usuário).
    fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        n: usize,
    ) -> Result<Vec<String>, LlmError>;
}

/// Cliente concreto escolhido na inicialização.
pub enum LlmClient {
    OpenAi(OpenAiClient),
    Gemini(GeminiClient),
}

impl LlmClient {
    /// Constrói o cliente do provedor lendo a chave da API do ambiente.
    pub fn from_env(provider: Provider, options: GenerationOptions) -> Result<Self, LlmError> {
        tracing::info!(provider = ?provider, model = %options.model, "Configurando provedor LLM");
        match provider {
            Provider::Openai => Ok(LlmClient::OpenAi(OpenAiClient::from_env(options)?)),
            Provider::Gemini => Ok(LlmClient::Gemini(GeminiClient::from_env(options)?)),
        }
    }
}

impl TextGenerator for LlmClient {
    fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        n: usize,
    ) -> Result<Vec<String>, LlmError> {
        match self {
            LlmClient::OpenAi(client) => client.generate(system_prompt, user_prompt, n),
            LlmClient::Gemini(client) => client.generate(system_prompt, user_prompt, n),
        }
    }
}

/// Cliente HTTP bloqueante compartilhado pelos provedores.
///
/// Sem timeout: a chamada bloqueia até o serviço responder ou falhar.
fn http_client() -> Result<reqwest::blocking::Client, LlmError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(None::<std::time::Duration>)
        .build()?;
    Ok(client)
}

/// Converte uma resposta não-2xx em [`LlmError::Status`].
fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(LlmError::Status {
        status: status.as_u16(),
        body,
    })
}
