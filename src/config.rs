//! Configuração de linha de comando.
//!
//! Cada flag tem um fallback de ambiente onde faz sentido; o `.env` do
//! diretório atual é carregado antes do parse.

use std::path::PathBuf;

use clap::Parser;

use crate::llm::{GenerationOptions, Provider};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Responde perguntas em linguagem natural traduzindo-as para Prolog e votando entre as traduções",
    long_about = None
)]
pub struct Cli {
    /// Arquivo Prolog da base de conhecimento
    #[arg(long, env = "LLM_LOGIC_KB", default_value = "kb.pl")]
    pub kb: PathBuf,

    /// Provedor do modelo de linguagem
    #[arg(long, value_enum, env = "LLM_LOGIC_PROVIDER", default_value_t = Provider::Openai)]
    pub provider: Provider,

    /// Modelo do provedor (padrão: gpt-4o / gemini-1.5-pro)
    #[arg(long, env = "LLM_LOGIC_MODEL")]
    pub model: Option<String>,

    /// Traduções candidatas por pergunta
    #[arg(short = 'n', long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub samples: u32,

    /// Máximo de tokens por resposta (padrão: 4096 / 8192)
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperatura de amostragem
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f32,

    /// Nucleus sampling (top-p)
    #[arg(long, default_value_t = 0.95)]
    pub top_p: f32,

    /// Responde uma única pergunta e sai, sem o prompt interativo
    #[arg(short, long)]
    pub question: Option<String>,

    /// Mantém no arquivo as regras aprendidas ao sair
    #[arg(long)]
    pub keep_rules: bool,
}

impl Cli {
    /// Opções de geração: padrões do provedor sobrescritos pelas flags.
    pub fn generation_options(&self) -> GenerationOptions {
        let mut options = GenerationOptions::for_provider(self.provider);
        if let Some(model) = &self.model {
            options.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            options.max_output_tokens = max_tokens;
        }
        options.temperature = self.temperature;
        options.top_p = self.top_p;
        options
    }

    pub fn samples(&self) -> usize {
        self.samples as usize
    }
}
