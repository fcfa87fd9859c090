//! # Tradução: Linguagem Natural para Prolog
//!
//! O [`Translator`] transforma uma pergunta em linguagem natural em **N
//! traduções candidatas** independentes, prontas para a votação.
//!
//! ## Fluxo de Processamento
//!
//! ```text
//! Pergunta do usuário
//!   ├── 1. NFC normalize (Unicode) + trim
//!   ├── 2. Prompt de sistema com todas as regras do RuleStore
//!   ├── 3. N completions independentes (TextGenerator)
//!   └── 4. Para cada completion:
//!       ├── bloco ```prolog → conteúdo
//!       ├── senão, regex "?- ... ." → primeira ocorrência
//!       └── senão → None
//! ```
//!
//! ## Falhas
//!
//! Qualquer erro do serviço de geração é logado e **engolido**:
//! [`translate()`](Translator::translate) devolve `None` e quem chama trata
//! como "tradução indisponível". Candidatos individuais sem código
//! reconhecível viram `None` dentro do vetor e seguem para a votação.
//!
//! ## Sub-módulos
//!
//! | Módulo | Responsabilidade |
//! |--------|-----------------|
//! | [`extractor`] | Recupera o código Prolog de cada resposta bruta |
//! | [`prompt`] | Monta os prompts de sistema e de usuário |

/// Sub-módulo do extrator de candidatos.
pub mod extractor;

/// Sub-módulo dos prompts.
pub mod prompt;

use unicode_normalization::UnicodeNormalization;

use crate::core::RuleStore;
use crate::llm::TextGenerator;

use extractor::CandidateExtractor;

/// Tradutor de perguntas em candidatos Prolog.
///
/// Genérico sobre o [`TextGenerator`]: o provedor concreto é escolhido na
/// inicialização, e os testes usam geradores roteirizados.
pub struct Translator<G> {
    /// Serviço de geração de texto.
    generator: G,
    /// Extrator de código das respostas brutas.
    extractor: CandidateExtractor,
}

impl<G: TextGenerator> Translator<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            extractor: CandidateExtractor::new(),
        }
    }

    /// Traduz uma pergunta em até `n` candidatos.
    ///
    /// # Parâmetros
    ///
    /// - `question`: pergunta em linguagem natural
    /// - `rules`: regras conhecidas, embutidas no prompt de sistema
    /// - `n`: número de amostras independentes
    ///
    /// # Retorno
    ///
    /// - `Some(candidatos)`: um item por resposta, `None` onde nada foi extraído
    /// - `None`: o serviço falhou ou não devolveu nenhuma resposta
    pub fn translate(
        &self,
        question: &str,
        rules: &RuleStore,
        n: usize,
    ) -> Option<Vec<Option<String>>> {
        let question: String = question.nfc().collect();
        let question = question.trim();
        tracing::info!(question = %question, n, "Solicitando tradução");

        let system = prompt::system_prompt(rules);
        let user = prompt::user_prompt(question);

        let completions = match self.generator.generate(&system, &user, n) {
            Ok(completions) => completions,
            Err(e) => {
                tracing::error!(error = %e, "Falha no serviço de geração");
                return None;
            }
        };
        if completions.is_empty() {
            tracing::error!("Serviço de geração não devolveu respostas");
            return None;
        }

        let candidates = completions
            .iter()
            .map(|raw| {
                tracing::info!(raw = %raw, "Tradução candidata");
                let candidate = self.extractor.extract(raw);
                tracing::info!(processed = ?candidate, "Tradução processada");
                candidate
            })
            .collect();

        Some(candidates)
    }
}
