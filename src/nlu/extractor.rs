//! # Extrator de Candidatos: Da Resposta Bruta ao Código Prolog
//!
//! O modelo raramente devolve **só** código: costuma envolver a resposta em
//! blocos markdown, explicações ou ambos. O [`CandidateExtractor`] recupera
//! o enunciado Prolog de cada resposta bruta.
//!
//! ## Estratégia (em ordem de prioridade)
//!
//! | Prioridade | Forma | Resultado |
//! |-----------|-------|-----------|
//! | 1 | Bloco cercado ` ```prolog ... ``` ` (ou ` ```pl `) | conteúdo interno, sem espaços nas bordas |
//! | 2 | Trecho `?- ... .` em uma linha | do `?-` até o primeiro ponto |
//! | 3 | Nada reconhecível | `None` |
//!
//! Um bloco cercado sem fechamento vai até o fim da resposta. Um bloco
//! vazio conta como "nada reconhecível".

use regex::Regex;

/// Extrator de enunciados Prolog de respostas do modelo.
///
/// As regexes são compiladas uma única vez e reutilizadas em todas as
/// chamadas a [`extract()`](CandidateExtractor::extract).
pub struct CandidateExtractor {
    /// Bloco markdown marcado como Prolog; captura o conteúdo interno.
    fenced_re: Regex,
    /// Consulta `?-` terminada no primeiro ponto da mesma linha.
    query_re: Regex,
}

impl CandidateExtractor {
    pub fn new() -> Self {
        Self {
            fenced_re: Regex::new(r"(?s)```(?:prolog|pl)\b(.*?)(?:```|\z)").unwrap(),
            query_re: Regex::new(r"\?-[^\n]*?\.").unwrap(),
        }
    }

    /// Extrai o enunciado Prolog de uma resposta bruta.
    ///
    /// # Retorno
    ///
    /// - `Some(enunciado)`: código encontrado por bloco cercado ou por regex
    /// - `None`: nenhuma forma reconhecível
    pub fn extract(&self, raw: &str) -> Option<String> {
        if let Some(caps) = self.fenced_re.captures(raw) {
            let code = caps.get(1).map_or("", |m| m.as_str()).trim();
            return (!code.is_empty()).then(|| code.to_string());
        }

        tracing::info!("Bloco prolog ausente, extraindo consulta por regex");
        self.query_re.find(raw).map(|m| m.as_str().to_string())
    }
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self::new()
    }
}
