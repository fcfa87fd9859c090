//! # Rule: Definição de um Predicado
//!
//! Uma [`Rule`] é a unidade de conhecimento do sistema: o texto Prolog
//! completo de um fato (`parent(tom, bob).`) ou de uma regra
//! (`ancestor(X, Y) :- parent(X, Y).`), junto com o **nome do predicado**
//! que ela define.
//!
//! ## Invariantes
//!
//! - O texto sempre termina em ponto final.
//! - O predicado é o identificador antes do primeiro `(` (ou antes de `:-`
//!   para regras sem argumentos), começando com letra minúscula.
//!
//! ## Exemplo de Uso
//!
//! ```text
//! let rule = Rule::parse(":- ancestor(X,Y) :- parent(X,Y)").unwrap();
//! assert_eq!(rule.predicate(), "ancestor");
//! assert_eq!(rule.text(), "ancestor(X,Y) :- parent(X,Y).");
//! ```

use std::fmt;

/// Fato ou regra Prolog com o nome do predicado que define.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Nome do predicado (ex: `parent`).
    predicate: String,
    /// Texto completo, terminado em ponto.
    text: String,
}

impl Rule {
    /// Normaliza um trecho de texto em uma [`Rule`].
    ///
    /// Remove espaços e marcadores `:`/`-` soltos nas extremidades (restos
    /// de `:- ...` ou `... :-`) e restaura o ponto final ausente.
    ///
    /// # Retorno
    ///
    /// - `Some(rule)`: o texto define um predicado com nome válido
    /// - `None`: texto vazio ou sem identificador de predicado reconhecível
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw
            .trim()
            .trim_matches(|c| c == ':' || c == '-')
            .trim();
        if trimmed.is_empty() || trimmed == "." {
            return None;
        }

        let predicate = predicate_name(trimmed)?;
        let mut text = trimmed.to_string();
        if !text.ends_with('.') {
            text.push('.');
        }

        Some(Self {
            predicate: predicate.to_string(),
            text,
        })
    }

    /// Constrói a regra a partir de um trecho já casado no arquivo da KB.
    ///
    /// Usado pela extração de regras únicas, onde o regex garante o formato
    /// `identificador(args) [:- corpo]` sem o ponto final.
    pub(crate) fn from_match(statement: &str) -> Option<Self> {
        let predicate = statement.split('(').next()?.trim();
        if predicate.is_empty() {
            return None;
        }
        Some(Self {
            predicate: predicate.to_string(),
            text: format!("{}.", statement),
        })
    }

    /// Nome do predicado definido.
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// Texto Prolog completo, com ponto final.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `true` se é um fato (sem corpo `:-`).
    pub fn is_fact(&self) -> bool {
        !self.text.contains(":-")
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Extrai o identificador do predicado da cabeça de uma cláusula.
///
/// A cabeça termina no primeiro `(`, no primeiro `:-` ou no ponto final,
/// o que vier antes. O identificador precisa seguir a sintaxe de átomo
/// Prolog: letra minúscula seguida de letras, dígitos ou `_`.
fn predicate_name(clause: &str) -> Option<&str> {
    let end = [clause.find('('), clause.find(":-"), clause.find('.')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(clause.len());
    let head = clause[..end].trim();

    let mut chars = head.chars();
    let first = chars.next()?;
    if !first.is_ascii_lowercase() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(head)
    } else {
        None
    }
}
