//! # Statement: Classificação de uma Tradução Candidata
//!
//! Antes de qualquer efeito colateral (escrever no arquivo, recarregar o
//! motor), cada tradução candidata é classificada em uma variante de
//! [`Statement`]. O [`QueryRunner`](crate::inference::runner::QueryRunner) só age
//! depois de saber exatamente o que tem em mãos.
//!
//! | Entrada | Variante |
//! |---------|----------|
//! | `?- parent(tom, X).` | [`Query`](Statement::Query) |
//! | `anc(X,Y) :- parent(X,Y). ?- anc(tom,bob).` | [`RuleWithQuery`](Statement::RuleWithQuery) |
//! | `anc(X,Y) :- parent(X,Y).` | [`RuleOnly`](Statement::RuleOnly) |
//! | `parent(tom, bob).` | [`Invalid`](Statement::Invalid) |
//!
//! A presença de `:-` tem prioridade: uma regra pode carregar uma consulta
//! depois do primeiro `?-`.

use super::rule::Rule;

const QUERY_MARKER: &str = "?-";
const RULE_MARKER: &str = ":-";

/// Tradução candidata já classificada.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    /// Consulta pura; contém o objetivo sem o marcador `?-`.
    Query(String),
    /// Regra nova seguida de uma consulta a executar em seguida.
    RuleWithQuery { rule: Rule, goal: String },
    /// Regra sem consulta anexada.
    RuleOnly(Rule),
    /// Não é nem regra nem consulta reconhecível.
    Invalid,
}

impl Statement {
    /// Classifica o texto de uma tradução candidata.
    pub fn classify(text: &str) -> Self {
        if text.contains(RULE_MARKER) {
            let (rule_part, goal_part) = match text.split_once(QUERY_MARKER) {
                Some((rule, goal)) => (rule, Some(goal)),
                None => (text, None),
            };
            let Some(rule) = Rule::parse(rule_part) else {
                return Statement::Invalid;
            };
            match goal_part.map(strip_query_markers) {
                Some(goal) if !goal.is_empty() => Statement::RuleWithQuery { rule, goal },
                _ => Statement::RuleOnly(rule),
            }
        } else if text.contains(QUERY_MARKER) {
            let goal = strip_query_markers(text);
            if goal.is_empty() {
                Statement::Invalid
            } else {
                Statement::Query(goal)
            }
        } else {
            Statement::Invalid
        }
    }

    /// Regra a aprender, se houver.
    pub fn rule(&self) -> Option<&Rule> {
        match self {
            Statement::RuleWithQuery { rule, .. } | Statement::RuleOnly(rule) => Some(rule),
            _ => None,
        }
    }

    /// Objetivo a executar no motor, se houver.
    pub fn goal(&self) -> Option<&str> {
        match self {
            Statement::Query(goal) | Statement::RuleWithQuery { goal, .. } => Some(goal),
            _ => None,
        }
    }
}

fn strip_query_markers(text: &str) -> String {
    text.replace(QUERY_MARKER, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_query() {
        assert_eq!(
            Statement::classify("?- parent(tom, X)."),
            Statement::Query("parent(tom, X).".into())
        );
    }

    #[test]
    fn rule_with_attached_query() {
        let stmt = Statement::classify("ancestor(X,Y):-parent(X,Y).?-ancestor(tom,bob).");
        let Statement::RuleWithQuery { rule, goal } = stmt else {
            panic!("expected RuleWithQuery");
        };
        assert_eq!(rule.predicate(), "ancestor");
        assert_eq!(rule.text(), "ancestor(X,Y):-parent(X,Y).");
        assert_eq!(goal, "ancestor(tom,bob).");
    }

    #[test]
    fn rule_across_lines() {
        let stmt = Statement::classify(
            "sibling(X, Y) :- parent(Z, X), parent(Z, Y), X \\= Y.\n?- sibling(bob, liz).",
        );
        assert_eq!(stmt.rule().map(Rule::predicate), Some("sibling"));
        assert_eq!(stmt.goal(), Some("sibling(bob, liz)."));
    }

    #[test]
    fn rule_only() {
        let stmt = Statement::classify("ancestor(X,Y) :- parent(X,Y).");
        assert!(matches!(stmt, Statement::RuleOnly(_)));
        assert_eq!(stmt.goal(), None);
    }

    #[test]
    fn rule_with_empty_query_is_rule_only() {
        let stmt = Statement::classify("ancestor(X,Y) :- parent(X,Y). ?-  ");
        assert!(matches!(stmt, Statement::RuleOnly(_)));
    }

    #[test]
    fn bare_fact_is_invalid() {
        assert_eq!(Statement::classify("parent(tom, bob)."), Statement::Invalid);
    }

    #[test]
    fn empty_query_is_invalid() {
        assert_eq!(Statement::classify("?- "), Statement::Invalid);
    }

    #[test]
    fn rule_without_head_is_invalid() {
        assert_eq!(Statement::classify(":- ?- parent(tom, X)."), Statement::Invalid);
    }
}
