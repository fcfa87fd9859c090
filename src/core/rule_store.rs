//! # RuleStore: Registro de Predicados Conhecidos
//!
//! O [`RuleStore`] guarda, em memória, **uma regra por predicado** extraída
//! do arquivo da base de conhecimento. Essas regras servem de contexto para
//! o modelo de linguagem (o prompt lista todas elas) e decidem se uma regra
//! proposta pelo modelo é nova ou não.
//!
//! ## Extração
//!
//! ```text
//! kb.pl                                   RuleStore
//! ─────────────────────────────────────   ─────────────────────────
//! parent(tom, bob).                   →   parent(tom, bob).
//! parent(bob, ann).                       (descartado: parent já visto)
//! male(tom).                          →   male(tom).
//! grand(X, Z) :- parent(X, Y), ...    →   grand(X, Z) :- parent(X, Y), ...
//! f(g(x)).                                (ignorado: parênteses aninhados)
//! ```
//!
//! O scanner é orientado a linhas: uma cláusula cujo corpo quebra linha não
//! é reconhecida, e linhas malformadas são ignoradas silenciosamente.
//!
//! ## Invariantes
//!
//! - No máximo uma regra por predicado: a primeira vista vence.
//! - A ordem é a ordem de primeira aparição no texto.
//! - Regras só são adicionadas, nunca removidas.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::rule::Rule;

/// Padrão de uma cláusula: `identificador(args)` opcionalmente seguido de
/// `:- corpo`, terminada em ponto, sem atravessar quebras de linha.
static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-z][A-Za-z0-9_]*\([^)\n]*\)(?:[ \t]*:-[^.\n]*)?)\.")
        .expect("regex de cláusula inválida")
});

/// Extrai as regras/fatos únicos (um por predicado) do texto de uma KB.
///
/// # Exemplo
///
/// ```text
/// let rules = extract_unique_rules("parent(tom, bob).\nparent(bob, ann).");
/// assert_eq!(rules.len(), 1);
/// assert_eq!(rules[0].text(), "parent(tom, bob).");
/// ```
pub fn extract_unique_rules(source: &str) -> Vec<Rule> {
    let mut seen = HashSet::new();
    let mut rules = Vec::new();

    for caps in CLAUSE_RE.captures_iter(source) {
        let Some(rule) = Rule::from_match(&caps[1]) else {
            continue;
        };
        if seen.insert(rule.predicate().to_string()) {
            rules.push(rule);
        }
    }

    rules
}

/// Registro ordenado das regras conhecidas, indexado por predicado.
#[derive(Clone, Debug, Default)]
pub struct RuleStore {
    /// Regras em ordem de primeira aparição.
    rules: Vec<Rule>,
    /// Índice de predicados já registrados.
    predicates: HashSet<String>,
}

impl RuleStore {
    /// Cria um registro vazio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrói o registro a partir do texto completo de um arquivo `.pl`.
    pub fn from_source(source: &str) -> Self {
        let mut store = Self::new();
        for rule in extract_unique_rules(source) {
            store.insert(rule);
        }
        tracing::debug!(rules = store.len(), "RuleStore: regras extraídas da KB");
        store
    }

    /// `true` se o predicado já tem uma regra registrada.
    pub fn contains(&self, predicate: &str) -> bool {
        self.predicates.contains(predicate)
    }

    /// Registra uma regra se o predicado ainda não é conhecido.
    ///
    /// Retorna `false` (sem alterar nada) quando o predicado já existe.
    pub fn insert(&mut self, rule: Rule) -> bool {
        if !self.predicates.insert(rule.predicate().to_string()) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    /// Regras na ordem de registro.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Texto das regras, uma por linha: o contexto enviado ao modelo.
    pub fn prompt_context(&self) -> String {
        self.rules
            .iter()
            .map(Rule::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(rules: &[Rule]) -> Vec<&str> {
        rules.iter().map(Rule::text).collect()
    }

    #[test]
    fn single_fact() {
        let rules = extract_unique_rules("parent(tom, bob).");
        assert_eq!(texts(&rules), vec!["parent(tom, bob)."]);
    }

    #[test]
    fn first_occurrence_wins() {
        let kb = "parent(tom, bob).\nmale(tom).\nparent(bob, ann).\nmale(bob).\n";
        let rules = extract_unique_rules(kb);
        assert_eq!(texts(&rules), vec!["parent(tom, bob).", "male(tom)."]);
    }

    #[test]
    fn keeps_rules_with_bodies() {
        let kb = "parent(tom, bob).\ngrandparent(X, Z) :- parent(X, Y), parent(Y, Z).\n";
        let rules = extract_unique_rules(kb);
        assert_eq!(
            texts(&rules),
            vec![
                "parent(tom, bob).",
                "grandparent(X, Z) :- parent(X, Y), parent(Y, Z)."
            ]
        );
        assert_eq!(rules[1].predicate(), "grandparent");
    }

    #[test]
    fn accepts_underscored_predicates() {
        let rules = extract_unique_rules("parent_of(tom, bob).");
        assert_eq!(rules[0].predicate(), "parent_of");
    }

    #[test]
    fn skips_nested_and_malformed_lines() {
        let kb = "f(g(x)).\nthis is not prolog\nBad(x).\nlikes(mary, wine).\n";
        let rules = extract_unique_rules(kb);
        assert_eq!(texts(&rules), vec!["likes(mary, wine)."]);
    }

    #[test]
    fn multiline_bodies_are_not_matched() {
        let kb = "ancestor(X, Y) :-\n    parent(X, Y), male(X).\nfemale(ann).\n";
        let store = RuleStore::from_source(kb);
        assert!(!store.contains("ancestor"));
        assert!(store.contains("female"));
        assert!(store.rules().iter().all(|r| r.is_fact()));
    }

    #[test]
    fn at_most_one_rule_per_predicate() {
        let kb = "a(1).\nb(1).\na(2).\nc(X) :- a(X).\nb(2).\nc(X) :- b(X).\n";
        let rules = extract_unique_rules(kb);
        let mut predicates: Vec<&str> = rules.iter().map(Rule::predicate).collect();
        assert_eq!(predicates, vec!["a", "b", "c"]);
        predicates.dedup();
        assert_eq!(predicates.len(), rules.len());
    }

    #[test]
    fn store_rejects_known_predicate() {
        let mut store = RuleStore::from_source("parent(tom, bob).");
        assert!(store.contains("parent"));
        assert!(!store.insert(Rule::parse("parent(X, Y) :- father(X, Y)").unwrap()));
        assert!(store.insert(Rule::parse("ancestor(X, Y) :- parent(X, Y)").unwrap()));
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.prompt_context(),
            "parent(tom, bob).\nancestor(X, Y) :- parent(X, Y)."
        );
    }

    #[test]
    fn empty_source() {
        let store = RuleStore::from_source("");
        assert!(store.is_empty());
        assert_eq!(store.prompt_context(), "");
    }
}
