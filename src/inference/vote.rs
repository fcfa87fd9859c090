//! # Votação: Autoconsistência por Maioria
//!
//! Cada tradução candidata é executada e o resultado é reduzido a uma
//! **resposta canônica** (uma string). Candidatos que chegam à mesma
//! resposta votam juntos; a mais votada vence.
//!
//! ## Canonicalização
//!
//! | Resultado da execução | Resposta canônica |
//! |-----------------------|-------------------|
//! | `None` (falha) | `None`: balde de falhas |
//! | `[]` (sem soluções) | `"False."` |
//! | alguma solução sem variáveis | `"True."` |
//! | soluções com variáveis | valores distintos da 1ª variável, ordenados, um por linha |
//!
//! A ordenação torna a resposta independente da ordem das soluções:
//! `[{X: liz}, {X: bob}]` e `[{X: bob}, {X: liz}]` votam juntos.
//!
//! ## Apuração
//!
//! - Falhas **contam** como voto (o balde `None` pode vencer).
//! - Empates ficam com a resposta vista primeiro.

use std::collections::BTreeSet;
use std::fmt;

use crate::orchestrator::SessionContext;

use super::engine::{Bindings, LogicEngine};
use super::runner::QueryRunner;

/// Resposta canônica de uma prova sem variáveis.
pub const TRUE_ANSWER: &str = "True.";
/// Resposta canônica de uma consulta sem soluções.
pub const FALSE_ANSWER: &str = "False.";

/// Reduz o resultado de uma execução à resposta canônica.
pub fn canonicalize(result: Option<&[Bindings]>) -> Option<String> {
    let solutions = result?;
    if solutions.is_empty() {
        return Some(FALSE_ANSWER.to_string());
    }
    if solutions.iter().any(Bindings::is_empty) {
        return Some(TRUE_ANSWER.to_string());
    }

    let values: BTreeSet<&str> = solutions.iter().filter_map(Bindings::first_value).collect();
    Some(values.into_iter().collect::<Vec<_>>().join("\n"))
}

/// Contagem de votos por resposta canônica, em ordem de primeira aparição.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: Vec<(Option<String>, usize)>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um voto.
    pub fn record(&mut self, answer: Option<String>) {
        match self.counts.iter_mut().find(|(seen, _)| *seen == answer) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((answer, 1)),
        }
    }

    /// Votos recebidos por uma resposta (`None` = balde de falhas).
    #[cfg(test)]
    pub fn count(&self, answer: Option<&str>) -> usize {
        self.counts
            .iter()
            .find(|(seen, _)| seen.as_deref() == answer)
            .map_or(0, |(_, count)| *count)
    }

    /// Resposta mais votada; empates ficam com a primeira vista.
    ///
    /// `None` externo = nenhum voto; `Some(None)` = a falha venceu.
    pub fn winner(&self) -> Option<&Option<String>> {
        let mut best: Option<&(Option<String>, usize)> = None;
        for entry in &self.counts {
            if best.map_or(true, |(_, top)| entry.1 > *top) {
                best = Some(entry);
            }
        }
        best.map(|(answer, _)| answer)
    }
}

impl fmt::Display for VoteTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .counts
            .iter()
            .map(|(answer, count)| match answer {
                Some(answer) => format!("{:?}: {}", answer, count),
                None => format!("None: {}", count),
            })
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

/// Agregador dos resultados dos candidatos.
pub struct Aggregator;

impl Aggregator {
    /// Executa cada candidato, em ordem, e apura os votos.
    pub fn tally<E: LogicEngine>(
        ctx: &mut SessionContext<E>,
        candidates: &[Option<String>],
    ) -> VoteTally {
        let mut tally = VoteTally::new();
        for (index, candidate) in candidates.iter().enumerate() {
            let result = QueryRunner::run(ctx, candidate.as_deref());
            let answer = canonicalize(result.as_deref());
            tracing::info!(index, candidate = ?candidate, answer = ?answer, "Voto do candidato");
            tally.record(answer);
        }
        tracing::info!(tally = %tally, "Contagem de resultados");
        tally
    }

    /// Resposta vencedora da votação (`None` se a falha vencer ou não
    /// houver candidatos).
    pub fn vote<E: LogicEngine>(
        ctx: &mut SessionContext<E>,
        candidates: &[Option<String>],
    ) -> Option<String> {
        Self::tally(ctx, candidates).winner().cloned().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::testing::{session_with, FakeEngine};

    fn x(values: &[&str]) -> Vec<Bindings> {
        values
            .iter()
            .map(|v| Bindings::new(vec![("X".into(), v.to_string())]))
            .collect()
    }

    #[test]
    fn canonical_forms() {
        let ground = vec![Bindings::empty()];
        assert_eq!(canonicalize(None), None);
        assert_eq!(canonicalize(Some(x(&[]).as_slice())).as_deref(), Some("False."));
        assert_eq!(canonicalize(Some(ground.as_slice())).as_deref(), Some("True."));
        assert_eq!(canonicalize(Some(x(&["bob"]).as_slice())).as_deref(), Some("bob"));
    }

    #[test]
    fn canonical_answer_ignores_solution_order() {
        let a = canonicalize(Some(x(&["liz", "bob"]).as_slice()));
        let b = canonicalize(Some(x(&["bob", "liz", "bob"]).as_slice()));
        assert_eq!(a, b);
        assert_eq!(a.as_deref(), Some("bob\nliz"));
    }

    #[test]
    fn canonical_answer_uses_first_variable() {
        let solutions = vec![Bindings::new(vec![
            ("Who".into(), "tom".into()),
            ("Age".into(), "52".into()),
        ])];
        assert_eq!(canonicalize(Some(solutions.as_slice())).as_deref(), Some("tom"));
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let mut tally = VoteTally::new();
        tally.record(Some("bob".into()));
        tally.record(Some("liz".into()));
        tally.record(Some("liz".into()));
        tally.record(Some("bob".into()));
        assert_eq!(tally.winner(), Some(&Some("bob".to_string())));
    }

    #[test]
    fn failures_are_counted_and_can_win() {
        let mut tally = VoteTally::new();
        tally.record(None);
        tally.record(Some("True.".into()));
        tally.record(None);
        assert_eq!(tally.count(None), 2);
        assert_eq!(tally.count(Some("True.")), 1);
        assert_eq!(tally.winner(), Some(&None));
    }

    #[test]
    fn empty_tally_has_no_winner() {
        assert_eq!(VoteTally::new().winner(), None);
    }

    #[test]
    fn display_lists_counts_in_order() {
        let mut tally = VoteTally::new();
        tally.record(Some("bob".into()));
        tally.record(None);
        assert_eq!(tally.to_string(), r#"{"bob": 1, None: 1}"#);
    }

    #[test]
    fn majority_answer_wins() {
        let (_dir, mut ctx) = session_with("parent(tom, bob).\nmale(tom).\n", family_engine());

        let candidates = vec![
            Some("?- parent(tom, X).".to_string()),
            Some("?- male(tom).".to_string()),
            None,
            Some("?- parent(tom, Y).".to_string()),
        ];
        assert_eq!(
            Aggregator::vote(&mut ctx, &candidates).as_deref(),
            Some("bob\nliz")
        );
    }

    /// Todas as ordenações dos índices `0..n`.
    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![Vec::new()];
        }
        let mut out = Vec::new();
        for rest in permutations(n - 1) {
            for slot in 0..=rest.len() {
                let mut order = rest.clone();
                order.insert(slot, n - 1);
                out.push(order);
            }
        }
        out
    }

    fn family_engine() -> FakeEngine {
        FakeEngine::answering(vec![])
            .with("parent(tom, X).", Some(x(&["bob", "liz"])))
            .with("parent(tom, Y).", Some(x(&["liz", "bob"])))
            .with("male(tom).", Some(vec![Bindings::empty()]))
    }

    #[test]
    fn clear_majority_ignores_candidate_order() {
        let (_dir, mut ctx) = session_with("parent(tom, bob).\nmale(tom).\n", family_engine());
        // "bob\nliz": 3 votos, "True.": 1, falha: 1
        let candidates = [
            Some("?- parent(tom, X)."),
            Some("?- male(tom)."),
            None,
            Some("?- parent(tom, Y)."),
            Some("?- parent(tom, X)."),
        ];

        let orders = permutations(candidates.len());
        assert_eq!(orders.len(), 120);
        for order in orders {
            let shuffled: Vec<Option<String>> = order
                .iter()
                .map(|&i| candidates[i].map(str::to_string))
                .collect();
            assert_eq!(
                Aggregator::vote(&mut ctx, &shuffled).as_deref(),
                Some("bob\nliz"),
                "ordem {:?}",
                order
            );
        }
    }

    #[test]
    fn genuine_tie_follows_candidate_order() {
        let (_dir, mut ctx) = session_with("parent(tom, bob).\nmale(tom).\n", family_engine());
        let male_first = vec![
            Some("?- male(tom).".to_string()),
            Some("?- parent(tom, X).".to_string()),
        ];
        let parent_first: Vec<Option<String>> = male_first.iter().rev().cloned().collect();

        assert_eq!(Aggregator::vote(&mut ctx, &male_first).as_deref(), Some("True."));
        assert_eq!(
            Aggregator::vote(&mut ctx, &parent_first).as_deref(),
            Some("bob\nliz")
        );
    }

    #[test]
    fn all_failures_yield_none() {
        let (_dir, mut ctx) = session_with("parent(tom, bob).\n", FakeEngine::failing());
        let candidates = vec![
            None,
            Some("?- parent(tom, X).".to_string()),
            Some("nonsense".to_string()),
        ];
        assert_eq!(Aggregator::vote(&mut ctx, &candidates), None);
    }

    #[test]
    fn no_candidates_yield_none() {
        let (_dir, mut ctx) = session_with("parent(tom, bob).\n", FakeEngine::answering(vec![]));
        assert_eq!(Aggregator::vote(&mut ctx, &[]), None);
    }
}
