//! # QueryRunner: Execução de Um Enunciado Candidato
//!
//! Recebe um candidato já extraído (ou `None`) e o executa contra a sessão.
//! A classificação acontece **antes** de qualquer efeito colateral:
//!
//! ```text
//! enunciado
//!   ├── Invalid            → None
//!   ├── Query(goal)        → executa goal
//!   ├── RuleWithQuery      → aprende a regra → executa goal
//!   └── RuleOnly           → aprende a regra → [Bindings::empty()]
//! ```
//!
//! Aprender uma regra nova significa: verificar a sintaxe, anexar ao
//! arquivo, recarregar o motor a partir do arquivo e registrar no
//! [`RuleStore`](crate::core::RuleStore). Regras de predicados já conhecidos
//! não escrevem nada; regras malformadas também não, e a consulta que as
//! acompanha não roda.
//!
//! Nenhum erro sai daqui: tudo vira log + `None`.

use crate::core::{Rule, Statement};
use crate::orchestrator::SessionContext;

use super::engine::{Bindings, LogicEngine};

/// Executor de enunciados Prolog candidatos.
pub struct QueryRunner;

impl QueryRunner {
    /// Executa um enunciado candidato.
    ///
    /// # Retorno
    ///
    /// - `Some(soluções)`: a consulta rodou (vetor vazio = sem soluções)
    /// - `Some([Bindings::empty()])`: só havia regra, nenhuma consulta
    /// - `None`: candidato ausente, inválido, ou erro do motor
    pub fn run<E: LogicEngine>(
        ctx: &mut SessionContext<E>,
        statement: Option<&str>,
    ) -> Option<Vec<Bindings>> {
        let Some(text) = statement else {
            tracing::error!("Nenhum enunciado Prolog para executar");
            return None;
        };
        tracing::info!(statement = %text, "Executando enunciado Prolog");

        let statement = Statement::classify(text);
        tracing::debug!(
            rule = ?statement.rule().map(Rule::predicate),
            goal = ?statement.goal(),
            "Enunciado classificado"
        );

        match statement {
            Statement::Invalid => {
                tracing::error!(statement = %text, "Enunciado Prolog inválido");
                None
            }
            Statement::Query(goal) => Self::execute(ctx, &goal),
            Statement::RuleWithQuery { rule, goal } => {
                Self::learn(ctx, rule)?;
                Self::execute(ctx, &goal)
            }
            Statement::RuleOnly(rule) => {
                Self::learn(ctx, rule)?;
                tracing::error!("Nenhuma consulta fornecida junto da regra");
                Some(vec![Bindings::empty()])
            }
        }
    }

    fn learn<E: LogicEngine>(ctx: &mut SessionContext<E>, rule: Rule) -> Option<()> {
        match ctx.learn_rule(rule) {
            Ok(_) => Some(()),
            Err(e) => {
                tracing::error!(error = ?e, "Falha ao aprender regra");
                None
            }
        }
    }

    fn execute<E: LogicEngine>(ctx: &mut SessionContext<E>, goal: &str) -> Option<Vec<Bindings>> {
        match ctx.query(goal) {
            Ok(solutions) => {
                tracing::info!(goal = %goal, solutions = ?solutions, "Resultado da consulta");
                Some(solutions)
            }
            Err(e) => {
                tracing::error!(goal = %goal, error = %e, "Erro ao executar consulta Prolog");
                None
            }
        }
    }
}
