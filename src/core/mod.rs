//! # Módulo Core: Tipos Fundamentais do Domínio
//!
//! Tipos que todo o resto do sistema manipula:
//!
//! - [`Rule`]: fato ou regra Prolog com o nome do predicado que define
//! - [`RuleStore`]: registro de uma regra por predicado, extraído da KB
//! - [`Statement`]: tradução candidata classificada (consulta, regra, inválida)
//! - [`syntax`]: verificação leve do texto Prolog antes de tocar o motor
//!
//! ## Analogia com o Mundo Real
//!
//! Pense no [`RuleStore`] como o **índice de um livro de leis**: cada
//! predicado tem um verbete, o primeiro que aparece. O modelo de linguagem
//! lê o índice para saber com que vocabulário pode formular perguntas; quando
//! propõe um verbete novo, ele é anexado ao livro (o arquivo `.pl`).

/// Sub-módulo com a implementação de [`Rule`].
pub mod rule;

/// Sub-módulo com o [`RuleStore`] e a extração de regras únicas.
pub mod rule_store;

/// Sub-módulo com a classificação de [`Statement`]s.
pub mod statement;

/// Sub-módulo com a verificação de sintaxe de cláusulas e objetivos.
pub mod syntax;

pub use rule::Rule;
pub use rule_store::RuleStore;
pub use statement::Statement;
