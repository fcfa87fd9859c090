//! # Módulo Inference: Execução e Votação
//!
//! Tudo o que acontece **depois** da tradução: cada candidato é executado no
//! motor Prolog e os resultados são apurados por maioria.
//!
//! ## Analogia: O Júri
//!
//! Cada tradução candidata é um **jurado** que chegou ao seu veredito por
//! conta própria. Jurados que erram feio (código inválido, exceção) ainda
//! votam, mas no balde das falhas. O veredito final é o mais repetido.
//!
//! ## Sub-módulos
//!
//! | Módulo | Responsabilidade |
//! |--------|-----------------|
//! | [`engine`] | Fronteira com o motor lógico (Scryer Prolog) |
//! | [`runner`] | Classifica, aprende regras, recarrega e executa |
//! | [`vote`] | Canonicaliza resultados e apura a maioria |
//!
//! ## Exemplo
//!
//! ```text
//! candidatos:  ?- parent(tom, X).   → bob, liz → "bob\nliz"
//!              ?- parent(tom, Y).   → liz, bob → "bob\nliz"
//!              ?- male(tom).        → {}       → "True."
//! veredito:    "bob\nliz" (2 votos)
//! ```

/// Sub-módulo do motor lógico.
pub mod engine;

/// Sub-módulo do executor de candidatos.
pub mod runner;

/// Sub-módulo da votação.
pub mod vote;

pub use engine::{Bindings, EngineError, LogicEngine, ScryerEngine};
pub use vote::Aggregator;
