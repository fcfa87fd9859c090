//! # Motor Lógico: Scryer Prolog Embutido
//!
//! Fronteira com o motor de inferência. O [`LogicEngine`] expõe só o que a
//! sessão precisa:
//!
//! - `consult(path)`: (re)carrega a KB inteira a partir do arquivo
//! - `query(goal)`: executa um objetivo e materializa **todas** as soluções
//!
//! ## Recarga Autoritativa
//!
//! O [`ScryerEngine`] constrói uma máquina Prolog nova a cada `consult`. A
//! máquina antiga é descartada inteira, então a visão do motor nunca fica
//! parcialmente atualizada: ou é o arquivo antigo, ou o novo.
//!
//! A máquina nova só substitui a antiga depois de duas conferências:
//!
//! 1. o texto do arquivo passa pela [verificação de sintaxe](crate::core::syntax);
//! 2. cada predicado que o texto define responde a `current_predicate/1`
//!    na máquina recém-carregada.
//!
//! Se qualquer uma falhar, o `consult` devolve erro e a máquina anterior
//! continua em uso.
//!
//! ## Objetivos Malformados
//!
//! O leitor de consultas do Scryer entra em pânico com texto que não
//! parseia. Objetivos passam pela mesma verificação de sintaxe antes de
//! chegar à máquina; se ainda assim ela entrar em pânico, o pânico é
//! capturado, a máquina é reconstruída a partir do último programa
//! carregado e a consulta vira [`EngineError::Crashed`].
//!
//! ## Soluções
//!
//! Cada solução vira um [`Bindings`]: pares `(variável, valor)` na ordem em
//! que as variáveis aparecem no objetivo. Uma prova de fato fechado (sem
//! variáveis livres) é um `Bindings` vazio.
//!
//! ```text
//! ?- parent(tom, bob).   →  [{}]
//! ?- parent(tom, X).     →  [{X: bob}, {X: liz}]
//! ?- parent(ann, X).     →  []
//! ```

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use scryer_prolog::{LeafAnswer, Machine, MachineBuilder, Term};
use thiserror::Error;

use crate::core::syntax::{self, SyntaxError};

/// Nome do módulo sob o qual a KB é consultada na máquina.
const KB_MODULE: &str = "kb";

/// Erros do motor lógico.
#[derive(Debug, Error)]
pub enum EngineError {
    /// O arquivo da KB não pôde ser lido para a recarga.
    #[error("failed to read knowledge base {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Texto recusado antes de chegar à máquina.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A recarga terminou sem definir todos os predicados do arquivo.
    #[error("knowledge base {} loaded incompletely, missing one of: {missing}", path.display())]
    Incomplete { path: PathBuf, missing: String },

    /// O Prolog lançou uma exceção (predicado inexistente, tipo errado, ...).
    #[error("prolog exception: {0}")]
    Exception(String),

    /// A máquina entrou em pânico; foi reconstruída e a consulta descartada.
    #[error("prolog machine crashed: {0}")]
    Crashed(String),
}

/// Uma solução de consulta: variáveis livres e seus valores.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings(Vec<(String, String)>);

impl Bindings {
    /// Solução sem variáveis: prova de um fato fechado.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Valor da primeira variável do objetivo.
    pub fn first_value(&self) -> Option<&str> {
        self.0.first().map(|(_, value)| value.as_str())
    }

    /// Valor de uma variável pelo nome.
    #[cfg(test)]
    pub fn get(&self, variable: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, value)| value.as_str())
    }
}

/// Motor de inferência lógica.
pub trait LogicEngine {
    /// Recarrega a KB inteira a partir do arquivo.
    fn consult(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Executa um objetivo e devolve todas as soluções.
    fn query(&mut self, goal: &str) -> Result<Vec<Bindings>, EngineError>;
}

/// Motor baseado em uma máquina Scryer Prolog embutida.
pub struct ScryerEngine {
    machine: Machine,
    /// Último programa carregado com sucesso, para reconstruir a máquina.
    program: String,
}

impl ScryerEngine {
    /// Cria um motor com uma máquina vazia (sem KB).
    pub fn new() -> Self {
        Self {
            machine: MachineBuilder::default().build(),
            program: String::new(),
        }
    }

    fn load(program: &str) -> Machine {
        let mut machine = MachineBuilder::default().build();
        machine.consult_module_string(KB_MODULE, program.to_string());
        machine
    }

    /// Troca a máquina atual por uma recém-carregada com o último programa.
    fn rebuild(&mut self) {
        let broken = std::mem::replace(&mut self.machine, Self::load(&self.program));
        // O estado interno após um pânico não é confiável nem para o drop.
        std::mem::forget(broken);
        tracing::warn!("Máquina Prolog reconstruída após pânico");
    }
}

impl Default for ScryerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicEngine for ScryerEngine {
    fn consult(&mut self, path: &Path) -> Result<(), EngineError> {
        let program = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let heads = syntax::check_program(&program)?;

        let mut machine = Self::load(&program);
        if let Err(missing) = verify_loaded(&mut machine, &heads) {
            std::mem::forget(machine);
            tracing::error!(path = %path.display(), missing = %missing, "Recarga incompleta, máquina anterior mantida");
            return Err(EngineError::Incomplete {
                path: path.to_path_buf(),
                missing,
            });
        }

        self.machine = machine;
        self.program = program;
        tracing::info!(path = %path.display(), predicates = heads.len(), "Motor Prolog recarregado");
        Ok(())
    }

    fn query(&mut self, goal: &str) -> Result<Vec<Bindings>, EngineError> {
        let goal = terminated(goal);
        syntax::check_goal(&goal)?;
        let variables = variable_order(&goal);
        tracing::info!(goal = %goal, "Executando consulta Prolog");

        // O QueryState é consumido aqui; a consulta é liberada antes de
        // qualquer processamento das respostas.
        let machine = &mut self.machine;
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            machine.run_query(goal).collect::<Vec<Result<LeafAnswer, Term>>>()
        }));
        let answers = match run {
            Ok(answers) => answers,
            Err(payload) => {
                let message = panic_message(&*payload);
                tracing::error!(message = %message, "Pânico na máquina Prolog durante a consulta");
                self.rebuild();
                return Err(EngineError::Crashed(message));
            }
        };

        let mut solutions = Vec::new();
        for answer in answers {
            match answer {
                Ok(LeafAnswer::True) => solutions.push(Bindings::empty()),
                Ok(LeafAnswer::False) => {}
                Ok(LeafAnswer::Exception(term)) | Err(term) => {
                    return Err(EngineError::Exception(render_term(&term)));
                }
                Ok(LeafAnswer::LeafAnswer { bindings, .. }) => {
                    solutions.push(ordered_bindings(&variables, bindings));
                }
                #[allow(unreachable_patterns)]
                Ok(other) => {
                    tracing::warn!(answer = ?other, "Resposta Prolog desconhecida ignorada");
                }
            }
        }

        tracing::info!(solutions = solutions.len(), "Consulta Prolog executada");
        Ok(solutions)
    }
}

/// Confere que cada predicado definido pelo programa existe na máquina.
///
/// Devolve, no erro, a lista de indicadores conferidos.
fn verify_loaded(machine: &mut Machine, heads: &[(String, usize)]) -> Result<(), String> {
    if heads.is_empty() {
        return Ok(());
    }
    let indicators: Vec<String> = heads
        .iter()
        .map(|(name, arity)| format!("'{}'/{}", name, arity))
        .collect();
    let check = indicators
        .iter()
        .map(|indicator| format!("current_predicate({})", indicator))
        .collect::<Vec<_>>()
        .join(", ");

    let run = panic::catch_unwind(AssertUnwindSafe(|| {
        machine.run_query(format!("{}.", check)).collect::<Vec<_>>()
    }));
    let defined = match run {
        Ok(answers) => answers
            .iter()
            .any(|answer| matches!(answer, Ok(LeafAnswer::True) | Ok(LeafAnswer::LeafAnswer { .. }))),
        Err(_) => false,
    };

    if defined {
        Ok(())
    } else {
        Err(indicators.join(", "))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Garante o ponto final exigido pelo leitor Prolog.
fn terminated(goal: &str) -> String {
    let goal = goal.trim();
    if goal.ends_with('.') {
        goal.to_string()
    } else {
        format!("{}.", goal)
    }
}

/// Variáveis nomeadas do objetivo, na ordem da primeira aparição.
///
/// Ignora trechos entre aspas e a variável anônima `_`.
fn variable_order(goal: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    let mut chars = goal.chars().peekable();
    let mut prev_is_word = false;

    while let Some(c) = chars.next() {
        if c == '\'' || c == '"' || c == '`' {
            for q in chars.by_ref() {
                if q == c {
                    break;
                }
            }
            prev_is_word = false;
            continue;
        }

        let starts_variable = !prev_is_word && (c.is_ascii_uppercase() || c == '_');
        if starts_variable {
            let mut name = String::from(c);
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if name != "_" && !variables.contains(&name) {
                variables.push(name);
            }
            prev_is_word = true;
            continue;
        }

        prev_is_word = c.is_alphanumeric() || c == '_';
    }

    variables
}

/// Ordena as ligações de uma solução pela ordem das variáveis no objetivo.
///
/// Variáveis que o objetivo não revela (raro) vão ao fim, em ordem alfabética.
fn ordered_bindings(variables: &[String], mut bindings: BTreeMap<String, Term>) -> Bindings {
    let mut pairs = Vec::with_capacity(bindings.len());
    for name in variables {
        if let Some(term) = bindings.remove(name) {
            pairs.push((name.clone(), render_term(&term)));
        }
    }
    for (name, term) in bindings {
        pairs.push((name, render_term(&term)));
    }
    Bindings::new(pairs)
}

/// Representação textual de um termo Prolog.
fn render_term(term: &Term) -> String {
    match term {
        Term::Atom(atom) => atom.clone(),
        Term::String(text) => text.clone(),
        Term::Integer(n) => n.to_string(),
        Term::Float(f) => f.to_string(),
        Term::List(items) => {
            let items: Vec<String> = items.iter().map(render_term).collect();
            format!("[{}]", items.join(", "))
        }
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminated_adds_period_once() {
        assert_eq!(terminated(" parent(tom, X) "), "parent(tom, X).");
        assert_eq!(terminated("parent(tom, X)."), "parent(tom, X).");
    }

    #[test]
    fn variables_in_order_of_appearance() {
        assert_eq!(
            variable_order("parent(Who, bob), age(Who, Age), Age > 30."),
            vec!["Who".to_string(), "Age".to_string()]
        );
    }

    #[test]
    fn variables_skip_quotes_and_anonymous() {
        assert_eq!(
            variable_order("name(X, 'Bob Smith'), likes(_, \"Wine\"), _Hidden = X."),
            vec!["X".to_string(), "_Hidden".to_string()]
        );
    }

    #[test]
    fn variables_ignore_uppercase_inside_atoms() {
        assert_eq!(variable_order("fooBar(x, Y)."), vec!["Y".to_string()]);
    }

    #[test]
    fn bindings_accessors() {
        let b = Bindings::new(vec![("X".into(), "bob".into()), ("Y".into(), "ann".into())]);
        assert_eq!(b.first_value(), Some("bob"));
        assert_eq!(b.get("Y"), Some("ann"));
        assert_eq!(b.get("Z"), None);
        assert!(Bindings::empty().is_empty());
    }

    // ─── Scryer ─────────────────────────────────────────────────

    fn engine_with(kb: &str) -> (tempfile::TempDir, PathBuf, ScryerEngine) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.pl");
        std::fs::write(&path, kb).unwrap();
        let mut engine = ScryerEngine::new();
        engine.consult(&path).unwrap();
        (dir, path, engine)
    }

    #[test]
    fn ground_fact_is_single_empty_binding() {
        let (_dir, _path, mut engine) = engine_with("parent(tom, bob).\n");
        let solutions = engine.query("parent(tom, bob).").unwrap();
        assert_eq!(solutions, vec![Bindings::empty()]);
    }

    #[test]
    fn free_variable_is_bound() {
        let (_dir, _path, mut engine) = engine_with("parent(tom, bob).\n");
        let solutions = engine.query("parent(tom, X)").unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].get("X"), Some("bob"));
    }

    #[test]
    fn no_solutions_is_empty() {
        let (_dir, _path, mut engine) = engine_with("parent(tom, bob).\n");
        assert!(engine.query("parent(bob, X).").unwrap().is_empty());
    }

    #[test]
    fn undefined_predicate_is_an_error() {
        let (_dir, _path, mut engine) = engine_with("parent(tom, bob).\n");
        assert!(engine.query("grandparent(tom, X).").is_err());
    }

    #[test]
    fn consult_replaces_previous_program() {
        let (_dir, path, mut engine) = engine_with("parent(tom, bob).\n");
        std::fs::write(&path, "parent(tom, liz).\n").unwrap();
        engine.consult(&path).unwrap();
        let solutions = engine.query("parent(tom, X).").unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].first_value(), Some("liz"));
    }

    #[test]
    fn unparsable_goal_is_an_error_not_a_panic() {
        let (_dir, _path, mut engine) = engine_with("parent(tom, bob).\n");
        let err = engine.query("parent(tom, X.").unwrap_err();
        assert!(matches!(err, EngineError::Syntax(_)));

        // A máquina segue utilizável.
        assert_eq!(engine.query("parent(tom, bob).").unwrap(), vec![Bindings::empty()]);
    }

    #[test]
    fn goal_the_reader_rejects_leaves_machine_usable() {
        let (_dir, _path, mut engine) = engine_with("parent(tom, bob).\n");
        // Passa pela verificação leve, mas `:-` não é associativo.
        let err = engine.query("X = (a :- b :- c).").unwrap_err();
        assert!(matches!(err, EngineError::Crashed(_) | EngineError::Exception(_)));
        assert_eq!(engine.query("parent(tom, bob).").unwrap(), vec![Bindings::empty()]);
    }

    #[test]
    fn malformed_program_keeps_previous_machine() {
        let (_dir, path, mut engine) = engine_with("parent(tom, bob).\n");
        std::fs::write(&path, "parent(tom, bob).\nfoo(X) :- bar(X, .\n").unwrap();

        let err = engine.consult(&path).unwrap_err();
        assert!(matches!(err, EngineError::Syntax(_)));
        assert_eq!(engine.query("parent(tom, bob).").unwrap(), vec![Bindings::empty()]);
    }

    #[test]
    fn reload_is_checked_for_every_defined_predicate() {
        let (_dir, path, mut engine) = engine_with("parent(tom, bob).\n");
        std::fs::write(&path, "parent(tom, bob).\nmale(tom).\nready.\n").unwrap();
        engine.consult(&path).unwrap();
        assert_eq!(engine.query("male(tom), ready.").unwrap(), vec![Bindings::empty()]);
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("Failed to parse query");
        assert_eq!(panic_message(&*payload), "Failed to parse query");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("boom"));
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(42);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }

    #[test]
    fn consult_missing_file_is_io_error() {
        let mut engine = ScryerEngine::new();
        let err = engine.consult(Path::new("/nonexistent/kb.pl")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
