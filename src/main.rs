//! # llm-logic: Perguntas em Linguagem Natural sobre uma KB Prolog
//!
//! **Ponto de entrada** do console interativo.
//!
//! Cada pergunta é traduzida para Prolog por um modelo de linguagem em N
//! amostras independentes; cada tradução é executada contra a base de
//! conhecimento e a resposta mais frequente vence (autoconsistência).
//! Regras novas propostas pelo modelo são aprendidas durante a sessão e
//! descartadas ao sair.
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Carrega .env (dotenvy) e faz o parse das flags (clap)
//!   ├── Configura tracing/logging (stderr)
//!   ├── Cria o cliente LLM do provedor escolhido
//!   ├── Abre a sessão: lê kb.pl, extrai regras, carrega o Scryer
//!   ├── Imprime as regras únicas
//!   ├── Instala o handler de Ctrl-C (restaura e sai com 130)
//!   └── REPL (ou --question) até Ctrl-C / Ctrl-D
//!       └── Restaura kb.pl ao snapshot inicial
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! # Sessão interativa com a KB padrão (kb.pl) e OpenAI
//! OPENAI_API_KEY=... cargo run
//!
//! # Uma pergunta só, com Gemini e logs detalhados
//! RUST_LOG=debug GOOGLE_API_KEY=... cargo run -- --provider gemini -q "Who is Bob's father?"
//! ```

/// Módulo `config`: flags de linha de comando.
mod config;

/// Módulo `core`: tipos fundamentais: Rule, RuleStore, Statement.
mod core;

/// Módulo `inference`: motor Prolog, execução de candidatos e votação.
mod inference;

/// Módulo `llm`: clientes dos provedores de geração de texto.
mod llm;

/// Módulo `nlu`: tradução de perguntas em candidatos Prolog.
mod nlu;

/// Módulo `orchestrator`: sessão e ciclo de um turno.
mod orchestrator;

/// Módulo `persistence`: arquivo `.pl` da KB e seu snapshot.
mod persistence;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use crate::config::Cli;
use crate::inference::{LogicEngine, ScryerEngine};
use crate::llm::{LlmClient, TextGenerator};
use crate::nlu::Translator;
use crate::orchestrator::{Orchestrator, SessionContext, Turn};
use crate::persistence::KbFile;

const PROMPT: &str = "Digite uma pergunta em linguagem natural: ";
const SEPARATOR: &str = "-----------------------------------";
/// Código de saída convencional para término por SIGINT.
const SIGINT_EXIT: i32 = 130;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs no stderr; stdout fica só com traduções e respostas.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(kb = %cli.kb.display(), provider = ?cli.provider, "llm-logic iniciando");

    let client = LlmClient::from_env(cli.provider, cli.generation_options())
        .context("Falha ao configurar o provedor LLM")?;
    let session = SessionContext::open(&cli.kb, ScryerEngine::new())?;

    println!("Regras únicas extraídas da base de conhecimento:\n");
    for rule in session.rules().rules() {
        println!("{}", rule);
    }
    println!();
    if session.rules().is_empty() {
        tracing::warn!(kb = %session.kb_path().display(), "Nenhuma regra extraída da KB");
    }

    if !cli.keep_rules {
        restore_on_interrupt(session.kb_file().clone())?;
    }

    let mut orchestrator = Orchestrator::new(Translator::new(client), session, cli.samples());

    let outcome = match &cli.question {
        Some(question) => {
            let turn = orchestrator.process_question(question);
            print_turn(&turn);
            Ok(())
        }
        None => run_repl(&mut orchestrator),
    };

    if cli.keep_rules {
        tracing::info!("Regras aprendidas mantidas no arquivo (--keep-rules)");
    } else {
        orchestrator.restore()?;
    }

    outcome
}

/// Ctrl-C fora do prompt (no meio de um turno) restaura o arquivo e sai.
///
/// No prompt, o rustyline entrega o Ctrl-C como
/// [`ReadlineError::Interrupted`] e o fluxo normal restaura.
fn restore_on_interrupt(kb: KbFile) -> Result<()> {
    ctrlc::set_handler(move || {
        tracing::warn!("Interrompido, restaurando a KB");
        if let Err(e) = kb.restore() {
            tracing::error!(error = ?e, "Falha ao restaurar a KB na interrupção");
        }
        std::process::exit(SIGINT_EXIT);
    })
    .context("Falha ao instalar o handler de Ctrl-C")
}

/// Lê perguntas até Ctrl-C ou Ctrl-D.
fn run_repl<G: TextGenerator, E: LogicEngine>(orchestrator: &mut Orchestrator<G, E>) -> Result<()> {
    let mut rl = DefaultEditor::new().context("Falha ao iniciar o editor de linha")?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(question) {
                    tracing::debug!(error = %e, "Pergunta fora do histórico");
                }

                let turn = orchestrator.process_question(question);
                print_turn(&turn);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nEncerrando sessão.");
                break;
            }
            Err(err) => {
                tracing::error!(error = %err, "Erro ao ler a entrada");
                break;
            }
        }
    }

    tracing::info!(
        kb = %orchestrator.session().kb_path().display(),
        rules = orchestrator.session().rules().len(),
        "Sessão encerrada"
    );
    Ok(())
}

fn print_turn(turn: &Turn) {
    match &turn.translations {
        Some(candidates) => {
            println!("\nTraduções Prolog:\n");
            for (i, candidate) in candidates.iter().enumerate() {
                println!(
                    "Tradução {}: {}",
                    i + 1,
                    candidate.as_deref().unwrap_or("(nenhuma)")
                );
            }
        }
        None => println!("\nFalha ao traduzir a pergunta para Prolog."),
    }

    match &turn.answer {
        Some(answer) => println!("\nResultado:\n\n{}", title_case(answer)),
        None => println!("\nA consulta não retornou resultado."),
    }
    println!("\n{}\n", SEPARATOR);
}

/// Primeira letra de cada palavra em maiúscula, o resto em minúscula.
///
/// Uma "palavra" é qualquer sequência de letras; dígitos, pontuação e
/// quebras de linha separam palavras.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
