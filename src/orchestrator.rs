//! # Orquestrador: Da Pergunta ao Veredito
//!
//! O [`Orchestrator`] conduz um **turno** completo: uma pergunta em
//! linguagem natural entra, um [`Turn`] com as traduções e a resposta
//! votada sai.
//!
//! ## O Ciclo de Um Turno
//!
//! ```text
//! Pergunta do Usuário
//!   │
//!   ├── 1. TRADUÇÃO (Translator)
//!   │   └── N amostras do modelo → N candidatos (ou None)
//!   │
//!   ├── 2. EXECUÇÃO (QueryRunner, um por candidato)
//!   │   └── regras novas → arquivo + RuleStore + recarga do motor
//!   │
//!   └── 3. VOTAÇÃO (Aggregator)
//!       └── resposta canônica mais frequente
//! ```
//!
//! ## Estado da Sessão
//!
//! O [`SessionContext`] concentra tudo o que muda durante a sessão: o
//! [`RuleStore`], o arquivo da KB (com o snapshot inicial) e o motor lógico.
//! É criado uma vez pelo programa principal e emprestado a cada etapa:
//!
//! | Etapa | Empréstimo |
//! |-------|------------|
//! | Translator | `&RuleStore` (só leitura) |
//! | QueryRunner / Aggregator | `&mut SessionContext` |
//!
//! ## Consistência
//!
//! O motor é **sempre** recarregado a partir do arquivo depois de um append,
//! então arquivo, RuleStore e motor nunca divergem por mais que uma chamada.
//! Uma regra que não passa na verificação de sintaxe não toca o arquivo; uma
//! regra cuja recarga falha é cortada do arquivo e não entra no RuleStore.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{syntax, Rule, RuleStore};
use crate::inference::{Aggregator, Bindings, EngineError, LogicEngine};
use crate::llm::TextGenerator;
use crate::nlu::Translator;
use crate::persistence::KbFile;

/// Estado mutável de uma sessão: regras, arquivo e motor.
pub struct SessionContext<E> {
    /// Regras conhecidas, uma por predicado.
    rules: RuleStore,
    /// Arquivo da KB e snapshot inicial.
    kb: KbFile,
    /// Motor lógico com a KB carregada.
    engine: E,
}

impl<E: LogicEngine> SessionContext<E> {
    /// Abre a sessão: lê a KB, extrai as regras únicas e carrega o motor.
    ///
    /// # Erros
    ///
    /// Fatal se o arquivo não puder ser lido ou o motor recusar a carga.
    pub fn open(path: impl Into<PathBuf>, mut engine: E) -> Result<Self> {
        let kb = KbFile::load(path)?;
        let rules = RuleStore::from_source(kb.snapshot());
        engine
            .consult(kb.path())
            .with_context(|| format!("Falha ao carregar {} no motor", kb.path().display()))?;

        tracing::info!(
            path = %kb.path().display(),
            rules = rules.len(),
            "Sessão aberta"
        );
        Ok(Self { rules, kb, engine })
    }

    /// Regras conhecidas.
    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Caminho do arquivo da KB.
    pub fn kb_path(&self) -> &Path {
        self.kb.path()
    }

    /// Arquivo da KB com o snapshot do início da sessão.
    pub fn kb_file(&self) -> &KbFile {
        &self.kb
    }

    /// Aprende uma regra, se o predicado ainda não for conhecido.
    ///
    /// Ordem: verifica a sintaxe → anexa ao arquivo → recarrega o motor a
    /// partir do arquivo → registra no RuleStore. Retorna `false` quando o
    /// predicado já existia (nada é escrito).
    ///
    /// # Erros
    ///
    /// - regra malformada: nada é escrito
    /// - recarga recusada: o append é desfeito e o motor segue com a KB
    ///   anterior
    pub fn learn_rule(&mut self, rule: Rule) -> Result<bool> {
        if self.rules.contains(rule.predicate()) {
            tracing::debug!(predicate = rule.predicate(), "Predicado já conhecido, regra ignorada");
            return Ok(false);
        }

        syntax::check_program(rule.text())
            .with_context(|| format!("Regra malformada descartada: {}", rule))?;

        let previous_len = self.kb.append_rule(&rule)?;
        if let Err(e) = self.engine.consult(self.kb.path()) {
            self.kb.truncate(previous_len)?;
            return Err(anyhow::Error::new(e).context("Falha ao recarregar a KB após nova regra"));
        }

        tracing::info!(
            rule = %rule,
            kind = if rule.is_fact() { "fato" } else { "regra" },
            "Nova regra aprendida"
        );
        self.rules.insert(rule);
        Ok(true)
    }

    /// Executa um objetivo no motor.
    pub fn query(&mut self, goal: &str) -> Result<Vec<Bindings>, EngineError> {
        self.engine.query(goal)
    }

    /// Reescreve o arquivo com o snapshot inicial e recarrega motor e regras.
    pub fn restore(&mut self) -> Result<()> {
        self.kb.restore()?;
        self.rules = RuleStore::from_source(self.kb.snapshot());
        self.engine
            .consult(self.kb.path())
            .context("Falha ao recarregar a KB restaurada")?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub(crate) fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

/// Resultado de um turno.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    /// Traduções candidatas; `None` se a tradução falhou por inteiro.
    pub translations: Option<Vec<Option<String>>>,
    /// Resposta canônica vencedora; `None` se não houve resultado.
    pub answer: Option<String>,
}

/// Orquestrador dos turnos de pergunta e resposta.
pub struct Orchestrator<G, E> {
    /// Tradutor de perguntas.
    translator: Translator<G>,
    /// Estado da sessão.
    session: SessionContext<E>,
    /// Número de traduções candidatas por pergunta.
    samples: usize,
}

impl<G: TextGenerator, E: LogicEngine> Orchestrator<G, E> {
    pub fn new(translator: Translator<G>, session: SessionContext<E>, samples: usize) -> Self {
        Self {
            translator,
            session,
            samples,
        }
    }

    /// Estado da sessão.
    pub fn session(&self) -> &SessionContext<E> {
        &self.session
    }

    /// Processa uma pergunta: traduz, executa cada candidato e vota.
    ///
    /// Nunca falha: tradução indisponível vira `Turn` com `translations`
    /// e `answer` ambos `None`.
    pub fn process_question(&mut self, question: &str) -> Turn {
        let translations = self
            .translator
            .translate(question, self.session.rules(), self.samples);

        let answer = match &translations {
            Some(candidates) => Aggregator::vote(&mut self.session, candidates),
            None => {
                tracing::error!("Falha ao traduzir a pergunta para Prolog");
                None
            }
        };
        tracing::info!(answer = ?answer, "Turno concluído");

        Turn {
            translations,
            answer,
        }
    }

    /// Restaura a KB ao estado do início da sessão.
    pub fn restore(&mut self) -> Result<()> {
        self.session.restore()
    }
}
