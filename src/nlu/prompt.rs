//! Prompts enviados ao modelo de linguagem.
//!
//! O prompt de sistema carrega **todas** as regras conhecidas, então cresce
//! junto com a sessão: uma regra aprendida na pergunta anterior já aparece
//! como vocabulário disponível na próxima.

use crate::core::RuleStore;

/// Prompt de sistema com as regras da KB embutidas.
pub fn system_prompt(rules: &RuleStore) -> String {
    format!(
        "Translate natural language queries into Prolog. ONLY RETURN PROLOG CODE, NOTHING ELSE. \
         If it's a query, use '?-'; if it needs a rule (ONLY CONSTRUCT RULES THAT USE EXISTING \
         RULES OR FACTS), use ':-'. Use these rules: {}",
        rules.prompt_context()
    )
}

/// Prompt de usuário com a pergunta em linguagem natural.
pub fn user_prompt(question: &str) -> String {
    format!(
        "Translate the following natural language query into Prolog: {}",
        question
    )
}
