//! # Sintaxe: Verificação Leve de Texto Prolog
//!
//! O leitor do Scryer não tolera entrada malformada vinda do modelo: um
//! objetivo que não parseia derruba a consulta com pânico, e uma cláusula
//! quebrada no arquivo faz a recarga perder a KB inteira em silêncio. Este
//! módulo barra o texto **antes** de ele chegar ao motor ou ao arquivo.
//!
//! ## O Que É Verificado
//!
//! | Problema | Exemplo |
//! |----------|---------|
//! | Parênteses/colchetes desbalanceados | `parent(tom, X.` |
//! | Argumento vazio | `bar(X, )`, `foo(,a)`, `f()` |
//! | Operador sem operando à direita | `foo(X) :- .` |
//! | Dois termos sem operador entre eles | `foo(X Y)` |
//! | Aspas ou comentário de bloco não fechados | `name('bob).` |
//! | Cláusula sem ponto final | `parent(tom, bob)` |
//!
//! Não é um parser Prolog completo: tabela de operadores e prioridades não
//! são avaliadas. O que passa aqui ainda pode ser recusado pelo motor.
//!
//! ## Cabeças
//!
//! [`check_program`] devolve o indicador `nome/aridade` da cabeça de cada
//! cláusula, usado para conferir que a recarga definiu o que o texto define:
//!
//! ```text
//! parent(tom, bob).               → parent/2
//! ancestor(X, Y) :- parent(X, Y). → ancestor/2
//! ready.                          → ready/0
//! :- dynamic(seen/1).             → (diretiva, ignorada)
//! ```

use logos::Logos;
use thiserror::Error;

/// Átomos alfanuméricos que a tabela padrão declara como operadores.
const OPERATOR_WORDS: &[&str] = &[
    "is",
    "mod",
    "rem",
    "xor",
    "div",
    "rdiv",
    "dynamic",
    "discontiguous",
    "initialization",
    "multifile",
    "meta_predicate",
    "table",
];

/// Texto Prolog recusado pela verificação.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("syntax error at byte {offset}: {reason}")]
pub struct SyntaxError {
    /// Posição (em bytes) onde o problema foi detectado.
    pub offset: usize,
    pub reason: &'static str,
}

impl SyntaxError {
    fn new(offset: usize, reason: &'static str) -> Self {
        Self { offset, reason }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Name,
    Symbol,
    Quoted,
    Var,
    Number,
    Str,
    Cut,
    Comma,
    Bar,
    Open(char),
    Close(char),
    End,
}

#[derive(Clone, Copy, Debug)]
struct Token<'a> {
    kind: Kind,
    text: &'a str,
    offset: usize,
    /// Havia espaço (ou comentário) antes do token.
    spaced: bool,
}

impl Token<'_> {
    fn is_operator(&self) -> bool {
        self.kind == Kind::Symbol || (self.kind == Kind::Name && OPERATOR_WORDS.contains(&self.text))
    }

    fn starts_term(&self) -> bool {
        matches!(
            self.kind,
            Kind::Name | Kind::Quoted | Kind::Var | Kind::Number | Kind::Str | Kind::Cut | Kind::Open(_)
        )
    }

    fn ends_term(&self) -> bool {
        matches!(
            self.kind,
            Kind::Name | Kind::Quoted | Kind::Var | Kind::Number | Kind::Str | Kind::Cut | Kind::Close(_)
        )
    }

    /// Fecha um operando de verdade (não um átomo-operador).
    fn ends_operand(&self) -> bool {
        self.ends_term() && !self.is_operator()
    }

    fn separates(&self) -> bool {
        matches!(self.kind, Kind::Comma | Kind::Bar | Kind::Close(_) | Kind::End)
    }
}

/// Verifica um programa (uma ou mais cláusulas terminadas em ponto).
///
/// # Retorno
///
/// Indicadores `(nome, aridade)` das cabeças reconhecíveis, sem repetição,
/// na ordem em que aparecem.
pub fn check_program(source: &str) -> Result<Vec<(String, usize)>, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut heads: Vec<(String, usize)> = Vec::new();
    for clause in clauses(&tokens, source.len())? {
        if let Some(head) = head_of(clause) {
            if !heads.contains(&head) {
                heads.push(head);
            }
        }
    }
    Ok(heads)
}

/// Verifica um objetivo de consulta: exatamente uma cláusula.
///
/// O ponto final é opcional.
pub fn check_goal(goal: &str) -> Result<(), SyntaxError> {
    let goal = goal.trim();
    let terminated;
    let goal = if goal.ends_with('.') {
        goal
    } else {
        terminated = format!("{}.", goal);
        &terminated
    };

    let tokens = tokenize(goal)?;
    match clauses(&tokens, goal.len())?.as_slice() {
        [_] => Ok(()),
        [] => Err(SyntaxError::new(0, "empty goal")),
        [_, second, ..] => Err(SyntaxError::new(second[0].offset, "more than one clause in goal")),
    }
}

/// Separa os tokens em cláusulas, validando cada uma.
///
/// Cada fatia devolvida inclui o token de fim.
fn clauses<'t, 'a>(tokens: &'t [Token<'a>], len: usize) -> Result<Vec<&'t [Token<'a>]>, SyntaxError> {
    let mut found = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut start = 0;

    for (index, token) in tokens.iter().enumerate() {
        let prev = index.checked_sub(1).filter(|&p| p >= start).map(|p| &tokens[p]);
        let before_prev = index.checked_sub(2).filter(|&p| p >= start).map(|p| &tokens[p]);

        if token.separates() {
            match prev {
                None => return Err(SyntaxError::new(token.offset, "missing term")),
                Some(p) if matches!(p.kind, Kind::Comma | Kind::Bar) => {
                    return Err(SyntaxError::new(token.offset, "missing argument"));
                }
                Some(p) => match (p.kind, token.kind) {
                    (Kind::Open('['), Kind::Close(']')) | (Kind::Open('{'), Kind::Close('}')) => {}
                    (Kind::Open(_), _) => {
                        return Err(SyntaxError::new(token.offset, "missing argument"));
                    }
                    _ if p.is_operator() && before_prev.is_some_and(Token::ends_operand) => {
                        return Err(SyntaxError::new(token.offset, "operator without right operand"));
                    }
                    _ => {}
                },
            }
        }

        if token.starts_term() {
            if let Some(p) = prev {
                let call = token.kind == Kind::Open('(')
                    && !token.spaced
                    && matches!(p.kind, Kind::Name | Kind::Quoted);
                let operator_word = |t: &Token| t.kind == Kind::Name && t.is_operator();
                if p.ends_term() && !call && !operator_word(p) && !operator_word(token) {
                    return Err(SyntaxError::new(token.offset, "operator expected"));
                }
            }
        }

        match token.kind {
            Kind::Open(c) => stack.push(c),
            Kind::Close(c) => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(SyntaxError::new(token.offset, "unbalanced bracket"));
                }
            }
            Kind::End => {
                if !stack.is_empty() {
                    return Err(SyntaxError::new(token.offset, "unclosed bracket before end of clause"));
                }
                found.push(&tokens[start..=index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    if start < tokens.len() {
        let offset = if stack.is_empty() { len } else { tokens[start].offset };
        return Err(SyntaxError::new(offset, "clause without terminating period"));
    }
    Ok(found)
}

/// Indicador da cabeça de uma cláusula já validada.
///
/// Só reconhece cabeças `nome(...)` ou `nome` seguidas de `:-` ou do fim;
/// diretivas, DCG e cabeças em forma de operador ficam de fora.
fn head_of(clause: &[Token]) -> Option<(String, usize)> {
    let name = clause.first().filter(|t| t.kind == Kind::Name)?;
    let (arity, rest) = match clause.get(1) {
        Some(open) if open.kind == Kind::Open('(') && !open.spaced => {
            let mut depth = 0usize;
            let mut arity = 1;
            let mut close = None;
            for (index, token) in clause.iter().enumerate().skip(1) {
                match token.kind {
                    Kind::Open(_) => depth += 1,
                    Kind::Close(_) => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(index);
                            break;
                        }
                    }
                    Kind::Comma if depth == 1 => arity += 1,
                    _ => {}
                }
            }
            (arity, close? + 1)
        }
        _ => (0, 1),
    };

    let follows = clause.get(rest)?;
    let defines = follows.kind == Kind::End || (follows.kind == Kind::Symbol && follows.text == ":-");
    defines.then(|| (name.text.to_string(), arity))
}

/// Classes léxicas do Prolog, reconhecidas pelo DFA do logos.
#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"%[^\n]*")]
enum Lexeme {
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip, priority = 20)]
    BlockComment,

    #[regex(r"\p{Ll}[\p{L}\p{N}_]*")]
    Name,

    #[regex(r"[\p{Lu}_][\p{L}\p{N}_]*")]
    Var,

    #[regex(r"[0-9][0-9A-Za-z_]*(\.[0-9]+([eE][+-]?[0-9]+)?)?")]
    #[regex(r"0'(\\.|''|[^\\'])")]
    Number,

    #[regex(r"'([^'\\]|\\.|'')*'")]
    Quoted,

    #[regex(r#""([^"\\]|\\.|"")*""#)]
    #[regex(r"`([^`\\]|\\.|``)*`")]
    Str,

    #[regex(r"[+\-*/\\^<>=~:.?@#&$]+")]
    Symbol,

    #[token(";")]
    Semicolon,

    #[token("!")]
    Cut,

    #[token(",")]
    Comma,

    #[token("|")]
    Bar,

    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("{")]
    OpenCurly,
    #[token("}")]
    CloseCurly,
}

/// Tokenizador: DFA do logos + reclassificação do ponto final.
///
/// Um `.` isolado seguido de espaço, `%` ou fim de texto fecha a cláusula.
fn tokenize(source: &str) -> Result<Vec<Token<'_>>, SyntaxError> {
    let mut lex = Lexeme::lexer(source);
    let mut tokens = Vec::new();
    let mut prev_end = None;

    while let Some(lexeme) = lex.next() {
        let span = lex.span();
        let text = lex.slice();
        let Ok(lexeme) = lexeme else {
            let reason = if text.starts_with(['\'', '"', '`']) {
                "unterminated quoted text"
            } else {
                "unexpected character"
            };
            return Err(SyntaxError::new(span.start, reason));
        };

        let kind = match lexeme {
            Lexeme::Symbol if text.starts_with("/*") => {
                return Err(SyntaxError::new(span.start, "unterminated block comment"));
            }
            Lexeme::Symbol if text == "." => {
                let next = source[span.end..].chars().next();
                if next.map_or(true, |c| c.is_whitespace() || c == '%') {
                    Kind::End
                } else {
                    Kind::Symbol
                }
            }
            Lexeme::Symbol | Lexeme::Semicolon => Kind::Symbol,
            Lexeme::Name => Kind::Name,
            Lexeme::Var => Kind::Var,
            Lexeme::Number => Kind::Number,
            Lexeme::Quoted => Kind::Quoted,
            Lexeme::Str => Kind::Str,
            Lexeme::Cut => Kind::Cut,
            Lexeme::Comma => Kind::Comma,
            Lexeme::Bar => Kind::Bar,
            Lexeme::OpenParen => Kind::Open('('),
            Lexeme::CloseParen => Kind::Close(')'),
            Lexeme::OpenBracket => Kind::Open('['),
            Lexeme::CloseBracket => Kind::Close(']'),
            Lexeme::OpenCurly => Kind::Open('{'),
            Lexeme::CloseCurly => Kind::Close('}'),
            Lexeme::BlockComment => continue,
        };

        tokens.push(Token {
            kind,
            text,
            offset: span.start,
            spaced: prev_end != Some(span.start),
        });
        prev_end = Some(span.end);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_clauses_pass() {
        let kb = "\
% família
parent(tom, bob).
parent(tom, 'Liz Smith').
ancestor(X, Y) :- parent(X, Y).
ancestor(X, Y) :- parent(X, Z), ancestor(Z, Y).
older(X, Y) :- age(X, A), age(Y, B), A > B, \\+ X = Y.
list_len([], 0).
list_len([_|T], N) :- list_len(T, M), N is M + 1.
ratio(X) :- X is 3.14 * 2.0e-3, X =\\= 0'a.
/* bloco */ ready.
:- dynamic(seen/1).
";
        let heads = check_program(kb).unwrap();
        assert_eq!(
            heads,
            vec![
                ("parent".to_string(), 2),
                ("ancestor".to_string(), 2),
                ("older".to_string(), 2),
                ("list_len".to_string(), 2),
                ("ratio".to_string(), 1),
                ("ready".to_string(), 0),
            ]
        );
    }

    #[test]
    fn goals_pass() {
        assert!(check_goal("parent(tom, X)").is_ok());
        assert!(check_goal("parent(tom, X), male(X).").is_ok());
        assert!(check_goal("(parent(tom, X) ; parent(bob, X)), X \\== liz.").is_ok());
        assert!(check_goal("findall(X, member(X, [a, b|T]), L).").is_ok());
    }

    #[test]
    fn unbalanced_goal_is_rejected() {
        let err = check_goal("parent(tom, X.").unwrap_err();
        assert_eq!(err.reason, "unclosed bracket before end of clause");
        assert!(check_goal("parent(tom, X)).").is_err());
        assert!(check_goal("member(X, [a, b).").is_err());
    }

    #[test]
    fn dangling_argument_is_rejected() {
        assert!(check_program("foo(X) :- bar(X, .").is_err());
        assert!(check_program("foo(X) :- bar(X, ).").is_err());
        assert!(check_program("foo(,a).").is_err());
        assert!(check_program("foo().").is_err());
    }

    #[test]
    fn missing_operand_is_rejected() {
        let err = check_program("foo(X) :- .").unwrap_err();
        assert_eq!(err.reason, "operator without right operand");
        assert!(check_goal("X = .").is_err());
        // Átomo-operador como argumento é um termo válido.
        assert!(check_goal("X = (+).").is_ok());
    }

    #[test]
    fn adjacent_terms_are_rejected() {
        assert!(check_goal("foo(X Y).").is_err());
        assert!(check_goal("foo (a).").is_err());
        assert!(check_goal("foo(a) bar(b).").is_err());
        assert!(check_goal("X is 1 + 2.").is_ok());
    }

    #[test]
    fn unterminated_text_is_rejected() {
        assert!(check_program("name('bob).").is_err());
        assert!(check_program("/* aberto\nparent(tom, bob).").is_err());
        assert!(check_program("parent(tom, bob)").is_err());
        assert!(check_program("parent(tom, bob). parent(tom,").is_err());
    }

    #[test]
    fn goal_must_be_a_single_clause() {
        assert!(check_goal("a. b.").is_err());
        assert!(check_goal("   ").is_err());
    }

    #[test]
    fn error_reports_position() {
        let err = check_goal("foo(a, , b).").unwrap_err();
        assert_eq!(err.offset, 7);
        assert_eq!(err.to_string(), "syntax error at byte 7: missing argument");
    }
}
