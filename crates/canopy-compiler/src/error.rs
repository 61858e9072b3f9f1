use std::fmt;

use canopy_core::GrammarError;

/// Fatal grammar definition errors. No table is produced.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("grammar `{0}` has no rules")]
    EmptyGrammar(String),

    #[error("undefined symbol `{name}` referenced from {context}")]
    UndefinedSymbol { name: String, context: String },

    #[error("ambiguous precedence: {0}")]
    AmbiguousPrecedence(String),

    #[error("rule `{rule}` can derive itself without consuming input")]
    LeftRecursionUnsupported { rule: String },

    #[error("inline rules form a cycle through `{rule}`")]
    InlineCycle { rule: String },

    #[error("token in rule `{rule}` references another rule")]
    SymbolInToken { rule: String },

    #[error("invalid pattern in token `{token}`: {message}")]
    InvalidPattern { token: String, message: String },

    #[error("token `{token}` matches the empty string")]
    EmptyToken { token: String },

    #[error("extra `{name}` is not a token")]
    NonTerminalExtra { name: String },

    #[error("grammar needs {count} {what}, more than the table can address")]
    TooManySymbols { what: &'static str, count: usize },

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Non-fatal findings reported alongside a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A rule that cannot be reached from the start rule or the extras.
    UnreachableRule { rule: String },
    /// A conflict that no precedence or associativity settled.
    UnresolvedConflict { description: String },
    /// A named precedence level that no rule uses.
    UnusedPrecedence { name: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnreachableRule { rule } => {
                write!(f, "rule `{rule}` is unreachable from the start rule")
            }
            Warning::UnresolvedConflict { description } => {
                write!(f, "unresolved conflict: {description}")
            }
            Warning::UnusedPrecedence { name } => {
                write!(f, "precedence `{name}` is never used")
            }
        }
    }
}

/// Collects warnings and mirrors each one to the `tracing` log.
#[derive(Debug, Default)]
pub(crate) struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn push(&mut self, warning: Warning) {
        tracing::warn!("{warning}");
        self.0.push(warning);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}
