//! Error types for the conversational core.

use tina_core::error::TinaError;

/// Errors from session and knowledge plumbing around the dialogue engine.
///
/// Dialogue itself never fails: adapter and evaluator failures are turned
/// into reply text or a fall-through before they reach this type.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("session registry lock poisoned: {0}")]
    SessionLock(String),
    #[error("session limit of {0} reached")]
    SessionLimit(usize),
    #[error("session key longer than {0} characters")]
    SessionKeyTooLong(usize),
    #[error("knowledge error: {0}")]
    Knowledge(String),
}

impl From<TinaError> for ChatError {
    fn from(err: TinaError) -> Self {
        ChatError::Knowledge(err.to_string())
    }
}

impl From<ChatError> for TinaError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Knowledge(msg) => TinaError::Knowledge(msg),
            other => TinaError::Api(other.to_string()),
        }
    }
}

/// Why an arithmetic expression produced no usable value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("name '{0}' is not defined")]
    UnknownName(String),
    #[error("{name}() takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },
    #[error("'{0}' is a constant, not a function")]
    NotCallable(String),
    #[error("'{0}' is a function and must be called")]
    NotCalled(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("math domain error in {0}")]
    Domain(&'static str),
    #[error("integer overflow")]
    Overflow,
    #[error("result is not a finite number")]
    NonFinite,
}
