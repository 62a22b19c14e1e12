/// Reasons a formula can be rejected before it is ever evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,
    #[error("expression is {len} bytes long; the limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown name '{0}'")]
    UnknownName(String),
    #[error("'{0}' is not a function")]
    NotAFunction(String),
    #[error("function '{0}' must be called with parentheses")]
    MissingCall(String),
    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: &'static str,
        expected: String,
        found: usize,
    },
    #[error("expression nests deeper than {max} levels")]
    TooDeep { max: usize },
}

/// Failures that only show up once a concrete `t` is supplied.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("{operation} produced a non-finite value")]
    NonFinite { operation: &'static str },
}
