use thiserror::Error;

/// Failure raised while scanning source text into an AST.
///
/// Carries the monotone character position the parser had reached, per
/// the orchestrator's diagnostic contract.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("parse error at character {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        ParseError {
            position,
            message: message.into(),
        }
    }
}

/// Failure raised while evaluating a fully-parsed AST against a `Context`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("expected a tuple operand, found a bare value")]
    ExpectedTuple,
    #[error("tuple of invalid length {got} (expected {expected})")]
    TupleArity { expected: String, got: usize },
    #[error("operand slot was never filled")]
    MissingOperand,
    #[error("unsupported inversion of this expression kind")]
    UnsupportedInversion,
    #[error("function {0} already defined")]
    Redefinition(i64),
    #[error("function {0} not yet defined")]
    UndefinedFunction(i64),
    #[error("sum of non-numeric values")]
    InvalidSum,
    #[error("expected a number, found a tuple")]
    ExpectedNumber,
    #[error("break used outside of a loop")]
    BreakOutsideLoop,
    #[error("internal: evaluated a non-expression node")]
    NotAnExpression,
}

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("failed to write PNG: {0}")]
    Io(#[from] std::io::Error),
    #[error("cairo surface error: {0}")]
    Surface(String),
}

/// Internal signal threaded through evaluation. `Break` is carried
/// separately from [`RuntimeError`] so that `;` can never be displayed as a
/// user-facing failure; only the enclosing `L` loop interprets it.
pub enum EvalError {
    Runtime(RuntimeError),
    Break,
}

impl From<RuntimeError> for EvalError {
    fn from(e: RuntimeError) -> Self {
        EvalError::Runtime(e)
    }
}

impl EvalError {
    /// Converts an uncaught break into the runtime error the orchestrator
    /// reports; called only at program top level.
    pub fn into_runtime(self) -> RuntimeError {
        match self {
            EvalError::Runtime(e) => e,
            EvalError::Break => RuntimeError::BreakOutsideLoop,
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Top-level failure surfaced by the orchestrator (CLI, feed listener).
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("canvas error: {0}")]
    Canvas(String),
}
