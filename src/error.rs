use thiserror::Error;

use crate::frontend::position::Position;

/// Every failure the compiler can report, from file handling through
/// specialization and jit linking.
///
/// Frontend variants carry the position of the offending token so the
/// renderer can point into the source line. A `Codegen` error means the jit
/// itself is in a bad state and aborts the run; the remaining backend
/// variants abort only the top-level expression that raised them.
#[derive(Debug, Error)]
pub enum HannaError {
    #[error("{0}")]
    File(String),

    #[error("{message}")]
    Token { message: String, position: Position },

    #[error("{message}")]
    Parse { message: String, position: Position },

    #[error("unknown variable `{0}` referenced")]
    UnknownVariable(String),

    #[error("call references undefined method `{0}`")]
    UnknownCallee(String),

    #[error("method `{name}` expects {expected} arguments but the call provides {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{0}")]
    TypeMismatch(String),

    #[error("failed to emit `{name}`: {message}")]
    EmissionFailed { name: String, message: String },

    #[error("code generation failed: {0}")]
    Codegen(String),
}

impl HannaError {
    /// Headline used by the diagnostic renderer.
    pub fn title(&self) -> &'static str {
        match self {
            HannaError::File(_) => "FILE ERROR",
            HannaError::Token { .. } => "TOKEN ERROR",
            HannaError::Parse { .. } => "PARSE ERROR",
            HannaError::UnknownVariable(_) => "UNKNOWN VARIABLE",
            HannaError::UnknownCallee(_) => "UNKNOWN METHOD",
            HannaError::ArityMismatch { .. } => "ARITY MISMATCH",
            HannaError::TypeMismatch(_) => "TYPE MISMATCH",
            HannaError::EmissionFailed { .. } => "EMISSION FAILED",
            HannaError::Codegen(_) => "CODEGEN ERROR",
        }
    }

    /// Source position, when the error points at a token.
    pub fn position(&self) -> Option<Position> {
        match self {
            HannaError::Token { position, .. } | HannaError::Parse { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Fatal errors abort the whole run instead of the current top-level
    /// expression.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HannaError::Codegen(_))
    }
}
