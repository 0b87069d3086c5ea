//! Error types for kernel generation.

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest has {} error(s)", .0.iter().filter(|d| d.is_error()).count())]
    Invalid(Vec<Diagnostic>),

    #[error("unknown user function '{0}'")]
    UnknownFunction(String),

    #[error("unknown user type '{0}'")]
    UnknownType(String),

    #[error("kernel name '{name}' is derived by both {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("template is missing a value for placeholder '{0}'")]
    MissingField(&'static str),

    #[error("{skeleton} expects a {param} parameter in user function '{function}'")]
    MissingParam {
        skeleton: &'static str,
        function: String,
        param: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, GenError>;
