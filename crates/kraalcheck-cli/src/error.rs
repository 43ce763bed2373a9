use kraalcheck_core::schema::{SchemaError, ValidationError};
use kraalcheck_core::tuple::ParseError;
use kraalcheck_storage::StorageError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("schema validation errors: {}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("facts line {line}: {source}")]
    Fact { line: usize, source: ParseError },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CliError {
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        CliError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
