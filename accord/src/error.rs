use crate::validation::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccordError {
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Stored blob '{key}' is not valid JSON: {source}")]
    MalformedBlob {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid import: {0}")]
    InvalidImport(String),

    #[error("Action cancelled: {0}")]
    ConfirmationDeclined(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("{0}")]
    Other(String),
}

impl AccordError {
    pub fn not_found(collection: &str, id: impl ToString) -> Self {
        AccordError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<ValidationErrors> for AccordError {
    fn from(errors: ValidationErrors) -> Self {
        AccordError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, AccordError>;
