use serde::Serialize;

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, format!("{field} is required"))
    }
}

/// Failures reported by a [`Catalog`](crate::Catalog) implementation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate point id {0}")]
    DuplicateId(String),

    #[error("point {id} has out-of-range coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        id: String,
        latitude: f64,
        longitude: f64,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("validation failed: {}", describe(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<ValidationError> for ClusterError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(vec![err])
    }
}

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
