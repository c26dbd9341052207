use lotkeeper_shared::ParseEnumError;

#[derive(Debug, thiserror::Error)]
pub enum LotError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state transition for {entity} from {from} to {to}")]
    InvalidState {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LotError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LotError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_state(entity: &'static str, from: impl ToString, to: impl ToString) -> Self {
        LotError::InvalidState {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            LotError::NotFound { .. } => "NOT_FOUND",
            LotError::Conflict(_) => "CONFLICT",
            LotError::InvalidState { .. } => "INVALID_STATE",
            LotError::Validation(_) => "VALIDATION",
            LotError::Authorization(_) => "AUTHORIZATION",
            LotError::Storage(_) => "STORAGE",
        }
    }
}

impl From<ParseEnumError> for LotError {
    fn from(err: ParseEnumError) -> Self {
        LotError::Validation(err.to_string())
    }
}

pub type LotResult<T> = Result<T, LotError>;
