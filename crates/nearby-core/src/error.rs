use thiserror::Error;

#[derive(Error, Debug)]
pub enum NearbyError {
    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        reason: String,
    },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Coordinate ({latitude}, {longitude}) is outside the service region")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl NearbyError {
    pub const DOCUMENT_STORE: &'static str = "document store";
    pub const CACHE_STORE: &'static str = "cache store";

    /// The restaurant collection could not be reached or read.
    pub fn document_store(reason: impl Into<String>) -> Self {
        NearbyError::CollaboratorUnavailable {
            collaborator: Self::DOCUMENT_STORE,
            reason: reason.into(),
        }
    }

    /// The cache table could not be reached or written.
    pub fn cache_store(reason: impl Into<String>) -> Self {
        NearbyError::CollaboratorUnavailable {
            collaborator: Self::CACHE_STORE,
            reason: reason.into(),
        }
    }

    /// Whether the error only concerns a single candidate and can be skipped.
    pub fn is_recoverable_record(&self) -> bool {
        matches!(self, NearbyError::MalformedRecord(_))
    }
}

impl From<serde_json::Error> for NearbyError {
    fn from(err: serde_json::Error) -> Self {
        NearbyError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NearbyError>;
