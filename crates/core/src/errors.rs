use thiserror::Error;

use crate::domain::week::WeekYear;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed week token: {0}")]
    MalformedToken(String),
    #[error("malformed action info: {0}")]
    MalformedActionInfo(String),
    #[error("unknown schedule slot `{0}`")]
    UnknownSlot(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("version conflict on `{key}`: expected version {expected}, found {actual:?}")]
    VersionConflict { key: String, expected: u64, actual: Option<u64> },
    #[error("stored document could not be decoded: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("reviewer `{reviewer_id}` is not registered")]
    ReviewerNotRegistered { reviewer_id: String },
    #[error("challenge `{challenge_name}` is not registered")]
    ChallengeNotRegistered { challenge_name: String },
    #[error("no `{technology}` reviewers available for `{challenge_name}` in week {week}")]
    NoReviewersFound { challenge_name: String, technology: String, week: WeekYear },
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "Nothing matched that request.",
            Self::ServiceUnavailable { .. } => {
                "The schedule could not be updated right now. Please click again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }

    /// Expected empty-result conditions, rendered as information rather than failure.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::ReviewerNotRegistered { .. }
                | Self::ChallengeNotRegistered { .. }
                | Self::NoReviewersFound { .. }
        )
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = || "unassigned".to_string();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
            }
            error @ (ApplicationError::ReviewerNotRegistered { .. }
            | ApplicationError::ChallengeNotRegistered { .. }
            | ApplicationError::NoReviewersFound { .. }) => {
                Self::NotFound { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Persistence(error) => Self::ServiceUnavailable {
                message: error.to_string(),
                correlation_id: unassigned(),
            },
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: unassigned() }
            }
        }
    }
}
