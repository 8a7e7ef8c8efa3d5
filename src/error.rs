//! Error type shared by every module of the crate.

use thiserror::Error;

/// Validation failures reported by the onboarding form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0} must be a number")]
    NonNumeric(&'static str),

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("Sex not selected")]
    SexNotSelected,

    #[error("Activity level not selected")]
    ActivityLevelNotSelected,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown activity level: {0}")]
    UnknownActivityLevel(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Food lookup failed: {0}")]
    LookupFailure(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        Self::StorageFailure(err.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
