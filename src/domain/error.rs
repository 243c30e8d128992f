use color_eyre::eyre::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemberAPIError {
    #[error("Resource with ID not found: {0}")]
    IDNotFoundError(i64),
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
    #[error("Validation error")]
    ValidationError(#[from] ValidationError),
}

#[derive(Debug, Error, PartialEq)]
#[error("Validation error: {0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: String) -> Self {
        Self(message)
    }

    pub fn as_ref(&self) -> &String {
        &self.0
    }
}
