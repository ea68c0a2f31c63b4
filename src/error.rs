use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExceptionError>;

#[derive(Debug, Error)]
pub enum ExceptionError {
    /// Filters handed to the registry were not an ordered sequence.
    #[error("Invalid exception filters: expected a sequence of filters, found {found}")]
    InvalidFilterConfiguration { found: String },
}

impl ExceptionError {
    pub fn invalid_filters(found: impl Into<String>) -> Self {
        Self::InvalidFilterConfiguration {
            found: found.into(),
        }
    }
}
