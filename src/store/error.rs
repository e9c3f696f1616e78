use crate::model::Id;
use thiserror::Error;

/// Storage failures the service needs to tell apart. Anything else is
/// `Backend`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a query already exists for form data {0}")]
    QueryExists(Id),
    #[error("form data {0} does not exist")]
    FormDataNotFound(Id),
    #[error("query {0} does not exist")]
    QueryNotFound(Id),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
