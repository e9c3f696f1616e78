use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::logic::validate::ValidationError;
use crate::model::{FormDataListing, Id, NewQuery, Query, QueryPatch};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    FormData,
    Query,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::FormData => f.write_str("FormData"),
            Resource::Query => f.write_str("Query"),
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("Query already exists for this FormData")]
    Conflict,
    #[error("store failure")]
    Internal(#[source] anyhow::Error),
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QueryExists(_) => QueryError::Conflict,
            StoreError::FormDataNotFound(_) => QueryError::NotFound(Resource::FormData),
            StoreError::QueryNotFound(_) => QueryError::NotFound(Resource::Query),
            StoreError::Backend(e) => QueryError::Internal(e),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Query lifecycle rules on top of a [`Store`]. Holds no state of its own, so
/// it is cheap to build per request.
pub struct QueryService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> QueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an OPEN query for an existing FormData record.
    ///
    /// The duplicate check here is only a fast path. Two concurrent callers
    /// can both pass it; the store's unique constraint then rejects the
    /// loser with `QueryExists`, which surfaces as the same `Conflict`.
    pub async fn create_query(&self, new_query: NewQuery) -> QueryResult<Query> {
        let form_data_id = new_query.form_data_id;

        if self.store.find_form_data_by_id(&form_data_id).await?.is_none() {
            return Err(QueryError::NotFound(Resource::FormData));
        }

        if self
            .store
            .find_query_by_form_data_id(&form_data_id)
            .await?
            .is_some()
        {
            return Err(QueryError::Conflict);
        }

        let query = self.store.create_query(new_query).await?;
        log::info!("Created query {} for form data {}", query.id, form_data_id);
        Ok(query)
    }

    /// Apply a partial update. Status transitions are not restricted: a
    /// RESOLVED query may be reopened or resolved again.
    pub async fn update_query(&self, id: &Id, patch: QueryPatch) -> QueryResult<Query> {
        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch.into());
        }

        let query = self.store.update_query_by_id(id, patch).await?;
        log::info!("Updated query {} (status {})", query.id, query.status);
        Ok(query)
    }

    pub async fn delete_query(&self, id: &Id) -> QueryResult<()> {
        self.store.delete_query_by_id(id).await?;
        log::info!("Deleted query {}", id);
        Ok(())
    }

    pub async fn get_query(&self, id: &Id) -> QueryResult<Query> {
        self.store
            .find_query_by_id(id)
            .await?
            .ok_or(QueryError::NotFound(Resource::Query))
    }

    pub async fn list_form_data(&self) -> QueryResult<FormDataListing> {
        Ok(self.store.list_form_data().await?.into())
    }
}
