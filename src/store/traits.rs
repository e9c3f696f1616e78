use crate::model::{FormData, FormDataWithQuery, Id, NewQuery, Query, QueryPatch};
use crate::store::error::StoreResult;

/// Read access to FormData records. Records are owned elsewhere;
/// `insert_form_data` exists for seeding and tests.
#[async_trait::async_trait]
pub trait FormDataStore: Send + Sync {
    async fn find_form_data_by_id(&self, id: &Id) -> StoreResult<Option<FormData>>;
    /// All FormData in insertion order, each joined with its query if any
    async fn list_form_data(&self) -> StoreResult<Vec<FormDataWithQuery>>;
    /// Insert a record; returns false if the id already existed
    async fn insert_form_data(&self, form_data: FormData) -> StoreResult<bool>;
}

#[async_trait::async_trait]
pub trait QueryStore: Send + Sync {
    async fn find_query_by_form_data_id(&self, form_data_id: &Id) -> StoreResult<Option<Query>>;
    async fn find_query_by_id(&self, id: &Id) -> StoreResult<Option<Query>>;
    /// Persist a new OPEN query. Fails with `StoreError::QueryExists` when the
    /// form data already has one, decided atomically with the write.
    async fn create_query(&self, new_query: NewQuery) -> StoreResult<Query>;
    /// Fails with `StoreError::QueryNotFound` when `id` does not exist
    async fn update_query_by_id(&self, id: &Id, patch: QueryPatch) -> StoreResult<Query>;
    /// Fails with `StoreError::QueryNotFound` when `id` does not exist
    async fn delete_query_by_id(&self, id: &Id) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait Store: FormDataStore + QueryStore + Send + Sync {
    /// Release backend resources. Called once after the server stops.
    async fn close(&self) {}
}
