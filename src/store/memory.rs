use parking_lot::RwLock;
use std::collections::HashMap;

use crate::model::{
    generate_id, next_timestamp, FormData, FormDataWithQuery, Id, NewQuery, Query, QueryPatch,
    QueryStatus,
};
use crate::store::error::{StoreError, StoreResult};
use crate::store::traits::{FormDataStore, QueryStore, Store};

#[derive(Debug, Default)]
struct Tables {
    form_data: HashMap<Id, FormData>,
    /// FormData ids in insertion order
    form_data_order: Vec<Id>,
    queries: HashMap<Id, Query>,
    /// Unique index: form_data_id -> query id
    query_by_form_data: HashMap<Id, Id>,
}

/// In-process store with the same constraints as the Postgres schema:
/// one query per form data, and queries only for existing form data.
/// Every mutation checks and writes under a single write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored queries that reference `form_data_id`
    pub fn query_count_for(&self, form_data_id: &Id) -> usize {
        self.tables
            .read()
            .queries
            .values()
            .filter(|q| &q.form_data_id == form_data_id)
            .count()
    }
}

#[async_trait::async_trait]
impl FormDataStore for MemoryStore {
    async fn find_form_data_by_id(&self, id: &Id) -> StoreResult<Option<FormData>> {
        Ok(self.tables.read().form_data.get(id).cloned())
    }

    async fn list_form_data(&self) -> StoreResult<Vec<FormDataWithQuery>> {
        let tables = self.tables.read();
        let records = tables
            .form_data_order
            .iter()
            .filter_map(|id| tables.form_data.get(id))
            .map(|form_data| {
                let query = tables
                    .query_by_form_data
                    .get(&form_data.id)
                    .and_then(|query_id| tables.queries.get(query_id))
                    .cloned();
                form_data.clone().with_query(query)
            })
            .collect();

        Ok(records)
    }

    async fn insert_form_data(&self, form_data: FormData) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if tables.form_data.contains_key(&form_data.id) {
            return Ok(false);
        }
        tables.form_data_order.push(form_data.id);
        tables.form_data.insert(form_data.id, form_data);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl QueryStore for MemoryStore {
    async fn find_query_by_form_data_id(&self, form_data_id: &Id) -> StoreResult<Option<Query>> {
        let tables = self.tables.read();
        Ok(tables
            .query_by_form_data
            .get(form_data_id)
            .and_then(|id| tables.queries.get(id))
            .cloned())
    }

    async fn find_query_by_id(&self, id: &Id) -> StoreResult<Option<Query>> {
        Ok(self.tables.read().queries.get(id).cloned())
    }

    async fn create_query(&self, new_query: NewQuery) -> StoreResult<Query> {
        let mut tables = self.tables.write();

        if !tables.form_data.contains_key(&new_query.form_data_id) {
            return Err(StoreError::FormDataNotFound(new_query.form_data_id));
        }
        if tables.query_by_form_data.contains_key(&new_query.form_data_id) {
            return Err(StoreError::QueryExists(new_query.form_data_id));
        }

        let now = chrono::Utc::now();
        let query = Query {
            id: generate_id(),
            title: new_query.title,
            description: new_query.description.unwrap_or_default(),
            status: QueryStatus::Open,
            created_at: now,
            updated_at: now,
            form_data_id: new_query.form_data_id,
        };

        tables
            .query_by_form_data
            .insert(query.form_data_id, query.id);
        tables.queries.insert(query.id, query.clone());

        Ok(query)
    }

    async fn update_query_by_id(&self, id: &Id, patch: QueryPatch) -> StoreResult<Query> {
        let mut tables = self.tables.write();
        let query = tables
            .queries
            .get_mut(id)
            .ok_or(StoreError::QueryNotFound(*id))?;

        let now = next_timestamp(query.updated_at);
        patch.apply_to(query, now);

        Ok(query.clone())
    }

    async fn delete_query_by_id(&self, id: &Id) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let query = tables
            .queries
            .remove(id)
            .ok_or(StoreError::QueryNotFound(*id))?;
        tables.query_by_form_data.remove(&query.form_data_id);
        Ok(())
    }
}

impl Store for MemoryStore {}
