use anyhow::{anyhow, Context};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};

use crate::model::{FormData, FormDataWithQuery, Id, NewQuery, Query, QueryPatch, QueryStatus};
use crate::store::error::{StoreError, StoreResult};
use crate::store::traits::{FormDataStore, QueryStore, Store};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const FORM_DATA_UNIQUE_CONSTRAINT: &str = "queries_form_data_id_key";

const QUERY_COLUMNS: &str =
    "id, title, description, status, created_at, updated_at, form_data_id";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run the embedded schema migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

fn query_from_row(row: &PgRow) -> StoreResult<Query> {
    let status: String = row.get("status");
    let status = status
        .parse::<QueryStatus>()
        .map_err(|e| StoreError::Backend(anyhow!(e)))?;

    Ok(Query {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        form_data_id: row.get("form_data_id"),
    })
}

/// Query columns from the LEFT JOIN in `list_form_data`, all nullable
fn joined_query_from_row(row: &PgRow) -> StoreResult<Option<Query>> {
    let Some(id) = row.get::<Option<Id>, _>("query_id") else {
        return Ok(None);
    };

    let status: String = row.get("query_status");
    let status = status
        .parse::<QueryStatus>()
        .map_err(|e| StoreError::Backend(anyhow!(e)))?;

    Ok(Some(Query {
        id,
        title: row.get("query_title"),
        description: row.get("query_description"),
        status,
        created_at: row.get("query_created_at"),
        updated_at: row.get("query_updated_at"),
        form_data_id: row.get("id"),
    }))
}

/// Typed error for a violated constraint on `queries`, if it is one we own
fn classify_violation(
    code: Option<&str>,
    constraint: Option<&str>,
    form_data_id: Id,
) -> Option<StoreError> {
    match code {
        Some(UNIQUE_VIOLATION) if constraint == Some(FORM_DATA_UNIQUE_CONSTRAINT) => {
            Some(StoreError::QueryExists(form_data_id))
        }
        Some(FOREIGN_KEY_VIOLATION) => Some(StoreError::FormDataNotFound(form_data_id)),
        _ => None,
    }
}

/// Translate constraint violations on `queries` into typed store errors
fn map_create_error(err: sqlx::Error, form_data_id: Id) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        if let Some(typed) = classify_violation(code.as_deref(), db_err.constraint(), form_data_id)
        {
            return typed;
        }
    }
    StoreError::Backend(anyhow::Error::new(err).context("Failed to create query"))
}

#[async_trait::async_trait]
impl FormDataStore for PostgresStore {
    async fn find_form_data_by_id(&self, id: &Id) -> StoreResult<Option<FormData>> {
        let row = sqlx::query("SELECT id, question, answer FROM form_data WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch form data")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(FormData {
            id: row.get("id"),
            question: row.get("question"),
            answer: row.get("answer"),
        }))
    }

    async fn list_form_data(&self) -> StoreResult<Vec<FormDataWithQuery>> {
        let rows = sqlx::query(
            r#"
            SELECT f.id, f.question, f.answer,
                   q.id AS query_id, q.title AS query_title, q.description AS query_description,
                   q.status AS query_status, q.created_at AS query_created_at,
                   q.updated_at AS query_updated_at
            FROM form_data f
            LEFT JOIN queries q ON q.form_data_id = f.id
            ORDER BY f.created_at, f.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list form data")?;

        rows.iter()
            .map(|row| -> StoreResult<FormDataWithQuery> {
                let form_data = FormData {
                    id: row.get("id"),
                    question: row.get("question"),
                    answer: row.get("answer"),
                };
                Ok(form_data.with_query(joined_query_from_row(row)?))
            })
            .collect()
    }

    async fn insert_form_data(&self, form_data: FormData) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO form_data (id, question, answer) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING",
        )
        .bind(form_data.id)
        .bind(&form_data.question)
        .bind(&form_data.answer)
        .execute(&self.pool)
        .await
        .context("Failed to insert form data")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl QueryStore for PostgresStore {
    async fn find_query_by_form_data_id(&self, form_data_id: &Id) -> StoreResult<Option<Query>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM queries WHERE form_data_id = $1",
            QUERY_COLUMNS
        ))
        .bind(form_data_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch query by form data")?;

        row.as_ref().map(query_from_row).transpose()
    }

    async fn find_query_by_id(&self, id: &Id) -> StoreResult<Option<Query>> {
        let row = sqlx::query(&format!("SELECT {} FROM queries WHERE id = $1", QUERY_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch query")?;

        row.as_ref().map(query_from_row).transpose()
    }

    async fn create_query(&self, new_query: NewQuery) -> StoreResult<Query> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO queries (id, title, description, status, form_data_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            QUERY_COLUMNS
        ))
        .bind(crate::model::generate_id())
        .bind(&new_query.title)
        .bind(new_query.description.as_deref().unwrap_or(""))
        .bind(QueryStatus::Open.as_str())
        .bind(new_query.form_data_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_create_error(e, new_query.form_data_id))?;

        query_from_row(&row)
    }

    async fn update_query_by_id(&self, id: &Id, patch: QueryPatch) -> StoreResult<Query> {
        // updated_at must move forward even within one clock tick
        let row = sqlx::query(&format!(
            r#"
            UPDATE queries SET
                status = COALESCE($2, status),
                description = COALESCE($3, description),
                updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1
            RETURNING {}
            "#,
            QUERY_COLUMNS
        ))
        .bind(id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.description.as_deref())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update query")?;

        match row {
            Some(row) => query_from_row(&row),
            None => Err(StoreError::QueryNotFound(*id)),
        }
    }

    async fn delete_query_by_id(&self, id: &Id) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM queries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete query")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::QueryNotFound(*id));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // Needs a disposable database: TEST_DATABASE_URL=postgres://... cargo test -- --ignored
    async fn connect() -> PostgresStore {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL not set");
        let store = PostgresStore::new(&url, 5).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[test]
    fn test_only_form_data_uniqueness_maps_to_query_exists() {
        let form_data_id = crate::model::generate_id();

        assert!(matches!(
            classify_violation(Some("23505"), Some("queries_form_data_id_key"), form_data_id),
            Some(StoreError::QueryExists(id)) if id == form_data_id
        ));
        assert!(matches!(
            classify_violation(Some("23503"), Some("queries_form_data_id_fkey"), form_data_id),
            Some(StoreError::FormDataNotFound(id)) if id == form_data_id
        ));
        // A primary key collision is not a duplicate query for the record
        assert!(classify_violation(Some("23505"), Some("queries_pkey"), form_data_id).is_none());
        assert!(classify_violation(Some("23505"), None, form_data_id).is_none());
        assert!(classify_violation(Some("23514"), Some("queries_status_check"), form_data_id).is_none());
        assert!(classify_violation(None, None, form_data_id).is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn test_unique_constraint_decides_concurrent_creates() {
        let store = Arc::new(connect().await);
        let form_data = FormData::new("Is X present?", "Yes");
        let form_data_id = form_data.id;
        assert!(store.insert_form_data(form_data).await.unwrap());

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_query(NewQuery {
                            form_data_id,
                            title: "Is X present?".to_string(),
                            description: Some(format!("attempt {}", i)),
                        })
                        .await
                })
            })
            .collect();

        let mut created = Vec::new();
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(query) => created.push(query),
                Err(StoreError::QueryExists(id)) => {
                    assert_eq!(id, form_data_id);
                    conflicts += 1;
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(created.len(), 1);
        assert_eq!(conflicts, 7);

        let query = &created[0];
        let resolved = store
            .update_query_by_id(
                &query.id,
                QueryPatch {
                    status: Some(QueryStatus::Resolved),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.description, query.description);
        assert!(resolved.updated_at > resolved.created_at);

        store.delete_query_by_id(&query.id).await.unwrap();
        assert!(matches!(
            store.delete_query_by_id(&query.id).await,
            Err(StoreError::QueryNotFound(_))
        ));
        store.close().await;
    }

    #[tokio::test]
    #[ignore]
    async fn test_create_for_missing_form_data_hits_foreign_key() {
        let store = connect().await;
        let missing = crate::model::generate_id();

        let err = store
            .create_query(NewQuery {
                form_data_id: missing,
                title: "Q".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::FormDataNotFound(id) if id == missing));
        store.close().await;
    }
}
