use crate::model::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryStatus {
    Open,
    Resolved,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Open => "OPEN",
            QueryStatus::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(QueryStatus::Open),
            "RESOLVED" => Ok(QueryStatus::Resolved),
            other => Err(format!("unknown query status '{}'", other)),
        }
    }
}

/// A reviewable note attached to exactly one FormData record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub status: QueryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub form_data_id: Id,
}

/// Validated input for creating a query. Status and timestamps are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuery {
    pub form_data_id: Id,
    pub title: String,
    pub description: Option<String>,
}

/// Partial update of a query. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPatch {
    pub status: Option<QueryStatus>,
    pub description: Option<String>,
}

impl QueryPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.description.is_none()
    }

    /// Apply the patch in place; `now` becomes the new `updated_at`.
    pub fn apply_to(&self, query: &mut Query, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            query.status = status;
        }
        if let Some(description) = &self.description {
            query.description = description.clone();
        }
        query.updated_at = now;
    }
}

/// Timestamp for a mutation that must land strictly after `previous`.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let floor = previous + chrono::Duration::microseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}
