//! Request payload schemas and the checks that run before any business logic.
//!
//! Every function here is pure: it either returns the validated, typed input
//! for the service or a [`ValidationError`]. Nothing here touches the store.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::OnceLock;
use thiserror::Error;

use crate::model::{Id, NewQuery, QueryPatch, QueryStatus};

pub const TITLE_MAX_CHARS: usize = 500;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const ID_LEN: usize = 36;

static ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn id_pattern() -> &'static Regex {
    ID_PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("identifier pattern is a valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be a 36-character lowercase identifier")]
    InvalidId { field: &'static str },
    #[error("at least one of status or description must be provided")]
    EmptyPatch,
    #[error("invalid request body: {0}")]
    Body(String),
}

/// Body of `POST /queries`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateQueryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub form_data_id: Option<String>,
}

/// Body of `PUT /queries/:id`. Fields may be omitted but not sent as `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateQueryRequest {
    #[serde(default, deserialize_with = "present")]
    pub status: Option<QueryStatus>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<String>,
}

/// Only runs for keys that are present, so a `null` value fails as `T`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub fn validate_id(field: &'static str, raw: &str) -> Result<Id, ValidationError> {
    if raw.len() != ID_LEN || !id_pattern().is_match(raw) {
        return Err(ValidationError::InvalidId { field });
    }
    Id::parse_str(raw).map_err(|_| ValidationError::InvalidId { field })
}

fn validate_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

pub fn validate_create(request: CreateQueryRequest) -> Result<NewQuery, ValidationError> {
    let title = request
        .title
        .ok_or(ValidationError::Missing { field: "title" })?;
    validate_text("title", &title, TITLE_MAX_CHARS)?;

    let description = request
        .description
        .ok_or(ValidationError::Missing { field: "description" })?;
    validate_text("description", &description, DESCRIPTION_MAX_CHARS)?;

    let form_data_id = request
        .form_data_id
        .ok_or(ValidationError::Missing { field: "formDataId" })?;
    let form_data_id = validate_id("formDataId", &form_data_id)?;

    Ok(NewQuery {
        form_data_id,
        title,
        description: Some(description),
    })
}

pub fn validate_update(request: UpdateQueryRequest) -> Result<QueryPatch, ValidationError> {
    if let Some(description) = &request.description {
        validate_text("description", description, DESCRIPTION_MAX_CHARS)?;
    }

    let patch = QueryPatch {
        status: request.status,
        description: request.description,
    };
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    Ok(patch)
}
