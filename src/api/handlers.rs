use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use std::fmt;
use std::sync::Arc;

use crate::api::response::{ApiResponse, ErrorResponse, HealthResponse};
use crate::logic::{
    validate_create, validate_id, validate_update, CreateQueryRequest, QueryError, QueryService,
    UpdateQueryRequest, ValidationError,
};
use crate::model::{FormDataListing, Id, Query};
use crate::store::Store;

pub type AppState<S> = Arc<S>;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListFormData,
    CreateQuery,
    GetQuery,
    UpdateQuery,
    DeleteQuery,
}

impl Operation {
    /// Message used when the store fails in a way the client can't act on
    fn failure_message(&self) -> &'static str {
        match self {
            Operation::ListFormData => "failed to fetch form data",
            Operation::CreateQuery => "Failed to create query",
            Operation::GetQuery => "Failed to fetch query",
            Operation::UpdateQuery => "Failed to update query",
            Operation::DeleteQuery => "Failed to delete query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListFormData => "list_form_data",
            Operation::CreateQuery => "create_query",
            Operation::GetQuery => "get_query",
            Operation::UpdateQuery => "update_query",
            Operation::DeleteQuery => "delete_query",
        };
        f.write_str(name)
    }
}

/// The one place a `QueryError` becomes an HTTP response. Store details are
/// logged, never returned.
pub fn error_response(operation: Operation, err: QueryError, context: &str) -> ApiError {
    let (status, message) = match &err {
        QueryError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        QueryError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        QueryError::Conflict => (StatusCode::BAD_REQUEST, err.to_string()),
        QueryError::Internal(_) => (
            StatusCode::BAD_REQUEST,
            operation.failure_message().to_string(),
        ),
    };

    match &err {
        QueryError::Internal(source) => {
            log::error!("{} failed [{}]: {:#}", operation, context, source)
        }
        _ => log::warn!("{} rejected [{}]: {}", operation, context, err),
    }

    (status, Json(ErrorResponse::new(status, &message)))
}

fn parse_path_id(operation: Operation, raw: &str) -> Result<Id, ApiError> {
    validate_id("id", raw)
        .map_err(|e| error_response(operation, e.into(), &format!("id={}", raw)))
}

fn invalid_body(operation: Operation, rejection: JsonRejection) -> ApiError {
    error_response(
        operation,
        ValidationError::Body(rejection.body_text()).into(),
        "body",
    )
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn list_form_data<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<ApiResponse<FormDataListing>>, ApiError> {
    log::debug!("Fetching form data with query relationships");

    let listing = QueryService::new(store)
        .list_form_data()
        .await
        .map_err(|e| error_response(Operation::ListFormData, e, "all"))?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK,
        listing,
        "Form data fetched",
    )))
}

pub async fn create_query<S: Store>(
    State(store): State<AppState<S>>,
    payload: Result<Json<CreateQueryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Query>>), ApiError> {
    log::debug!("Creating new query");

    let Json(request) = payload.map_err(|r| invalid_body(Operation::CreateQuery, r))?;
    let new_query = validate_create(request)
        .map_err(|e| error_response(Operation::CreateQuery, e.into(), "body"))?;
    let form_data_id = new_query.form_data_id;

    let query = QueryService::new(store)
        .create_query(new_query)
        .await
        .map_err(|e| {
            error_response(
                Operation::CreateQuery,
                e,
                &format!("formDataId={}", form_data_id),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED, query, "Query created")),
    ))
}

pub async fn get_query<S: Store>(
    State(store): State<AppState<S>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<Query>>, ApiError> {
    log::debug!("Fetching query {}", raw_id);
    let id = parse_path_id(Operation::GetQuery, &raw_id)?;

    let query = QueryService::new(store)
        .get_query(&id)
        .await
        .map_err(|e| error_response(Operation::GetQuery, e, &format!("id={}", id)))?;

    Ok(Json(ApiResponse::new(StatusCode::OK, query, "Query fetched")))
}

pub async fn update_query<S: Store>(
    State(store): State<AppState<S>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateQueryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Query>>, ApiError> {
    log::debug!("Updating query {}", raw_id);
    let id = parse_path_id(Operation::UpdateQuery, &raw_id)?;

    let Json(request) = payload.map_err(|r| invalid_body(Operation::UpdateQuery, r))?;
    let patch = validate_update(request)
        .map_err(|e| error_response(Operation::UpdateQuery, e.into(), &format!("id={}", id)))?;

    let query = QueryService::new(store)
        .update_query(&id, patch)
        .await
        .map_err(|e| error_response(Operation::UpdateQuery, e, &format!("id={}", id)))?;

    Ok(Json(ApiResponse::new(StatusCode::OK, query, "Query updated")))
}

pub async fn delete_query<S: Store>(
    State(store): State<AppState<S>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    log::debug!("Deleting query {}", raw_id);
    let id = parse_path_id(Operation::DeleteQuery, &raw_id)?;

    QueryService::new(store)
        .delete_query(&id)
        .await
        .map_err(|e| error_response(Operation::DeleteQuery, e, &format!("id={}", id)))?;

    Ok(StatusCode::NO_CONTENT)
}
