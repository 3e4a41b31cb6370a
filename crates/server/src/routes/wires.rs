//! Wire transfer CRUD endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use wiredesk_shared::{
    Wire, WireCreate, WireListResponse, WireStatus, WireUpdate, DEFAULT_PAGE_SIZE,
};

use crate::error::{ApiProblem, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::processor;
use crate::state::AppState;

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    status: Option<String>,
}

fn not_found(id: i64) -> ApiProblem {
    ApiProblem::not_found(format!("Wire with ID {id} not found"))
}

fn reject_invalid(errors: Vec<wiredesk_shared::FieldError>) -> ApiResult<()> {
    match errors.into_iter().next() {
        Some(error) => Err(ApiProblem::unprocessable(format!(
            "{}: {}",
            error.field, error.message
        ))),
        None => Ok(()),
    }
}

/// Create a new wire transfer
pub async fn create_wire(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<WireCreate>,
) -> ApiResult<(StatusCode, Json<Wire>)> {
    reject_invalid(payload.validate())?;

    let wire = state.store.insert_wire(user.id, payload).await;
    tracing::info!(
        "Created wire {} ({}) for user {}",
        wire.id,
        wire.reference_number.as_deref().unwrap_or("-"),
        user.id
    );

    if let Some(delay) = state.process_delay {
        processor::spawn(state.clone(), wire.id, user.id, delay);
    }

    Ok((StatusCode::CREATED, Json(wire)))
}

/// List the caller's wires, newest first
pub async fn list_wires(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<WireListResponse>> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE));
    if page < 1 {
        return Err(ApiProblem::unprocessable("page must be at least 1"));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiProblem::unprocessable(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    // An unknown status is ignored rather than rejected.
    let status = query
        .status
        .as_deref()
        .and_then(|raw| raw.parse::<WireStatus>().ok());

    let offset = usize::try_from((page - 1).saturating_mul(page_size)).unwrap_or(usize::MAX);
    let limit = usize::try_from(page_size).unwrap_or(0);
    let result = state.store.list_wires(user.id, status, offset, limit).await;

    Ok(Json(WireListResponse {
        wires: result.wires,
        total: result.total,
        page: u32::try_from(page).unwrap_or(u32::MAX),
        page_size: u32::try_from(page_size).unwrap_or(DEFAULT_PAGE_SIZE),
        cached: false,
    }))
}

/// Get a single wire transfer by ID
pub async fn get_wire(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Wire>> {
    state
        .store
        .get_wire(user.id, id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// Partially update a wire. A status change is broadcast to every socket.
pub async fn update_wire(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<WireUpdate>,
) -> ApiResult<Json<Wire>> {
    reject_invalid(payload.validate())?;

    let (wire, previous) = state
        .store
        .update_wire(user.id, id, payload)
        .await
        .ok_or_else(|| not_found(id))?;

    if wire.status != previous {
        tracing::info!("Wire {} moved {} -> {}", wire.id, previous, wire.status);
        state.broadcast_wire_update(wire.id, wire.status, user.id);
    }

    Ok(Json(wire))
}

/// Delete a wire transfer
pub async fn delete_wire(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.store.delete_wire(user.id, id).await {
        tracing::info!("Deleted wire {} for user {}", id, user.id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
