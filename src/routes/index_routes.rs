use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::errors::IndexError;
use crate::persistence::SharedBackend;
use crate::services::index_service;
use crate::state::entry::{EntryFields, IndexEntry};

/// Build all banana index routes under /api/bananas
pub fn routes(store: SharedBackend) -> Router {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route(
            "/:id",
            get(get_entry)
                .put(update_entry)
                .delete(delete_entry),
        )
        .with_state(store)
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/bananas
// Every entry, oldest first
// ─────────────────────────────────────────────────────────────
//
async fn list_entries(
    State(store): State<SharedBackend>,
) -> Result<Json<Vec<IndexEntry>>, IndexError>
{
    Ok(Json(index_service::list(store.as_ref()).await?))
}

//
// ─────────────────────────────────────────────────────────────
// POST /api/bananas
// Create an entry; 201 with the stored record
// ─────────────────────────────────────────────────────────────
//
async fn create_entry(
    State(store): State<SharedBackend>,
    payload: Result<Json<EntryFields>, JsonRejection>,
) -> Result<(StatusCode, Json<IndexEntry>), IndexError>
{
    let Json(fields) = payload?;
    let created = index_service::create(store.as_ref(), fields).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/bananas/{id}
// ─────────────────────────────────────────────────────────────
//
async fn get_entry(
    Path(id): Path<String>,
    State(store): State<SharedBackend>,
) -> Result<Json<IndexEntry>, IndexError>
{
    Ok(Json(index_service::get(store.as_ref(), &id).await?))
}

//
// ─────────────────────────────────────────────────────────────
// PUT /api/bananas/{id}
// Partial update; absent fields keep their value
// ─────────────────────────────────────────────────────────────
//
async fn update_entry(
    Path(id): Path<String>,
    State(store): State<SharedBackend>,
    payload: Result<Json<EntryFields>, JsonRejection>,
) -> Result<Json<IndexEntry>, IndexError>
{
    let Json(fields) = payload?;
    Ok(Json(index_service::update(store.as_ref(), &id, fields).await?))
}

//
// ─────────────────────────────────────────────────────────────
// DELETE /api/bananas/{id}
// Returns the removed entry
// ─────────────────────────────────────────────────────────────
//
async fn delete_entry(
    Path(id): Path<String>,
    State(store): State<SharedBackend>,
) -> Result<Json<IndexEntry>, IndexError>
{
    Ok(Json(index_service::delete(store.as_ref(), &id).await?))
}
