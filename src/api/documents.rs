//! Document API endpoints.

use axum::extract::{Path, State};

use super::{created, ok, ApiResult, AppJson};
use crate::models::{Document, DocumentPatch, NewDocument};
use crate::AppState;

/// GET /api/documents - List all documents.
pub async fn list_documents(State(state): State<AppState>) -> ApiResult<Vec<Document>> {
    ok(state.store.list().await?)
}

/// GET /api/documents/:id - Get a single document.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ok(state.store.get(&id).await?)
}

/// POST /api/documents - Create a new document.
pub async fn create_document(
    State(state): State<AppState>,
    AppJson(request): AppJson<NewDocument>,
) -> ApiResult<Document> {
    let document = state.store.create(&request).await?;
    tracing::info!(id = %document.id, "Document created");
    created(document)
}

/// PUT /api/documents/:id - Merge fields into a document.
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<DocumentPatch>,
) -> ApiResult<Document> {
    if patch.is_empty() {
        tracing::debug!(id = %id, "Empty patch only refreshes updatedAt");
    }
    let document = state.store.update(&id, &patch).await?;
    tracing::info!(id = %id, "Document updated");
    ok(document)
}

/// DELETE /api/documents/:id - Delete a document, returning it.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let document = state.store.delete(&id).await?;
    tracing::info!(id = %id, "Document deleted");
    ok(document)
}
