//! Model catalog endpoint (`GET /api/tags`)

use crate::protocol::catalog::{self, TagsResponse};
use axum::Json;

pub async fn handler() -> Json<TagsResponse> {
    Json(catalog::catalog())
}
