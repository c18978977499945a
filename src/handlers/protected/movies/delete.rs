// handlers/protected/movies/delete.rs - DELETE /v1/movies/:id handler

use axum::extract::{Path, State};

use crate::api::read_id;
use crate::middleware::{envelope, ApiResponse, ApiResult, Envelope};
use crate::state::AppState;

pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<&'static str>> {
    let id = read_id(&id)?;
    state.models.movies.delete(id).await?;
    Ok(ApiResponse::success(envelope("message", "movie successfully deleted")))
}
