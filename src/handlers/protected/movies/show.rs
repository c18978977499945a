// handlers/protected/movies/show.rs - GET /v1/movies/:id handler

use axum::extract::{Path, State};

use crate::api::read_id;
use crate::database::models::Movie;
use crate::middleware::{envelope, ApiResponse, ApiResult, Envelope};
use crate::state::AppState;

pub async fn show_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<Movie>> {
    let id = read_id(&id)?;
    let movie = state.models.movies.get(id).await?;
    Ok(ApiResponse::success(envelope("movie", movie)))
}
