// handlers/protected/movies/update.rs - PATCH /v1/movies/:id handler

use axum::{
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::api::{read_id, JsonBody};
use crate::database::models::{Movie, Runtime};
use crate::error::ApiError;
use crate::middleware::{envelope, ApiResponse, ApiResult, Envelope};
use crate::state::AppState;
use crate::validator::Validator;

/// Optional precondition: the version the client last saw.
pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovieInput {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl UpdateMovieInput {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}

/// PATCH /v1/movies/:id - partially update a movie
///
/// The write is guarded by the version read here, so a concurrent update in
/// between surfaces as 409.
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<UpdateMovieInput>,
) -> ApiResult<Envelope<Movie>> {
    let id = read_id(&id)?;
    let mut movie = state.models.movies.get(id).await?;

    if let Some(expected) = headers.get(EXPECTED_VERSION_HEADER) {
        if expected.as_bytes() != movie.version.to_string().as_bytes() {
            return Err(ApiError::EditConflict);
        }
    }

    input.apply(&mut movie);

    let mut v = Validator::new();
    movie.validate(&mut v);
    if !v.valid() {
        return Err(ApiError::failed_validation(v.into_errors()));
    }

    state.models.movies.update(&mut movie).await?;

    Ok(ApiResponse::success(envelope("movie", movie)))
}
