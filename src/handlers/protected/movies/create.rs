// handlers/protected/movies/create.rs - POST /v1/movies handler

use axum::{extract::State, http::header};
use serde::Deserialize;

use crate::api::JsonBody;
use crate::database::models::{Movie, Runtime};
use crate::error::ApiError;
use crate::middleware::{envelope, ApiResponse, ApiResult, Envelope};
use crate::state::AppState;
use crate::validator::Validator;

/// Missing fields fall back to zero values and are reported by validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMovieInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// POST /v1/movies - add a movie to the catalog
///
/// Responds 201 with the stored movie and a `Location` header pointing at it.
pub async fn create_movie(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateMovieInput>,
) -> ApiResult<Envelope<Movie>> {
    let mut movie = Movie::new(input.title, input.year, input.runtime, input.genres);

    let mut v = Validator::new();
    movie.validate(&mut v);
    if !v.valid() {
        return Err(ApiError::failed_validation(v.into_errors()));
    }

    state.models.movies.insert(&mut movie).await?;

    let location = format!("/v1/movies/{}", movie.id);
    Ok(ApiResponse::created(envelope("movie", movie)).with_header(header::LOCATION, &location))
}
