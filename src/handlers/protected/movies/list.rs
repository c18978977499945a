// handlers/protected/movies/list.rs - GET /v1/movies handler

use axum::extract::{Query, State};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::{read_csv, read_int, read_string};
use crate::database::models::{Movie, MOVIE_SORT_SAFELIST};
use crate::error::ApiError;
use crate::filter::{Filters, Metadata};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validator::Validator;

#[derive(Debug, Serialize)]
pub struct MovieList {
    pub movies: Vec<Movie>,
    pub metadata: Metadata,
}

/// GET /v1/movies - filtered, sorted and paginated movie listing
///
/// Query parameters: `title` (full text), `genres` (comma separated, all
/// must match), `page`, `page_size`, `sort` (column, `-` prefix for
/// descending).
pub async fn list_movies(
    State(state): State<AppState>,
    Query(qs): Query<HashMap<String, String>>,
) -> ApiResult<MovieList> {
    let mut v = Validator::new();

    let title = read_string(&qs, "title", "");
    let genres = read_csv(&qs, "genres", &[]);

    let filters = Filters {
        page: read_int(&qs, "page", 1, &mut v),
        page_size: read_int(&qs, "page_size", 20, &mut v),
        sort: read_string(&qs, "sort", "id"),
        sort_safelist: MOVIE_SORT_SAFELIST,
    };

    filters.validate(&mut v);
    if !v.valid() {
        return Err(ApiError::failed_validation(v.into_errors()));
    }

    let (movies, metadata) = state.models.movies.get_all(&title, &genres, &filters).await?;

    Ok(ApiResponse::success(MovieList { movies, metadata }))
}
