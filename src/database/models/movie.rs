use chrono::{DateTime, Datelike, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{FromRow, PgPool, Row};

use crate::database::manager::{with_timeout, DatabaseError};
use crate::filter::{Filters, Metadata};
use crate::validator::{unique, Validator};

pub const MOVIE_SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Running time in minutes. Serialized as `"<n> mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Runtime(pub i32);

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{} mins", self.0))
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuntimeVisitor;

        impl de::Visitor<'_> for RuntimeVisitor {
            type Value = Runtime;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str(r#"a runtime such as "102 mins""#)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Runtime, E> {
                let mut parts = v.split(' ');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(n), Some("mins"), None) => n
                        .parse::<i32>()
                        .map(Runtime)
                        .map_err(|_| E::custom("invalid runtime format")),
                    _ => Err(E::custom("invalid runtime format")),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Runtime, E> {
                i32::try_from(v)
                    .map(Runtime)
                    .map_err(|_| E::custom("invalid runtime format"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Runtime, E> {
                i32::try_from(v)
                    .map(Runtime)
                    .map_err(|_| E::custom("invalid runtime format"))
            }
        }

        deserializer.deserialize_any(RuntimeVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(skip_serializing_if = "is_zero_year")]
    pub year: i32,
    #[serde(skip_serializing_if = "is_zero_runtime")]
    pub runtime: Runtime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub version: i32,
}

fn is_zero_year(year: &i32) -> bool {
    *year == 0
}

fn is_zero_runtime(runtime: &Runtime) -> bool {
    runtime.0 == 0
}

impl Movie {
    /// A movie that has not been stored yet.
    pub fn new(title: String, year: i32, runtime: Runtime, genres: Vec<String>) -> Self {
        Self {
            id: 0,
            created_at: Utc::now(),
            title,
            year,
            runtime,
            genres,
            version: 0,
        }
    }

    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.title.is_empty(), "title", "must be provided");
        v.check(self.title.len() <= 500, "title", "must not be more than 500 bytes long");

        v.check(self.year != 0, "year", "must be provided");
        v.check(self.year >= 1888, "year", "must be greater than 1888");
        v.check(self.year <= Utc::now().year(), "year", "must not be in the future");

        v.check(self.runtime.0 != 0, "runtime", "must be provided");
        v.check(self.runtime.0 > 0, "runtime", "must be a positive integer");

        v.check(!self.genres.is_empty(), "genres", "must contain at least 1 genre");
        v.check(self.genres.len() <= 5, "genres", "must not contain more than 5 genres");
        v.check(unique(&self.genres), "genres", "must not contain duplicate values");
    }
}

#[derive(Debug, Clone)]
pub struct MovieModel {
    pool: PgPool,
}

impl MovieModel {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a new movie; fills in `id`, `created_at` and `version`.
    pub async fn insert(&self, movie: &mut Movie) -> Result<(), DatabaseError> {
        let query = r#"
            INSERT INTO movies (title, year, runtime, genres)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, version
        "#;

        let row = with_timeout(async {
            Ok(sqlx::query(query)
                .bind(&movie.title)
                .bind(movie.year)
                .bind(movie.runtime)
                .bind(&movie.genres)
                .fetch_one(&self.pool)
                .await?)
        })
        .await?;

        movie.id = row.try_get("id")?;
        movie.created_at = row.try_get("created_at")?;
        movie.version = row.try_get("version")?;
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Movie, DatabaseError> {
        if id < 1 {
            return Err(DatabaseError::NotFound);
        }

        let query = r#"
            SELECT id, created_at, title, year, runtime, genres, version
            FROM movies
            WHERE id = $1
        "#;

        with_timeout(async {
            sqlx::query_as::<_, Movie>(query)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DatabaseError::NotFound)
        })
        .await
    }

    /// Write `movie` back if its version is still the stored one. On success
    /// `movie.version` holds the new version; otherwise `EditConflict`.
    pub async fn update(&self, movie: &mut Movie) -> Result<(), DatabaseError> {
        let query = r#"
            UPDATE movies
            SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
        "#;

        let version: i32 = with_timeout(async {
            sqlx::query_scalar(query)
                .bind(&movie.title)
                .bind(movie.year)
                .bind(movie.runtime)
                .bind(&movie.genres)
                .bind(movie.id)
                .bind(movie.version)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DatabaseError::EditConflict)
        })
        .await?;

        movie.version = version;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        if id < 1 {
            return Err(DatabaseError::NotFound);
        }

        let result = with_timeout(async {
            Ok(sqlx::query("DELETE FROM movies WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    /// List movies whose title matches `title` (full text, empty matches
    /// everything) and whose genres contain all of `genres`.
    pub async fn get_all(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), DatabaseError> {
        let query = list_query(filters);

        let rows = with_timeout(async {
            Ok(sqlx::query(&query)
                .bind(title)
                .bind(genres)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool)
                .await?)
        })
        .await?;

        let mut total_records = 0;
        let mut movies = Vec::with_capacity(rows.len());
        for row in rows {
            total_records = row.try_get("total")?;
            movies.push(Movie::from_row(&row)?);
        }

        let metadata = Metadata::calculate(total_records, filters.page, filters.page_size);
        Ok((movies, metadata))
    }
}

fn list_query(filters: &Filters) -> String {
    format!(
        r#"
        SELECT count(*) OVER() AS total, id, created_at, title, year, runtime, genres, version
        FROM movies
        WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
        AND (genres @> $2 OR $2 = '{{}}')
        ORDER BY {} {}, id ASC
        LIMIT $3 OFFSET $4
        "#,
        filters.sort_column(),
        filters.sort_direction().to_sql()
    )
}
