pub mod movie;
pub mod permission;
pub mod token;
pub mod user;

pub use movie::{Movie, MovieModel, Runtime, MOVIE_SORT_SAFELIST};
pub use permission::{PermissionModel, Permissions, MOVIES_READ, MOVIES_WRITE};
pub use token::TokenModel;
pub use user::{validate_email, User, UserModel};

use sqlx::PgPool;

/// One handle per table family, all sharing the pool.
#[derive(Debug, Clone)]
pub struct Models {
    pub movies: MovieModel,
    pub users: UserModel,
    pub tokens: TokenModel,
    pub permissions: PermissionModel,
}

impl Models {
    pub fn new(pool: PgPool) -> Self {
        Self {
            movies: MovieModel::new(pool.clone()),
            users: UserModel::new(pool.clone()),
            tokens: TokenModel::new(pool.clone()),
            permissions: PermissionModel::new(pool),
        }
    }
}
