use serde::Serialize;
use sqlx::PgPool;

use crate::database::manager::{with_timeout, DatabaseError};

pub const MOVIES_READ: &str = "movies:read";
pub const MOVIES_WRITE: &str = "movies:write";

/// Permission codes held by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions(Vec<String>);

impl Permissions {
    pub fn include(&self, code: &str) -> bool {
        self.0.iter().any(|p| p == code)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Permissions {
    fn from(codes: Vec<String>) -> Self {
        Self(codes)
    }
}

#[derive(Debug, Clone)]
pub struct PermissionModel {
    pool: PgPool,
}

impl PermissionModel {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, DatabaseError> {
        let query = r#"
            SELECT permissions.code
            FROM permissions
            INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
            INNER JOIN users ON users_permissions.user_id = users.id
            WHERE users.id = $1
        "#;

        let codes: Vec<String> = with_timeout(async {
            Ok(sqlx::query_scalar(query)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?)
        })
        .await?;

        Ok(Permissions::from(codes))
    }

    /// Grant the given codes in one statement. Unknown codes are ignored.
    pub async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), DatabaseError> {
        let query = r#"
            INSERT INTO users_permissions
            SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
        "#;

        with_timeout(async {
            sqlx::query(query)
                .bind(user_id)
                .bind(codes)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }
}
