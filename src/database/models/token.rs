use chrono::Duration;
use sqlx::PgPool;

use crate::auth::{Scope, Token};
use crate::database::manager::{with_timeout, DatabaseError};

#[derive(Debug, Clone)]
pub struct TokenModel {
    pool: PgPool,
}

impl TokenModel {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Generate and store a token. The plaintext is only ever available on
    /// the returned value.
    pub async fn new_token(&self, user_id: i64, ttl: Duration, scope: Scope) -> Result<Token, DatabaseError> {
        let token = Token::generate(user_id, ttl, scope);
        self.insert(&token).await?;
        Ok(token)
    }

    pub async fn insert(&self, token: &Token) -> Result<(), DatabaseError> {
        let query = r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
        "#;

        with_timeout(async {
            sqlx::query(query)
                .bind(&token.hash)
                .bind(token.user_id)
                .bind(token.expiry)
                .bind(token.scope.as_str())
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    /// Remove every token of `scope` owned by the user. Deleting nothing is
    /// not an error.
    pub async fn delete_all_for_user(&self, scope: Scope, user_id: i64) -> Result<(), DatabaseError> {
        let query = r#"
            DELETE FROM tokens
            WHERE scope = $1 AND user_id = $2
        "#;

        with_timeout(async {
            sqlx::query(query)
                .bind(scope.as_str())
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }
}
