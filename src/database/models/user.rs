use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgPool, Row};

use crate::auth::{digest, validate_password_plaintext, Password, Scope};
use crate::database::manager::{with_timeout, DatabaseError};
use crate::validator::{matches, Validator, EMAIL_RX};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: Password,
    pub activated: bool,
    #[serde(skip)]
    pub version: i32,
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let hash: Vec<u8> = row.try_get("password_hash")?;
        let hash = String::from_utf8(hash).map_err(|e| sqlx::Error::ColumnDecode {
            index: "password_hash".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: Password::from_hash(hash),
            activated: row.try_get("activated")?,
            version: row.try_get("version")?,
        })
    }
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: 0,
            created_at: Utc::now(),
            name,
            email,
            password: Password::default(),
            activated: false,
            version: 0,
        }
    }

    /// # Panics
    ///
    /// If the password hash was never set: every user reaching validation
    /// must carry one.
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.name.is_empty(), "name", "must be provided");
        v.check(self.name.len() <= 500, "name", "must not be more than 500 bytes long");

        validate_email(v, &self.email);

        if let Some(plaintext) = self.password.plaintext() {
            validate_password_plaintext(v, plaintext);
        }

        if self.password.hash().is_none() {
            panic!("missing password hash for user");
        }
    }

    fn password_hash_bytes(&self) -> Result<&[u8], DatabaseError> {
        self.password
            .hash()
            .map(str::as_bytes)
            .ok_or(DatabaseError::MissingPasswordHash)
    }
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(matches(email, &EMAIL_RX), "email", "must be a valid email address");
}

#[derive(Debug, Clone)]
pub struct UserModel {
    pool: PgPool,
}

impl UserModel {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user: &mut User) -> Result<(), DatabaseError> {
        let query = r#"
            INSERT INTO users (name, email, password_hash, activated)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, version
        "#;

        let hash = user.password_hash_bytes()?;
        let row = with_timeout(async {
            sqlx::query(query)
                .bind(&user.name)
                .bind(&user.email)
                .bind(hash)
                .bind(user.activated)
                .fetch_one(&self.pool)
                .await
                .map_err(DatabaseError::from_write)
        })
        .await?;

        user.id = row.try_get("id")?;
        user.created_at = row.try_get("created_at")?;
        user.version = row.try_get("version")?;
        Ok(())
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        let query = r#"
            SELECT id, created_at, name, email::text AS email, password_hash, activated, version
            FROM users
            WHERE email = $1::citext
        "#;

        with_timeout(async {
            sqlx::query_as::<_, User>(query)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DatabaseError::NotFound)
        })
        .await
    }

    /// Version-guarded write. A clash on the email constraint is reported as
    /// `DuplicateEmail` even if the version also moved.
    pub async fn update(&self, user: &mut User) -> Result<(), DatabaseError> {
        let query = r#"
            UPDATE users
            SET name = $1, email = $2, password_hash = $3, activated = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
        "#;

        // A stale version matches no row, so the constraint never fires.
        let email_taken = r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE email = $1::citext AND id <> $2)
        "#;

        let hash = user.password_hash_bytes()?;
        let version: i32 = with_timeout(async {
            let updated: Option<i32> = sqlx::query_scalar(query)
                .bind(&user.name)
                .bind(&user.email)
                .bind(hash)
                .bind(user.activated)
                .bind(user.id)
                .bind(user.version)
                .fetch_optional(&self.pool)
                .await
                .map_err(DatabaseError::from_write)?;

            match updated {
                Some(version) => Ok(version),
                None => {
                    let taken: bool = sqlx::query_scalar(email_taken)
                        .bind(&user.email)
                        .bind(user.id)
                        .fetch_one(&self.pool)
                        .await?;
                    if taken {
                        Err(DatabaseError::DuplicateEmail)
                    } else {
                        Err(DatabaseError::EditConflict)
                    }
                }
            }
        })
        .await?;

        user.version = version;
        Ok(())
    }

    /// The owner of an unexpired token with this plaintext and scope. Wrong
    /// and expired tokens are indistinguishable: both are `NotFound`.
    pub async fn get_for_token(&self, scope: Scope, plaintext: &str) -> Result<User, DatabaseError> {
        let query = r#"
            SELECT users.id, users.created_at, users.name, users.email::text AS email,
                   users.password_hash, users.activated, users.version
            FROM users
            INNER JOIN tokens ON users.id = tokens.user_id
            WHERE tokens.hash = $1
            AND tokens.scope = $2
            AND tokens.expiry > $3
        "#;

        let hash = digest(plaintext);
        with_timeout(async {
            sqlx::query_as::<_, User>(query)
                .bind(hash)
                .bind(scope.as_str())
                .bind(Utc::now())
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DatabaseError::NotFound)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        let mut user = User::new("Ann".to_string(), "ann@x.com".to_string());
        user.password.set(password).unwrap();
        user
    }

    #[test]
    fn valid_user_passes() {
        let mut v = Validator::new();
        user_with_password("pa55word12").validate(&mut v);
        assert!(v.valid(), "{:?}", v.errors());
    }

    #[test]
    fn invalid_fields_are_reported() {
        let mut user = user_with_password("short");
        user.name = String::new();
        user.email = "not-an-email".to_string();

        let mut v = Validator::new();
        user.validate(&mut v);
        assert_eq!(v.errors()["name"], "must be provided");
        assert_eq!(v.errors()["email"], "must be a valid email address");
        assert_eq!(v.errors()["password"], "must be at least 8 bytes long");
    }

    #[test]
    #[should_panic(expected = "missing password hash for user")]
    fn user_without_hash_is_a_bug() {
        let user = User::new("Ann".to_string(), "ann@x.com".to_string());
        user.validate(&mut Validator::new());
    }

    #[test]
    fn json_never_contains_password_or_version() {
        let user = user_with_password("pa55word12");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("version").is_none());
        assert_eq!(json["activated"], false);
        assert_eq!(json["email"], "ann@x.com");
    }
}
