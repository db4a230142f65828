use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{Account, Role};

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password AS password_hash, user_type AS role, profile_image, created_at";

impl Account {
    /// Find an account by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find account by email")?;
        Ok(account)
    }

    /// Find an account by primary key.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find account by id")?;
        Ok(account)
    }

    /// Whether any account already holds this email or this username.
    pub async fn identity_taken(db: &PgPool, email: &str, username: &str) -> anyhow::Result<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM users
            WHERE email = $1 OR username = $2
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(username)
        .fetch_optional(db)
        .await
        .context("check existing identity")?;
        Ok(row.is_some())
    }

    /// Insert a new account with an already hashed password.
    pub async fn insert(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Account> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO users (username, email, password, user_type)
            VALUES ($1, $2, $3, $4)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(db)
        .await
        .context("insert account")?;
        Ok(account)
    }

    /// Set or clear the stored profile image reference. Returns whether a row changed.
    pub async fn update_profile_image(
        db: &PgPool,
        id: Uuid,
        profile_image: Option<&str>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET profile_image = $1 WHERE id = $2")
            .bind(profile_image)
            .bind(id)
            .execute(db)
            .await
            .context("update profile image")?;
        Ok(result.rows_affected() == 1)
    }
}
