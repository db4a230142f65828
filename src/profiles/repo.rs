use anyhow::Context;
use sqlx::{postgres::PgArguments, query::Query, PgPool, Postgres};
use uuid::Uuid;

use crate::profiles::repo_types::{Profile, ProfileFields};

/// Mutable columns in bind order. [`bind_fields`] must follow this list.
pub(crate) const PROFILE_COLUMNS: [&str; 9] = [
    "full_name",
    "phone",
    "age",
    "gender",
    "height",
    "weight",
    "goal",
    "medical_conditions",
    "dietary_preferences",
];

/// Binds `fields` in `PROFILE_COLUMNS` order.
fn bind_fields<'q>(
    query: Query<'q, Postgres, PgArguments>,
    fields: ProfileFields,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(fields.full_name)
        .bind(fields.phone)
        .bind(fields.age)
        .bind(fields.gender)
        .bind(fields.height)
        .bind(fields.weight)
        .bind(fields.goal)
        .bind(fields.medical_conditions)
        .bind(fields.dietary_preferences)
}

/// `UPDATE` with the fields at `$1..$9` and `user_id` last.
pub(crate) fn update_sql() -> String {
    let assignments: Vec<String> = PROFILE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{col} = ${}", i + 1))
        .collect();
    format!(
        "UPDATE user_profiles SET {} WHERE user_id = ${}",
        assignments.join(", "),
        PROFILE_COLUMNS.len() + 1
    )
}

/// `INSERT` with `user_id` at `$1` and the fields after it. A row inserted
/// concurrently for the same account is updated instead.
pub(crate) fn insert_sql() -> String {
    let placeholders: Vec<String> = (1..=PROFILE_COLUMNS.len() + 1)
        .map(|i| format!("${i}"))
        .collect();
    let on_conflict: Vec<String> = PROFILE_COLUMNS
        .iter()
        .map(|col| format!("{col} = EXCLUDED.{col}"))
        .collect();
    format!(
        "INSERT INTO user_profiles (user_id, {}) VALUES ({}) ON CONFLICT (user_id) DO UPDATE SET {}",
        PROFILE_COLUMNS.join(", "),
        placeholders.join(", "),
        on_conflict.join(", ")
    )
}

pub(crate) fn select_sql() -> String {
    format!(
        "SELECT id, user_id, {} FROM user_profiles WHERE user_id = $1",
        PROFILE_COLUMNS.join(", ")
    )
}

impl Profile {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&select_sql())
            .bind(user_id)
            .fetch_optional(db)
            .await
            .context("find profile by user")?;
        Ok(profile)
    }

    /// Insert or update the single profile row of `user_id` in one transaction.
    /// Returns `true` when an existing row was updated.
    pub async fn upsert(db: &PgPool, user_id: Uuid, fields: ProfileFields) -> anyhow::Result<bool> {
        let mut tx = db.begin().await.context("begin tx")?;

        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM user_profiles WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .context("lock profile row")?;

        let sql = if existing.is_some() { update_sql() } else { insert_sql() };
        let query = if existing.is_some() {
            bind_fields(sqlx::query(&sql), fields).bind(user_id)
        } else {
            bind_fields(sqlx::query(&sql).bind(user_id), fields)
        };
        query.execute(&mut *tx).await.context("write profile")?;

        tx.commit().await.context("commit tx")?;
        Ok(existing.is_some())
    }
}
