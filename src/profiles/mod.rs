//! One profile record per account, created on first save and mutated in
//! place afterwards.

pub mod repo;
pub mod repo_types;

use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub use repo_types::{Profile, ProfileFields};

/// The saved profile, or `None` when the account never saved one.
#[instrument(skip(db))]
pub async fn get(db: &PgPool, account_id: Uuid) -> Option<Profile> {
    Profile::find_by_user(db, account_id).await.unwrap_or_else(|e| {
        error!(error = %e, "get profile failed");
        None
    })
}

/// Upsert every mutable field. `false` on any storage fault, including an
/// unknown account.
#[instrument(skip(db, fields))]
pub async fn save(db: &PgPool, account_id: Uuid, fields: ProfileFields) -> bool {
    match Profile::upsert(db, account_id, fields).await {
        Ok(updated) => {
            debug!(updated, "profile saved");
            true
        }
        Err(e) => {
            error!(error = %e, "save profile failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::repo::{insert_sql, select_sql, update_sql, PROFILE_COLUMNS};
    use super::*;
    use crate::auth::repo_types::NewAccount;
    use crate::auth::services;
    use crate::db::test_support;

    /// Position of `needle` in `haystack`, panicking with context when absent.
    fn pos(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} missing from {haystack:?}"))
    }

    #[test]
    fn update_assigns_columns_to_matching_placeholders() {
        let sql = update_sql();
        let assignments = &sql["UPDATE user_profiles SET ".len()..pos(&sql, " WHERE")];
        let parsed: Vec<&str> = assignments.split(", ").collect();
        assert_eq!(parsed.len(), PROFILE_COLUMNS.len());
        for (i, (assignment, col)) in parsed.iter().zip(PROFILE_COLUMNS).enumerate() {
            assert_eq!(*assignment, format!("{col} = ${}", i + 1));
        }
        assert!(sql.ends_with("WHERE user_id = $10"));
    }

    #[test]
    fn insert_lists_user_id_then_columns_in_order() {
        let sql = insert_sql();
        assert!(sql.starts_with(
            "INSERT INTO user_profiles (user_id, full_name, phone, age, gender, height, weight, goal, medical_conditions, dietary_preferences) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ));
        assert!(sql.contains("ON CONFLICT (user_id) DO UPDATE SET full_name = EXCLUDED.full_name"));
        assert!(sql.ends_with("dietary_preferences = EXCLUDED.dietary_preferences"));
    }

    #[test]
    fn column_list_matches_struct_field_order() {
        let json = serde_json::to_string(&ProfileFields::default()).unwrap();
        let mut last = 0;
        for col in PROFILE_COLUMNS {
            let at = pos(&json, &format!("\"{col}\""));
            assert!(at >= last, "{col} out of order in {json}");
            last = at;
        }
        let sql = select_sql();
        assert!(sql.starts_with("SELECT id, user_id, full_name, phone"));
    }

    fn distinct_fields(tag: &str) -> ProfileFields {
        // every field gets a value that can only land in its own column
        ProfileFields {
            full_name: Some(format!("{tag} name")),
            phone: Some(format!("{tag} phone")),
            age: Some(31),
            gender: Some(format!("{tag} gender")),
            height: Some(172.5),
            weight: Some(68.25),
            goal: Some(format!("{tag} goal")),
            medical_conditions: Some(format!("{tag} conditions")),
            dietary_preferences: Some(format!("{tag} diet")),
        }
    }

    async fn new_account(db: &PgPool, prefix: &str) -> Uuid {
        let name = format!("{prefix}_{}", test_support::unique_suffix());
        let input = NewAccount::user(&name, &format!("{name}@x.com"), "secret1");
        services::register(db, input).await.expect("register").id
    }

    #[tokio::test]
    async fn get_without_save_is_none() {
        let Some(db) = test_support::pool().await else { return };
        let id = new_account(&db, "noprof").await;
        assert!(get(&db, id).await.is_none());
    }

    #[tokio::test]
    async fn second_save_updates_the_single_row() {
        let Some(db) = test_support::pool().await else { return };
        let id = new_account(&db, "prof").await;

        let first = distinct_fields("first");
        assert!(save(&db, id, first.clone()).await);
        let saved = get(&db, id).await.expect("first save");
        assert_eq!(saved.user_id, id);
        assert_eq!(saved.fields, first);

        let mut second = distinct_fields("second");
        second.age = Some(32);
        second.height = None;
        assert!(save(&db, id, second.clone()).await);
        let updated = get(&db, id).await.expect("second save");
        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.fields, second);

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_profiles WHERE user_id = $1")
            .bind(id)
            .fetch_one(&db)
            .await
            .expect("count");
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn concurrent_first_saves_leave_one_row() {
        let Some(db) = test_support::pool().await else { return };
        let id = new_account(&db, "profrace").await;

        let (a, b) = tokio::join!(
            save(&db, id, distinct_fields("a")),
            save(&db, id, distinct_fields("b")),
        );
        assert!(a && b);
        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_profiles WHERE user_id = $1")
            .bind(id)
            .fetch_one(&db)
            .await
            .expect("count");
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn save_for_unknown_account_fails() {
        let Some(db) = test_support::pool().await else { return };
        assert!(!save(&db, Uuid::new_v4(), ProfileFields::default()).await);
    }
}
