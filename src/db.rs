use anyhow::Context;
use sqlx::PgPool;

const SCHEMA_LOCK_KEY: i64 = 0x7669_7461_6c69;

/// PostgreSQL DDL for every table the stores touch. Idempotent.
///
/// Uniqueness of `users.username`, `users.email` and `user_profiles.user_id`
/// is what makes registration and profile upsert safe under concurrency;
/// the application-side existence checks are only a fast path.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    user_type TEXT NOT NULL DEFAULT 'user' CHECK (user_type IN ('user', 'admin')),
    profile_image TEXT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS user_profiles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    full_name TEXT NULL,
    phone TEXT NULL,
    age INTEGER NULL,
    gender TEXT NULL,
    height DOUBLE PRECISION NULL,
    weight DOUBLE PRECISION NULL,
    goal TEXT NULL,
    medical_conditions TEXT NULL,
    dietary_preferences TEXT NULL
);

CREATE TABLE IF NOT EXISTS contact_messages (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT NULL,
    message TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price DOUBLE PRECISION NOT NULL,
    duration_days INTEGER NOT NULL DEFAULT 30,
    features TEXT NULL, -- JSON array of strings
    available_offline BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_contact_messages_created_at ON contact_messages(created_at);
CREATE INDEX IF NOT EXISTS idx_products_created_at ON products(created_at)
"#;

/// Create the tables if they are missing. Concurrent callers serialize on an
/// advisory lock; `CREATE ... IF NOT EXISTS` alone races in PostgreSQL.
pub async fn init_schema(db: &PgPool) -> anyhow::Result<()> {
    let mut tx = db.begin().await.context("begin tx")?;
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await
        .context("take schema lock")?;

    // sqlx prepares each query, so statements go one at a time
    for stmt in SCHEMA.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("init schema: {}", first_line(s)))?;
    }

    tx.commit().await.context("commit tx")?;
    tracing::info!("schema ready");
    Ok(())
}

/// True when the error chain carries a database unique-constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
            .map(|db_err| db_err.is_unique_violation())
            .unwrap_or(false)
    })
}

fn first_line(stmt: &str) -> &str {
    stmt.lines().next().unwrap_or(stmt)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_create_statements() {
        let stmts: Vec<&str> = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(stmts.len(), 6);
        assert!(stmts.iter().all(|s| s.starts_with("CREATE")));
    }

    #[test]
    fn schema_enforces_identity_uniqueness() {
        assert!(SCHEMA.contains("username TEXT NOT NULL UNIQUE"));
        assert!(SCHEMA.contains("email TEXT NOT NULL UNIQUE"));
        assert!(SCHEMA.contains("user_id UUID NOT NULL UNIQUE"));
    }

    #[test]
    fn plain_errors_are_not_unique_violations() {
        let err = anyhow::anyhow!("boom");
        assert!(!is_unique_violation(&err));
        let err = anyhow::Error::new(sqlx::Error::RowNotFound).context("lookup");
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn test_database_is_optional_unless_required() {
        use std::collections::HashMap;
        let env = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };

        let set = env(&[("TEST_DATABASE_URL", "postgres://localhost/t")]);
        assert_eq!(
            test_support::database_url(|k| set.get(k).cloned()).as_deref(),
            Some("postgres://localhost/t")
        );

        let unset = env(&[("TEST_DATABASE_URL", " ")]);
        assert!(test_support::database_url(|k| unset.get(k).cloned()).is_none());

        let required = env(&[("REQUIRE_TEST_DATABASE", "1")]);
        let outcome = std::panic::catch_unwind(|| {
            test_support::database_url(|k| required.get(k).cloned())
        });
        assert!(outcome.is_err());
    }
}
