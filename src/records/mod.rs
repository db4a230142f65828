//! Generic list/count/delete over simple tables, plus the two auxiliary
//! stores built on it.

use anyhow::Context;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

pub mod contact;
pub mod products;

/// A row type read straight out of one table.
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    /// Select list, in the shape `FromRow` expects.
    const COLUMNS: &'static str;
    /// Optional `WHERE` predicate applied by [`list_all`].
    const LIST_FILTER: Option<&'static str> = None;
    /// Newest first. Rows sharing a `created_at` (e.g. written in one
    /// transaction) fall back to `id`, which is stable across calls but
    /// says nothing about insertion order.
    const ORDER_BY: &'static str = "created_at DESC, id DESC";
}

pub(crate) fn list_sql<R: Record>() -> String {
    let mut sql = format!("SELECT {} FROM {}", R::COLUMNS, R::TABLE);
    if let Some(filter) = R::LIST_FILTER {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(R::ORDER_BY);
    sql
}

pub async fn list_all<R: Record>(db: &PgPool) -> anyhow::Result<Vec<R>> {
    let rows = sqlx::query_as::<_, R>(&list_sql::<R>())
        .fetch_all(db)
        .await
        .with_context(|| format!("list {}", R::TABLE))?;
    Ok(rows)
}

/// Counts every row of the table, ignoring `LIST_FILTER`.
pub async fn count<R: Record>(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", R::TABLE))
        .fetch_one(db)
        .await
        .with_context(|| format!("count {}", R::TABLE))?;
    Ok(n)
}

/// Hard delete by primary key. Returns whether a row was removed.
pub async fn delete_by_id<R: Record>(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", R::TABLE))
        .bind(id)
        .execute(db)
        .await
        .with_context(|| format!("delete from {}", R::TABLE))?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(FromRow)]
    #[allow(dead_code)]
    struct Plain {
        id: Uuid,
    }

    impl Record for Plain {
        const TABLE: &'static str = "plain";
        const COLUMNS: &'static str = "id";
    }

    #[derive(FromRow)]
    #[allow(dead_code)]
    struct Filtered {
        id: Uuid,
    }

    impl Record for Filtered {
        const TABLE: &'static str = "filtered";
        const COLUMNS: &'static str = "id";
        const LIST_FILTER: Option<&'static str> = Some("visible = TRUE");
        const ORDER_BY: &'static str = "id ASC";
    }

    #[test]
    fn list_sql_defaults_to_newest_first() {
        assert_eq!(
            list_sql::<Plain>(),
            "SELECT id FROM plain ORDER BY created_at DESC, id DESC"
        );
    }

    #[test]
    fn list_sql_applies_filter_before_order() {
        assert_eq!(
            list_sql::<Filtered>(),
            "SELECT id FROM filtered WHERE visible = TRUE ORDER BY id ASC"
        );
    }
}
