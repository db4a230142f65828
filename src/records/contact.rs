use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::Record;

/// Append-only message from the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub created_at: OffsetDateTime,
}

impl Record for ContactMessage {
    const TABLE: &'static str = "contact_messages";
    const COLUMNS: &'static str = "id, name, email, phone, message, created_at";
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl ContactMessage {
    pub async fn insert(db: &PgPool, msg: &NewContactMessage) -> anyhow::Result<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO contact_messages (name, email, phone, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&msg.name)
        .bind(&msg.email)
        .bind(&msg.phone)
        .bind(&msg.message)
        .fetch_one(db)
        .await
        .context("insert contact message")?;
        Ok(id)
    }
}

#[instrument(skip(db, msg))]
pub async fn create(db: &PgPool, msg: NewContactMessage) -> bool {
    match ContactMessage::insert(db, &msg).await {
        Ok(id) => {
            info!(message_id = %id, "contact message stored");
            true
        }
        Err(e) => {
            error!(error = %e, "store contact message failed");
            false
        }
    }
}

/// Newest first.
#[instrument(skip(db))]
pub async fn list_all(db: &PgPool) -> Vec<ContactMessage> {
    super::list_all::<ContactMessage>(db).await.unwrap_or_else(|e| {
        error!(error = %e, "list contact messages failed");
        Vec::new()
    })
}

#[instrument(skip(db))]
pub async fn count(db: &PgPool) -> i64 {
    super::count::<ContactMessage>(db).await.unwrap_or_else(|e| {
        error!(error = %e, "count contact messages failed");
        0
    })
}
