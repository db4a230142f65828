use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::Record;

pub const DEFAULT_DURATION_DAYS: i32 = 30;

/// Catalog row as stored; `features` is a JSON array in text form.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_days: i32,
    pub features: Option<String>,
    pub available_offline: bool,
    pub created_at: OffsetDateTime,
}

impl Record for ProductRow {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static str =
        "id, name, description, price, duration_days, features, available_offline, created_at";
    const LIST_FILTER: Option<&'static str> = Some("available_offline = TRUE");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_days: i32,
    pub features: Vec<String>,
    pub available_offline: bool,
    pub created_at: OffsetDateTime,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        let features = decode_features(r.id, r.features.as_deref());
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            duration_days: r.duration_days,
            features,
            available_offline: r.available_offline,
            created_at: r.created_at,
        }
    }
}

/// Missing, blank or unreadable feature text reads as no features.
fn decode_features(id: Uuid, raw: Option<&str>) -> Vec<String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Vec::new(),
        Some(raw) => raw,
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(product_id = %id, error = %e, "unreadable product features");
        Vec::new()
    })
}

fn encode_features(features: &[String]) -> anyhow::Result<String> {
    serde_json::to_string(features).context("encode product features")
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default = "default_duration")]
    pub duration_days: i32,
    #[serde(default)]
    pub features: Vec<String>,
}
fn default_duration() -> i32 { DEFAULT_DURATION_DAYS }

impl NewProduct {
    pub fn new(name: &str, description: &str, price: f64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            price,
            duration_days: DEFAULT_DURATION_DAYS,
            features: Vec::new(),
        }
    }
}

impl ProductRow {
    pub async fn insert(db: &PgPool, p: &NewProduct) -> anyhow::Result<Uuid> {
        let features = encode_features(&p.features)?;
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (name, description, price, duration_days, features)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.price)
        .bind(p.duration_days)
        .bind(features)
        .fetch_one(db)
        .await
        .context("insert product")?;
        Ok(id)
    }

    pub async fn update_availability(db: &PgPool, id: Uuid, available: bool) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE products SET available_offline = $1 WHERE id = $2")
            .bind(available)
            .bind(id)
            .execute(db)
            .await
            .context("update product availability")?;
        Ok(result.rows_affected() == 1)
    }
}

#[instrument(skip(db, product), fields(name = %product.name))]
pub async fn create(db: &PgPool, product: NewProduct) -> bool {
    match ProductRow::insert(db, &product).await {
        Ok(id) => {
            info!(product_id = %id, "product created");
            true
        }
        Err(e) => {
            error!(error = %e, "create product failed");
            false
        }
    }
}

/// Offline-available products, newest first, features decoded.
#[instrument(skip(db))]
pub async fn list_available(db: &PgPool) -> Vec<Product> {
    match super::list_all::<ProductRow>(db).await {
        Ok(rows) => rows.into_iter().map(Product::from).collect(),
        Err(e) => {
            error!(error = %e, "list products failed");
            Vec::new()
        }
    }
}

/// Every product, available or not.
#[instrument(skip(db))]
pub async fn count(db: &PgPool) -> i64 {
    super::count::<ProductRow>(db).await.unwrap_or_else(|e| {
        error!(error = %e, "count products failed");
        0
    })
}

/// Hard delete. `false` when nothing was deleted.
#[instrument(skip(db))]
pub async fn delete(db: &PgPool, id: Uuid) -> bool {
    match super::delete_by_id::<ProductRow>(db, id).await {
        Ok(true) => {
            info!("product deleted");
            true
        }
        Ok(false) => {
            warn!("product delete: no such product");
            false
        }
        Err(e) => {
            error!(error = %e, "delete product failed");
            false
        }
    }
}

#[instrument(skip(db))]
pub async fn set_availability(db: &PgPool, id: Uuid, available: bool) -> bool {
    ProductRow::update_availability(db, id, available)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "update product availability failed");
            false
        })
}
