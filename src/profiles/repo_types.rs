use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Mutable profile fields. All optional and stored as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProfileFields {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub goal: Option<String>,
    pub medical_conditions: Option<String>,
    pub dietary_preferences: Option<String>,
}

/// One row of `user_profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: ProfileFields,
}
