use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Stored user record. `num_recipe` is owned by the recipe repository.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub user_email: String,
    pub user_name: String,
    pub num_recipe: i64,
    pub streak: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Client-writable user fields, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFields {
    pub user_id: String,
    pub user_email: String,
    pub user_name: String,
    pub streak: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Upserted {
    pub user: User,
    pub created: bool,
}
