use async_trait::async_trait;
use sqlx::FromRow;

use crate::db::PgStore;
use crate::error::StoreError;
use crate::storage::UserRepo;
use crate::users::repo_types::{Upserted, User, UserFields};

#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    user: User,
    inserted: bool,
}

#[async_trait]
impl UserRepo for PgStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, user_email, user_name, num_recipe, streak, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, fields: &UserFields) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, user_email, user_name, streak)
            VALUES ($1, $2, $3, COALESCE($4::BIGINT, 0))
            ON CONFLICT (user_id) DO NOTHING
            RETURNING user_id, user_email, user_name, num_recipe, streak, created_at, updated_at
            "#,
        )
        .bind(&fields.user_id)
        .bind(&fields.user_email)
        .bind(&fields.user_name)
        .bind(fields.streak)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| StoreError::Conflict(format!("user {}", fields.user_id)))
    }

    async fn upsert_user(&self, fields: &UserFields) -> Result<Upserted, StoreError> {
        // xmax = 0 only for freshly inserted tuples
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO users (user_id, user_email, user_name, streak)
            VALUES ($1, $2, $3, COALESCE($4::BIGINT, 0))
            ON CONFLICT (user_id) DO UPDATE
               SET user_email = EXCLUDED.user_email,
                   user_name  = EXCLUDED.user_name,
                   streak     = COALESCE($4::BIGINT, users.streak),
                   updated_at = now()
            RETURNING user_id, user_email, user_name, num_recipe, streak, created_at, updated_at,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(&fields.user_id)
        .bind(&fields.user_email)
        .bind(&fields.user_name)
        .bind(fields.streak)
        .fetch_one(&self.pool)
        .await?;

        Ok(Upserted {
            user: row.user,
            created: row.inserted,
        })
    }
}
