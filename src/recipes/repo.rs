use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::StoreError;
use crate::recipes::repo_types::{NewRecipe, Recipe, RecipeRow};
use crate::storage::RecipeRepo;

fn into_recipe(row: RecipeRow) -> Result<Recipe, StoreError> {
    Recipe::try_from(row).map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

#[async_trait]
impl RecipeRepo for PgStore {
    async fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError> {
        let mut tx = self.pool.begin().await?;

        // row lock on the user serialises concurrent creations
        let bumped = sqlx::query(
            r#"
            UPDATE users
               SET num_recipe = num_recipe + 1
             WHERE user_id = $1
            "#,
        )
        .bind(&recipe.user_id)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!("user {}", recipe.user_id)));
        }

        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            INSERT INTO recipes (id, dish_name, ingredients, recipe_steps, user_id, route)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, dish_name, ingredients, recipe_steps, user_id, route, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&recipe.dish_name)
        .bind(Json(&recipe.ingredients))
        .bind(Json(&recipe.recipe_steps))
        .bind(&recipe.user_id)
        .bind(recipe.route.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        into_recipe(row)
    }

    async fn list_recipes_by_user(&self, user_id: &str) -> Result<Vec<Recipe>, StoreError> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, dish_name, ingredients, recipe_steps, user_id, route, created_at
              FROM recipes
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_recipe).collect()
    }
}
