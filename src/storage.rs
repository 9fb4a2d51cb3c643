use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::recipes::repo_types::{NewRecipe, Recipe};
use crate::users::repo_types::{Upserted, User, UserFields};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;
    /// Fails with `Conflict` when the id is taken.
    async fn create_user(&self, fields: &UserFields) -> Result<User, StoreError>;
    /// Merges the fields into an existing user or creates one. Never touches
    /// `num_recipe` or `created_at` of an existing user.
    async fn upsert_user(&self, fields: &UserFields) -> Result<Upserted, StoreError>;
}

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    /// Inserts the recipe and bumps the owner's `num_recipe` in one atomic
    /// step. Fails with `NotFound` and writes nothing when the user is absent.
    async fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError>;
    /// Newest first.
    async fn list_recipes_by_user(&self, user_id: &str) -> Result<Vec<Recipe>, StoreError>;
}

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    recipes: Vec<Recipe>,
}

/// Process-local store for development runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_user(fields: &UserFields, now: OffsetDateTime) -> User {
    User {
        user_id: fields.user_id.clone(),
        user_email: fields.user_email.clone(),
        user_name: fields.user_name.clone(),
        num_recipe: 0,
        streak: fields.streak.unwrap_or(0),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().await.users.get(user_id).cloned())
    }

    async fn create_user(&self, fields: &UserFields) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.users.contains_key(&fields.user_id) {
            return Err(StoreError::Conflict(format!("user {}", fields.user_id)));
        }
        let user = new_user(fields, OffsetDateTime::now_utc());
        inner.users.insert(user.user_id.clone(), user.clone());
        Ok(user)
    }

    async fn upsert_user(&self, fields: &UserFields) -> Result<Upserted, StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.inner.lock().await;
        match inner.users.get_mut(&fields.user_id) {
            Some(user) => {
                user.user_email = fields.user_email.clone();
                user.user_name = fields.user_name.clone();
                if let Some(streak) = fields.streak {
                    user.streak = streak;
                }
                user.updated_at = now;
                Ok(Upserted {
                    user: user.clone(),
                    created: false,
                })
            }
            None => {
                let user = new_user(fields, now);
                inner.users.insert(user.user_id.clone(), user.clone());
                Ok(Upserted {
                    user,
                    created: true,
                })
            }
        }
    }
}

#[async_trait]
impl RecipeRepo for MemoryStore {
    async fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .get_mut(&recipe.user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", recipe.user_id)))?;
        user.num_recipe += 1;

        let stored = Recipe {
            id: Uuid::new_v4(),
            dish_name: recipe.dish_name.clone(),
            ingredients: recipe.ingredients.clone(),
            recipe_steps: recipe.recipe_steps.clone(),
            user_id: recipe.user_id.clone(),
            route: recipe.route,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.recipes.push(stored.clone());
        Ok(stored)
    }

    async fn list_recipes_by_user(&self, user_id: &str) -> Result<Vec<Recipe>, StoreError> {
        let inner = self.inner.lock().await;
        // insertion order is creation order
        Ok(inner
            .recipes
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}
