use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    error::AppError,
    recipes::{
        dto::{CreateRecipeRequest, RecipeCreated, RouteStats},
        repo_types::Recipe,
        services::most_common_route,
    },
    state::AppState,
    users::handlers::json_body,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/user/:id", get(list_user_recipes))
        .route("/users/:id/most-common-route", get(get_most_common_route))
}

/// POST /recipes. The owner must exist; their recipe counter is bumped.
#[instrument(skip(state, body))]
pub async fn create_recipe(
    State(state): State<AppState>,
    body: Result<Json<CreateRecipeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeCreated>), AppError> {
    let recipe = json_body(body)?.validate()?;
    let recipe = state.recipes.create_recipe(&recipe).await?;

    info!(recipe_id = %recipe.id, user_id = %recipe.user_id, route = %recipe.route, "recipe created");
    Ok((
        StatusCode::CREATED,
        Json(RecipeCreated {
            status: "success",
            recipe,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_user_recipes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let recipes = state.recipes.list_recipes_by_user(&user_id).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
pub async fn get_most_common_route(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<RouteStats>, AppError> {
    if state.users.get_user(&user_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "User not found with ID: {user_id}"
        )));
    }
    let recipes = state.recipes.list_recipes_by_user(&user_id).await?;
    Ok(Json(most_common_route(&recipes)))
}
