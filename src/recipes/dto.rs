use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::recipes::repo_types::{NewRecipe, Recipe, Route};
use crate::users::dto::required;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    pub dish_name: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub recipe_steps: Option<Vec<String>>,
    pub user_id: Option<String>,
    pub route: Option<String>,
}

impl CreateRecipeRequest {
    pub fn validate(self) -> Result<NewRecipe, AppError> {
        let dish_name = required(self.dish_name, "dishName")?;
        let user_id = required(self.user_id, "userId")?;
        let ingredients = self
            .ingredients
            .ok_or_else(|| AppError::invalid("Missing required field: ingredients"))?;
        let recipe_steps = self
            .recipe_steps
            .ok_or_else(|| AppError::invalid("Missing required field: recipeSteps"))?;
        let route = required(self.route, "route")?
            .parse::<Route>()
            .map_err(|e| AppError::invalid(e.to_string()))?;

        Ok(NewRecipe {
            dish_name,
            ingredients,
            recipe_steps,
            user_id,
            route,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeCreated {
    pub status: &'static str,
    pub recipe: Recipe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStats {
    pub route: Option<Route>,
    pub count: usize,
    pub total: usize,
    pub percentage: f64,
}

#[cfg(test)]
mod recipe_dto_tests {
    use super::*;

    fn full() -> CreateRecipeRequest {
        CreateRecipeRequest {
            dish_name: Some("Chili".into()),
            ingredients: Some(vec!["beans".into()]),
            recipe_steps: Some(vec!["simmer".into()]),
            user_id: Some("u1".into()),
            route: Some("local".into()),
        }
    }

    #[test]
    fn full_request_validates() {
        let r = full().validate().unwrap();
        assert_eq!(r.route, Route::Local);
        assert_eq!(r.dish_name, "Chili");
    }

    #[test]
    fn empty_lists_are_allowed_but_missing_lists_are_not() {
        let mut req = full();
        req.ingredients = Some(vec![]);
        assert!(req.validate().is_ok());

        let mut req = full();
        req.recipe_steps = None;
        assert_eq!(
            req.validate().unwrap_err().to_string(),
            "Missing required field: recipeSteps"
        );
    }

    #[test]
    fn invalid_route_is_rejected() {
        let mut req = full();
        req.route = Some("seasonal".into());
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("invalid route"));
    }
}
