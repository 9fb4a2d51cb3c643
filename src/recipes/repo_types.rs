use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Which generation path produced a saved recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Original,
    Local,
    Sustainable,
}

impl Route {
    /// Enumeration order, also the tie-break order for aggregates.
    pub const ALL: [Route; 3] = [Route::Original, Route::Local, Route::Sustainable];

    pub fn as_str(self) -> &'static str {
        match self {
            Route::Original => "original",
            Route::Local => "local",
            Route::Sustainable => "sustainable",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid route {0:?}, expected one of original, local, sustainable")]
pub struct InvalidRoute(pub String);

impl FromStr for Route {
    type Err = InvalidRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| InvalidRoute(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub dish_name: String,
    pub ingredients: Vec<String>,
    pub recipe_steps: Vec<String>,
    pub user_id: String,
    pub route: Route,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated recipe ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub dish_name: String,
    pub ingredients: Vec<String>,
    pub recipe_steps: Vec<String>,
    pub user_id: String,
    pub route: Route,
}

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub dish_name: String,
    pub ingredients: Json<Vec<String>>,
    pub recipe_steps: Json<Vec<String>>,
    pub user_id: String,
    pub route: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = InvalidRoute;

    fn try_from(r: RecipeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            dish_name: r.dish_name,
            ingredients: r.ingredients.0,
            recipe_steps: r.recipe_steps.0,
            user_id: r.user_id,
            route: r.route.parse()?,
            created_at: r.created_at,
        })
    }
}

#[cfg(test)]
mod route_tests {
    use super::*;

    #[test]
    fn parses_known_routes() {
        assert_eq!("original".parse::<Route>().unwrap(), Route::Original);
        assert_eq!("local".parse::<Route>().unwrap(), Route::Local);
        assert_eq!("sustainable".parse::<Route>().unwrap(), Route::Sustainable);
    }

    #[test]
    fn rejects_unknown_and_differently_cased_routes() {
        assert!("seasonal".parse::<Route>().is_err());
        assert!("Original".parse::<Route>().is_err());
        let err = "".parse::<Route>().unwrap_err();
        assert!(err.to_string().contains("expected one of"));
    }

    #[test]
    fn row_with_corrupt_route_is_rejected() {
        let row = RecipeRow {
            id: Uuid::new_v4(),
            dish_name: "Soup".into(),
            ingredients: Json(vec!["water".into()]),
            recipe_steps: Json(vec![]),
            user_id: "u1".into(),
            route: "teleport".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        assert!(Recipe::try_from(row).is_err());
    }
}
