use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::llm::{parse_reply, ModelError};

/// Recognition result for a photographed dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishScan {
    pub food_name: String,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<String>,
    #[serde(deserialize_with = "text_or_lines")]
    pub recipe: String,
}

/// A dish rewritten by the model, with its explanation of the changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(flatten)]
    pub dish: DishScan,
    #[serde(alias = "sustainable_choice", alias = "seasonal_choice")]
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientAssessment {
    pub ingredient: String,
    pub carbon_emissions: Rating,
    pub water_usage: Rating,
    pub food_miles: Rating,
}

/// Models sometimes answer a list request with a single object.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(v: OneOrMany<T>) -> Self {
        match v {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

/// Outcome of one model-backed stage.
///
/// `Ok` carries the parsed value next to the raw text, `Unparsed` means the
/// model answered but not in the expected shape, `Failed` means there is no
/// answer at all (model error or the stage was skipped).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Stage<T> {
    Ok { raw: String, data: T },
    Unparsed { raw: String, error: String },
    Failed { error: String },
}

impl<T: DeserializeOwned> Stage<T> {
    pub fn from_raw(raw: String) -> Self {
        match parse_reply::<T>(&raw) {
            Ok(data) => Stage::Ok { raw, data },
            Err(e) => Stage::Unparsed {
                raw,
                error: e.to_string(),
            },
        }
    }

    pub fn from_reply(reply: Result<String, ModelError>) -> Self {
        match reply {
            Ok(raw) => Self::from_raw(raw),
            Err(e) => Stage::failed(e.to_string()),
        }
    }
}

impl<T> Stage<T> {
    pub fn failed(error: impl Into<String>) -> Self {
        Stage::Failed {
            error: error.into(),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Stage::Ok { raw, .. } | Stage::Unparsed { raw, .. } => Some(raw),
            Stage::Failed { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Stage::Ok { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Stage<U> {
        match self {
            Stage::Ok { raw, data } => Stage::Ok { raw, data: f(data) },
            Stage::Unparsed { raw, error } => Stage::Unparsed { raw, error },
            Stage::Failed { error } => Stage::Failed { error },
        }
    }
}

impl<T> Stage<OneOrMany<T>> {
    /// Keeps the first item of a list reply. An empty list counts as unparsed.
    pub(crate) fn into_first(self) -> Stage<T> {
        match self {
            Stage::Ok { raw, data } => match Vec::from(data).into_iter().next() {
                Some(data) => Stage::Ok { raw, data },
                None => Stage::Unparsed {
                    raw,
                    error: "reply is an empty list".into(),
                },
            },
            Stage::Unparsed { raw, error } => Stage::Unparsed { raw, error },
            Stage::Failed { error } => Stage::Failed { error },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub zipcode: String,
    pub original_result: Stage<DishScan>,
    pub original_ingredient_info: Stage<Vec<IngredientAssessment>>,
    pub sustainable_result: Stage<Variant>,
    pub sustainable_ingredient_info: Stage<Vec<IngredientAssessment>>,
    pub seasonal_result: Stage<Variant>,
    pub seasonal_ingredient_info: Stage<Vec<IngredientAssessment>>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct FinalRecipeResponse {
    pub response: String,
    pub recipe: Stage<FinalRecipe>,
}

/// Accepts a plain string or a list of lines.
fn text_or_lines<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        One(String),
        Lines(Vec<String>),
    }
    Ok(match Text::deserialize(de)? {
        Text::One(s) => s,
        Text::Lines(lines) => lines.join("\n"),
    })
}
