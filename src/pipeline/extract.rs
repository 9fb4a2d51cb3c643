//! Locating the ingredient list inside a model reply.

use serde::Deserialize;

use crate::llm::parse_reply;

const INGREDIENTS_MARKER: &str = r#""ingredients": ["#;
const RECIPE_MARKER: &str = r#""recipe""#;

/// Where the ingredient list came from, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The reply parsed as JSON and carried an `ingredients` array.
    Structured(Vec<String>),
    /// Raw text found between the ingredients and recipe markers.
    Marker(String),
    /// Nothing usable; no assessment should be requested.
    Empty,
}

#[derive(Deserialize)]
struct IngredientsOnly {
    ingredients: Vec<String>,
}

impl Extraction {
    /// Text handed to the assessment prompt.
    pub fn as_context(&self) -> Option<String> {
        match self {
            Extraction::Structured(items) => Some(items.join("\n")),
            Extraction::Marker(block) => Some(block.clone()),
            Extraction::Empty => None,
        }
    }
}

pub fn extract_ingredients(raw: &str) -> Extraction {
    if let Ok(parsed) = parse_reply::<IngredientsOnly>(raw) {
        let items: Vec<String> = parsed
            .ingredients
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        if !items.is_empty() {
            return Extraction::Structured(items);
        }
    }
    marker_extraction(raw)
}

/// Literal search fallback for replies that are not valid JSON.
fn marker_extraction(raw: &str) -> Extraction {
    let Some(start) = raw.find(INGREDIENTS_MARKER) else {
        return Extraction::Empty;
    };
    let from = start + INGREDIENTS_MARKER.len();
    let Some(len) = raw[from..].find(RECIPE_MARKER) else {
        return Extraction::Empty;
    };

    let block = raw[from..from + len]
        .trim()
        .trim_end_matches(',')
        .trim_end()
        .trim_end_matches(']')
        .trim();

    if block.is_empty() {
        Extraction::Empty
    } else {
        Extraction::Marker(block.to_string())
    }
}
