//! Instructions sent to the model for each pipeline stage.

pub const EXTRACT_MENU_TEXT: &str = "\
Extract the text of the menu description of the food shown in this image. \
Return only the extracted text.";

const IDENTIFY_DISH: &str = r#"Identify the food dish in the image.
Respond with a single JSON object of this shape:
{
    "food_name": string,
    "description": string,
    "ingredients": [string],
    "recipe": string
}"#;

const SUSTAINABLE_VARIANT: &str = r#"Rewrite the recipe given below so that it favours more sustainable ingredients,
meaning lower carbon emissions and lower water use during production.
Swap produce and other ingredients for alternatives with a smaller environmental
footprint while keeping the character of the dish.

Rules:
- When no sensible sustainable replacement exists, keep the original ingredient.
- The result must still be the same dish.

Respond with a single JSON object of this shape:
{
    "food_name": string,
    "ingredients": [string],
    "recipe": string,
    "sustainable_choice": string
}
"sustainable_choice" explains every substitution: the environmental impact of the
original ingredient and the benefit of its replacement."#;

const INGREDIENT_ASSESSMENT: &str = r#"For every ingredient in the list given below, rate its environmental impact
as "high", "medium" or "low" for each of:
- carbon emissions
- water usage
- food miles

Respond with a JSON array, one object per ingredient:
[
    {
        "ingredient": string,
        "carbon_emissions": "high" | "medium" | "low",
        "water_usage": "high" | "medium" | "low",
        "food_miles": "high" | "medium" | "low"
    }
]
"ingredient" is the cleaned, standardised ingredient name."#;

pub const FINAL_RECIPE: &str = r#"Using the dish information given below, which contains a basic recipe and an
ingredient list, write a complete step-by-step recipe a beginner can follow.

Include ingredient quantities where possible, cooking times and temperatures,
and clear, short instructions.

Respond with a single JSON object of this shape:
{
    "title": string,
    "ingredients": [string],
    "instructions": [string]
}
"ingredients" carries quantities and cleaned descriptions; "instructions" holds
one step per entry, in order."#;

/// Recognition prompt, prefixed with whatever hints the user supplied.
pub fn identify_dish(menu_text: Option<&str>, user_text: Option<&str>) -> String {
    let mut prompt = String::new();
    if let Some(menu) = menu_text {
        prompt.push_str(&format!("This is the menu description of the dish: {menu}\n"));
    }
    if let Some(user) = user_text {
        prompt.push_str(&format!("This is the user's description of the dish: {user}\n"));
    }
    prompt.push_str(IDENTIFY_DISH);
    prompt
}

pub fn sustainable_variant() -> &'static str {
    SUSTAINABLE_VARIANT
}

pub fn seasonal_variant(zipcode: &str) -> String {
    format!(
        r#"Rewrite the recipe given below for the region of the 5-digit US zip code {zipcode}.
Favour ingredients that are in season right now in that region. Keep the core of
the recipe intact and only replace ingredients with local, seasonal alternatives
where that makes sense.

Rules:
- When no sensible seasonal replacement exists, keep the original ingredient.
- The result must still be the same dish.
- Seasonal reasoning must be specific to that region and the current season.

Respond with a single JSON object of this shape:
{{
    "food_name": string,
    "ingredients": [string],
    "recipe": string,
    "seasonal_choice": string
}}
"seasonal_choice" explains every substitution and why the region and season
motivated it."#
    )
}

pub fn ingredient_assessment() -> &'static str {
    INGREDIENT_ASSESSMENT
}
