use tracing::{debug, info, warn};

use super::dto::{
    DishScan, FinalRecipe, IngredientAssessment, OneOrMany, ScanResponse, Stage, Variant,
};
use super::extract::{extract_ingredients, Extraction};
use super::prompts;
use crate::llm::{GenerativeModel, InlineImage, ModelError, ModelRequest};

/// Everything the scan pipeline needs from the upload form.
#[derive(Debug, Clone)]
pub struct ScanInput {
    pub image: InlineImage,
    pub menu_text: Option<String>,
    pub user_text: Option<String>,
    pub zipcode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Sustainable,
    Seasonal,
}

impl VariantKind {
    fn label(self) -> &'static str {
        match self {
            VariantKind::Sustainable => "sustainable",
            VariantKind::Seasonal => "seasonal",
        }
    }
}

pub async fn extract_menu_text(
    model: &dyn GenerativeModel,
    image: InlineImage,
) -> Result<String, ModelError> {
    model
        .generate(ModelRequest::text(prompts::EXTRACT_MENU_TEXT).with_image(image))
        .await
}

/// Recognition call. Returns the raw reply; parsing is up to the caller.
pub async fn scan_dish(
    model: &dyn GenerativeModel,
    image: InlineImage,
    menu_text: Option<&str>,
    user_text: Option<&str>,
) -> Result<String, ModelError> {
    let prompt = prompts::identify_dish(menu_text, user_text);
    model
        .generate(ModelRequest::text(prompt).with_image(image).json())
        .await
}

pub async fn generate_variant(
    model: &dyn GenerativeModel,
    kind: VariantKind,
    scan_raw: &str,
    zipcode: &str,
) -> Stage<Variant> {
    let prompt = match kind {
        VariantKind::Sustainable => prompts::sustainable_variant().to_string(),
        VariantKind::Seasonal => prompts::seasonal_variant(zipcode),
    };
    debug!(variant = kind.label(), "generating variant");

    let stage = Stage::from_reply(
        model
            .generate(ModelRequest::text(prompt).with_context(scan_raw).json())
            .await,
    );
    match &stage {
        Stage::Failed { error } => warn!(variant = kind.label(), %error, "variant failed"),
        Stage::Unparsed { error, .. } => {
            warn!(variant = kind.label(), %error, "variant reply not parseable")
        }
        Stage::Ok { .. } => {}
    }
    stage
}

/// Rates the ingredients found in `raw`. No call is made when nothing
/// resembling an ingredient list can be located.
pub async fn assess_ingredients(
    model: &dyn GenerativeModel,
    raw: &str,
) -> Stage<Vec<IngredientAssessment>> {
    let extraction = extract_ingredients(raw);
    if let Extraction::Marker(_) = extraction {
        debug!("ingredients located by marker search");
    }
    let Some(list) = extraction.as_context() else {
        warn!("no ingredient list found in model output");
        return Stage::failed("no ingredient list found in model output");
    };

    let reply = model
        .generate(
            ModelRequest::text(prompts::ingredient_assessment())
                .with_context(list)
                .json(),
        )
        .await;
    Stage::<OneOrMany<IngredientAssessment>>::from_reply(reply).map(Vec::from)
}

/// Assessment of a stage that may not have produced text at all.
async fn assess_stage<T>(
    model: &dyn GenerativeModel,
    stage: &Stage<T>,
    label: &str,
) -> Stage<Vec<IngredientAssessment>> {
    match stage.raw() {
        Some(raw) => assess_ingredients(model, raw).await,
        None => Stage::failed(format!("{label} result unavailable")),
    }
}

/// Full scan: recognition, then both variants, then one assessment per
/// result. Only a failed recognition call aborts the request.
pub async fn run_scan(
    model: &dyn GenerativeModel,
    input: ScanInput,
) -> Result<ScanResponse, ModelError> {
    let ScanInput {
        image,
        menu_text,
        user_text,
        zipcode,
    } = input;

    let scan_raw = scan_dish(model, image, menu_text.as_deref(), user_text.as_deref()).await?;
    let original = Stage::<OneOrMany<DishScan>>::from_raw(scan_raw.clone()).into_first();
    if let Stage::Unparsed { error, .. } = &original {
        warn!(%error, "recognition reply not parseable; continuing with raw text");
    }

    let (sustainable, seasonal) = tokio::join!(
        generate_variant(model, VariantKind::Sustainable, &scan_raw, &zipcode),
        generate_variant(model, VariantKind::Seasonal, &scan_raw, &zipcode),
    );

    let (original_info, sustainable_info, seasonal_info) = tokio::join!(
        assess_stage(model, &original, "original"),
        assess_stage(model, &sustainable, "sustainable"),
        assess_stage(model, &seasonal, "seasonal"),
    );

    info!(
        dish = original.data().map(|d| d.food_name.as_str()).unwrap_or("<unparsed>"),
        %zipcode,
        "scan pipeline finished"
    );

    Ok(ScanResponse {
        zipcode,
        original_result: original,
        original_ingredient_info: original_info,
        sustainable_result: sustainable,
        sustainable_ingredient_info: sustainable_info,
        seasonal_result: seasonal,
        seasonal_ingredient_info: seasonal_info,
    })
}

/// Expands an assembled dish payload into a beginner recipe.
pub async fn final_recipe(
    model: &dyn GenerativeModel,
    payload: &serde_json::Value,
) -> Result<(String, Stage<FinalRecipe>), ModelError> {
    let context = payload.to_string();
    let raw = model
        .generate(
            ModelRequest::text(prompts::FINAL_RECIPE)
                .with_context(context)
                .json(),
        )
        .await?;
    let stage = Stage::from_raw(raw.clone());
    Ok((raw, stage))
}

#[cfg(test)]
pub(crate) mod pipeline_tests {
    use super::*;
    use crate::pipeline::dto::Rating;
    use crate::state::testing::StubModel;
    use bytes::Bytes;

    pub(crate) const SCAN_REPLY: &str = r#"{"food_name": "Beef Chili", "description": "A hearty stew",
        "ingredients": ["beef", "kidney beans", "tomato"], "recipe": "Brown beef, add beans, simmer."}"#;
    const SUSTAINABLE_REPLY: &str = r#"{"food_name": "Bean Chili", "ingredients": ["lentils", "kidney beans", "tomato"],
        "recipe": "Simmer.", "sustainable_choice": "lentils replace beef"}"#;
    const SEASONAL_REPLY: &str = r#"{"food_name": "Squash Chili", "ingredients": ["beef", "squash"],
        "recipe": "Simmer.", "seasonal_choice": "squash is in season"}"#;
    const ASSESSMENT_REPLY: &str = r#"[{"ingredient": "beef", "carbon_emissions": "high",
        "water_usage": "high", "food_miles": "medium"}]"#;

    /// Routes each prompt to a canned reply.
    pub(crate) fn canned(request: &ModelRequest) -> Result<String, ModelError> {
        let p = &request.prompt;
        let reply = if p.contains("Identify the food dish") {
            SCAN_REPLY
        } else if p.contains("sustainable_choice") {
            SUSTAINABLE_REPLY
        } else if p.contains("seasonal_choice") {
            SEASONAL_REPLY
        } else if p.contains("environmental impact") {
            ASSESSMENT_REPLY
        } else if p.contains("beginner") {
            r#"{"title": "Chili", "ingredients": ["1 lb beef"], "instructions": ["Brown the beef."]}"#
        } else {
            "MENU: chili con carne"
        };
        Ok(reply.to_string())
    }

    fn input() -> ScanInput {
        ScanInput {
            image: InlineImage {
                mime_type: "image/jpeg".into(),
                data: Bytes::from_static(b"\xff\xd8"),
            },
            menu_text: Some("house chili".into()),
            user_text: None,
            zipcode: "60201".into(),
        }
    }

    #[tokio::test]
    async fn full_scan_makes_six_calls_and_parses_everything() {
        let model = StubModel::new(canned);
        let res = run_scan(model.as_ref(), input()).await.unwrap();

        assert_eq!(model.calls(), 6);
        assert_eq!(res.original_result.data().unwrap().food_name, "Beef Chili");
        assert_eq!(
            res.sustainable_result.data().unwrap().rationale,
            "lentils replace beef"
        );
        assert_eq!(
            res.seasonal_result.data().unwrap().dish.food_name,
            "Squash Chili"
        );
        let info = res.original_ingredient_info.data().unwrap();
        assert_eq!(info[0].carbon_emissions, Rating::High);
        assert!(model.prompts()[0].contains("house chili"));
    }

    #[tokio::test]
    async fn seasonal_prompt_carries_zipcode() {
        let model = StubModel::new(canned);
        let mut i = input();
        i.zipcode = "94110".into();
        run_scan(model.as_ref(), i).await.unwrap();
        assert!(model.prompts().iter().any(|p| p.contains("zip code 94110")));
    }

    #[tokio::test]
    async fn recognition_failure_aborts_before_variants() {
        let model = StubModel::new(|_| Err(ModelError::EmptyResponse));
        let err = run_scan(model.as_ref(), input()).await.unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn failed_variant_does_not_block_its_sibling() {
        let model = StubModel::new(|req| {
            if req.prompt.contains("sustainable_choice") {
                Err(ModelError::Status {
                    status: 503,
                    body: "overloaded".into(),
                })
            } else {
                canned(req)
            }
        });
        let res = run_scan(model.as_ref(), input()).await.unwrap();

        assert!(matches!(res.sustainable_result, Stage::Failed { .. }));
        assert!(matches!(
            res.sustainable_ingredient_info,
            Stage::Failed { ref error } if error.contains("sustainable result unavailable")
        ));
        assert!(res.seasonal_result.data().is_some());
        assert!(res.seasonal_ingredient_info.data().is_some());
        // recognition, two variants, two assessments
        assert_eq!(model.calls(), 5);
    }

    #[tokio::test]
    async fn unparseable_recognition_still_feeds_variants() {
        let model = StubModel::new(|req| {
            if req.prompt.contains("Identify the food dish") {
                Ok("Looks like a bowl of chili to me.".to_string())
            } else {
                canned(req)
            }
        });
        let res = run_scan(model.as_ref(), input()).await.unwrap();

        assert!(matches!(res.original_result, Stage::Unparsed { .. }));
        assert!(matches!(res.original_ingredient_info, Stage::Failed { .. }));
        assert!(res.sustainable_result.data().is_some());
        // assessment skipped for the prose recognition reply
        assert_eq!(model.calls(), 5);
    }

    fn contexts_for(model: &StubModel, needle: &str) -> Vec<Option<String>> {
        model
            .requests()
            .into_iter()
            .filter(|r| r.prompt.contains(needle))
            .map(|r| r.context)
            .collect()
    }

    #[tokio::test]
    async fn variants_are_given_the_recognition_reply() {
        let model = StubModel::new(canned);
        run_scan(model.as_ref(), input()).await.unwrap();

        for needle in ["sustainable_choice", "seasonal_choice"] {
            assert_eq!(
                contexts_for(&model, needle),
                vec![Some(SCAN_REPLY.to_string())],
                "{needle} variant context"
            );
        }
    }

    #[tokio::test]
    async fn assessment_is_given_the_structured_ingredient_list() {
        let model = StubModel::new(canned);
        assess_ingredients(model.as_ref(), SCAN_REPLY).await;

        assert_eq!(
            contexts_for(&model, "rate its environmental impact"),
            vec![Some("beef\nkidney beans\ntomato".to_string())]
        );
    }

    #[tokio::test]
    async fn assessment_is_given_the_marker_block_for_broken_json() {
        let model = StubModel::new(canned);
        let raw = r#"{"food_name": "Soup", "ingredients": ["leek", "potato"], "recipe": "boil","#;
        let stage = assess_ingredients(model.as_ref(), raw).await;

        assert!(stage.data().is_some());
        assert_eq!(
            contexts_for(&model, "rate its environmental impact"),
            vec![Some(r#""leek", "potato""#.to_string())]
        );
    }

    #[tokio::test]
    async fn recognition_wrapped_in_a_list_is_still_parsed() {
        let model = StubModel::new(|req| {
            if req.prompt.contains("Identify the food dish") {
                Ok(format!("[{SCAN_REPLY}]"))
            } else {
                canned(req)
            }
        });
        let res = run_scan(model.as_ref(), input()).await.unwrap();
        assert_eq!(res.original_result.data().unwrap().food_name, "Beef Chili");
    }

    #[tokio::test]
    async fn single_object_assessment_becomes_a_list() {
        let model = StubModel::new(|_| {
            Ok(r#"{"ingredient": "tofu", "carbon_emissions": "low", "water_usage": "medium", "food_miles": "low"}"#.to_string())
        });
        let stage = assess_ingredients(model.as_ref(), SCAN_REPLY).await;
        let data = stage.data().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].ingredient, "tofu");
    }

    #[tokio::test]
    async fn assessment_without_ingredients_skips_the_model() {
        let model = StubModel::new(canned);
        let stage = assess_ingredients(model.as_ref(), "no markers at all").await;
        assert!(matches!(stage, Stage::Failed { .. }));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn final_recipe_serializes_payload_as_context() {
        let model = StubModel::new(|req| {
            assert!(req.context.as_deref().unwrap().contains("\"food_name\":\"Chili\""));
            canned(req)
        });
        let payload = serde_json::json!({"food_name": "Chili"});
        let (raw, stage) = final_recipe(model.as_ref(), &payload).await.unwrap();
        assert!(raw.contains("Brown the beef"));
        assert_eq!(stage.data().unwrap().instructions.len(), 1);
    }
}
