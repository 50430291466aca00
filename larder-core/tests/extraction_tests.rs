//! End-to-end extraction tests against the fake AI client, URL guard and
//! fetcher. No network access.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};
use larder_core::ai::prompts::{
    PAGE_EXTRACT_PROMPT_NAME, PHOTO_EXTRACT_PROMPT_NAME, TEXT_EXTRACT_PROMPT_NAME,
};
use larder_core::ai::FakeAiClient;
use larder_core::http::MockResponse;
use larder_core::{
    CanonicalPreparation, CanonicalUnit, Category, ExtractionResult, Extractor, ExtractorConfig,
    FakeUrlGuard, MockFetcher, NutritionInfo, RecipeSource, INCOMPLETE_MESSAGE,
};
use serde_json::{json, Value as JsonValue};

const PAGE_URL: &str = "https://example.com/recipes/brownies";

const BROWNIE_PAGE: &str = r#"<html>
<head>
  <title>Fudgy Brownies</title>
  <meta property="og:image" content="/img/brownies.jpg">
</head>
<body>
  <h1>Fudgy Brownies</h1>
  <ul><li>200g dark chocolate</li><li>150g butter, melted</li></ul>
  <p>Melt, mix and bake for an hour.</p>
</body>
</html>"#;

fn text_candidate() -> JsonValue {
    json!({
        "success": true,
        "error": null,
        "title": "  Pancakes ",
        "description": "Fluffy weekend pancakes.",
        "prepTime": 10,
        "cookTime": 15,
        "serves": null,
        "category": "breakfast",
        "ingredients": [
            {"name": "flour", "amount": 200.0, "unit": "grams", "preparation": "sifted"},
            {"name": "milk", "amount": 300.0, "unit": "millilitres", "preparation": null},
            {"name": "salt", "amount": null, "unit": "handful", "preparation": null}
        ],
        "method": [
            {"title": "Mix the batter", "description": "Whisk everything together."},
            {"title": "Fry", "description": null}
        ],
        "nutrition": {"calories": 320, "protein": 9, "fat": 8, "carbohydrates": 52}
    })
}

fn page_candidate() -> JsonValue {
    json!({
        "title": "Fudgy Brownies",
        "description": null,
        "prepTime": "PT15M",
        "cookTime": "PT1H",
        "recipeYield": "16 brownies",
        "recipeCategory": ["Dessert", "Baking"],
        "ingredients": [
            {"name": "dark chocolate", "amount": 200.0, "unit": "g", "preparation": null},
            {"name": "butter", "amount": 150.0, "unit": "grams", "preparation": "melted"}
        ],
        "method": [
            {"title": "Melt", "description": "Melt the chocolate and butter."},
            {"title": "Bake", "description": "Bake for an hour."}
        ],
        "nutrition": {"calories": "250 kcal", "protein": "3g", "fat": "14 g", "carbohydrates": "31g"},
        "imageUrl": null,
        "author": "Sam"
    })
}

fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(4, 4))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn extractor_with(ai: Arc<FakeAiClient>, fetcher: MockFetcher) -> Extractor {
    Extractor::new(
        ai,
        Arc::new(FakeUrlGuard::allow_all()),
        Arc::new(fetcher),
        ExtractorConfig::default(),
    )
}

fn text_extractor(content: &str) -> (Extractor, Arc<FakeAiClient>) {
    let ai = Arc::new(FakeAiClient::with_response(TEXT_EXTRACT_PROMPT_NAME, content));
    (extractor_with(ai.clone(), MockFetcher::new()), ai)
}

#[tokio::test]
async fn text_success_is_normalized() {
    let (extractor, ai) = text_extractor(&text_candidate().to_string());

    let result = extractor
        .extract(RecipeSource::Text("Pancakes: flour, milk...".to_string()))
        .await;
    let recipe = result.recipe().expect("expected success").clone();

    assert_eq!(recipe.title, "Pancakes");
    assert_eq!(recipe.prep_time, 10);
    assert_eq!(recipe.cook_time, 15);
    assert_eq!(recipe.serves, 4);
    assert_eq!(recipe.category, Category::Breakfast);
    assert_eq!(recipe.ingredients[0].unit, Some(CanonicalUnit::G));
    assert_eq!(
        recipe.ingredients[0].preparation,
        Some(CanonicalPreparation::Sifted)
    );
    assert_eq!(recipe.ingredients[1].unit, Some(CanonicalUnit::Ml));
    assert_eq!(recipe.ingredients[2].unit, None);
    assert_eq!(recipe.method[1].description, None);
    assert_eq!(
        recipe.nutrition,
        Some(NutritionInfo {
            calories: 320,
            protein: 9,
            fat: 8,
            carbohydrates: 52,
        })
    );
    assert_eq!(recipe.source_url, None);

    let requests = ai.requests();
    assert_eq!(requests.len(), 1);
    let schema = requests[0].1.response_schema.as_ref().unwrap();
    assert_eq!(schema.name, "text_recipe");
}

#[tokio::test]
async fn fenced_output_is_accepted() {
    let fenced = format!("```json\n{}\n```", text_candidate());
    let (extractor, _) = text_extractor(&fenced);
    assert!(extractor.extract_from_text("Pancakes").await.is_success());
}

#[tokio::test]
async fn declined_text_is_failure() {
    let declined = json!({
        "success": false,
        "error": "This looks like a shopping list",
        "title": "",
        "description": null,
        "prepTime": null,
        "cookTime": null,
        "serves": null,
        "category": "main",
        "ingredients": [],
        "method": [],
        "nutrition": {"calories": 0, "protein": 0, "fat": 0, "carbohydrates": 0}
    });
    let (extractor, _) = text_extractor(&declined.to_string());

    let result = extractor.extract_from_text("eggs, milk, bread").await;
    assert!(matches!(result, ExtractionResult::Failure { .. }));
    assert_eq!(result.error(), Some("This looks like a shopping list"));
}

#[tokio::test]
async fn missing_nutrition_is_incomplete_with_partial() {
    let mut candidate = text_candidate();
    candidate.as_object_mut().unwrap().remove("nutrition");
    let (extractor, _) = text_extractor(&candidate.to_string());

    let result = extractor.extract_from_text("Pancakes").await;
    match &result {
        ExtractionResult::Incomplete {
            error,
            partial_recipe,
        } => {
            assert!(error.starts_with(INCOMPLETE_MESSAGE), "{error}");
            assert!(error.contains("nutrition"), "{error}");
            let partial = partial_recipe.as_ref().expect("expected partial recipe");
            assert_eq!(partial.title.as_deref(), Some("  Pancakes "));
            assert_eq!(partial.category, Some(Category::Breakfast));
            assert_eq!(partial.ingredients.as_ref().map(Vec::len), Some(3));
            assert_eq!(partial.nutrition, None);
        }
        other => panic!("expected incomplete, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_ingredient_list_is_incomplete() {
    let mut candidate = text_candidate();
    candidate["ingredients"] = json!([]);
    let (extractor, _) = text_extractor(&candidate.to_string());

    let result = extractor.extract_from_text("Pancakes").await;
    assert_eq!(result.status(), "incomplete");
    assert!(result.error().unwrap().contains("no ingredients"));
    // Title, description, times, category, method and nutrition survive.
    assert!(result.partial_recipe().unwrap().ingredients.is_none());
}

#[tokio::test]
async fn transport_error_is_failure() {
    let ai = Arc::new(FakeAiClient::new());
    ai.add_error(TEXT_EXTRACT_PROMPT_NAME, "503 upstream unavailable");
    let extractor = extractor_with(ai, MockFetcher::new());

    let result = extractor.extract_from_text("Pancakes").await;
    assert_eq!(
        result.error(),
        Some("AI request failed: API error: 503 upstream unavailable")
    );
}

#[tokio::test]
async fn slow_model_times_out() {
    let ai = Arc::new(
        FakeAiClient::with_response(TEXT_EXTRACT_PROMPT_NAME, &text_candidate().to_string())
            .with_delay(Duration::from_millis(500)),
    );
    let extractor = Extractor::new(
        ai,
        Arc::new(FakeUrlGuard::allow_all()),
        Arc::new(MockFetcher::new()),
        ExtractorConfig {
            ai_timeout: Duration::from_millis(20),
            ..ExtractorConfig::default()
        },
    );

    let result = extractor.extract_from_text("Pancakes").await;
    assert!(matches!(result, ExtractionResult::Failure { .. }));
    assert!(result.error().unwrap().contains("timed out"));
}

#[tokio::test]
async fn url_success_uses_page_heuristics() {
    let ai = Arc::new(FakeAiClient::with_response(
        PAGE_EXTRACT_PROMPT_NAME,
        &page_candidate().to_string(),
    ));
    let fetcher = MockFetcher::new().with_html(PAGE_URL, BROWNIE_PAGE);
    let extractor = extractor_with(ai.clone(), fetcher);

    let result = extractor.extract(RecipeSource::Url(PAGE_URL.to_string())).await;
    let recipe = result.recipe().expect("expected success");

    assert_eq!(recipe.prep_time, 15);
    assert_eq!(recipe.cook_time, 60);
    assert_eq!(recipe.serves, 16);
    assert_eq!(recipe.category, Category::Dessert);
    assert_eq!(
        recipe.ingredients[1].preparation,
        Some(CanonicalPreparation::Melted)
    );
    assert_eq!(
        recipe.nutrition,
        Some(NutritionInfo {
            calories: 250,
            protein: 3,
            fat: 14,
            carbohydrates: 31,
        })
    );
    assert_eq!(recipe.author.as_deref(), Some("Sam"));
    assert_eq!(recipe.source_url.as_deref(), Some(PAGE_URL));
    // The model gave no image, so the page's og:image is used.
    assert_eq!(
        recipe.image_url.as_deref(),
        Some("https://example.com/img/brownies.jpg")
    );

    let (prompt_name, request) = &ai.requests()[0];
    assert_eq!(prompt_name, PAGE_EXTRACT_PROMPT_NAME);
    assert!(request.messages[1].content.contains("200g dark chocolate"));
}

#[tokio::test]
async fn model_image_url_is_made_absolute() {
    let mut candidate = page_candidate();
    candidate["imageUrl"] = json!("/uploads/hero.png");
    let ai = Arc::new(FakeAiClient::with_response(
        PAGE_EXTRACT_PROMPT_NAME,
        &candidate.to_string(),
    ));
    let extractor = extractor_with(ai, MockFetcher::new().with_html(PAGE_URL, BROWNIE_PAGE));

    let result = extractor.extract_from_url(PAGE_URL).await;
    assert_eq!(
        result.recipe().unwrap().image_url.as_deref(),
        Some("https://example.com/uploads/hero.png")
    );
}

#[tokio::test]
async fn http_error_is_failure_without_model_call() {
    let ai = Arc::new(FakeAiClient::new().with_default_response("{}"));
    let fetcher = MockFetcher::new().with_response(PAGE_URL, MockResponse::Status(404));
    let extractor = extractor_with(ai.clone(), fetcher);

    let result = extractor.extract_from_url(PAGE_URL).await;
    assert_eq!(
        result.error(),
        Some("Failed to fetch page: Server responded with HTTP 404")
    );
    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn unsupported_content_type_is_failure() {
    let fetcher = MockFetcher::new().with_response(
        PAGE_URL,
        MockResponse::ContentType("application/pdf".to_string()),
    );
    let extractor = extractor_with(Arc::new(FakeAiClient::new()), fetcher);

    let result = extractor.extract_from_url(PAGE_URL).await;
    assert!(result.error().unwrap().contains("application/pdf"));
}

#[tokio::test]
async fn slow_fetch_times_out() {
    let fetcher = MockFetcher::new()
        .with_html(PAGE_URL, BROWNIE_PAGE)
        .with_delay(Duration::from_millis(500));
    let extractor = Extractor::new(
        Arc::new(FakeAiClient::new()),
        Arc::new(FakeUrlGuard::allow_all()),
        Arc::new(fetcher),
        ExtractorConfig {
            fetch_timeout: Duration::from_millis(20),
            ..ExtractorConfig::default()
        },
    );

    let result = extractor.extract_from_url(PAGE_URL).await;
    assert!(result.error().unwrap().starts_with("Timed out fetching page"));
}

#[tokio::test]
async fn empty_page_is_failure() {
    let fetcher = MockFetcher::new().with_html(PAGE_URL, "<html><body><div></div></body></html>");
    let extractor = extractor_with(Arc::new(FakeAiClient::new()), fetcher);

    let result = extractor.extract_from_url(PAGE_URL).await;
    assert_eq!(result.error(), Some("The page has no readable content"));
}

#[tokio::test]
async fn malformed_url_is_failure() {
    let extractor = extractor_with(Arc::new(FakeAiClient::new()), MockFetcher::new());
    let result = extractor.extract_from_url("ftp://example.com/recipe").await;
    assert_eq!(result.error(), Some("Unsupported URL scheme: ftp"));
}

#[tokio::test]
async fn fetch_goes_to_the_addresses_the_guard_checked() {
    let checked: Vec<SocketAddr> = vec!["93.184.216.34:443".parse().unwrap()];
    let ai = Arc::new(FakeAiClient::with_response(
        PAGE_EXTRACT_PROMPT_NAME,
        &page_candidate().to_string(),
    ));
    let fetcher = Arc::new(MockFetcher::new().with_html(PAGE_URL, BROWNIE_PAGE));
    let extractor = Extractor::new(
        ai,
        Arc::new(FakeUrlGuard::resolving_to(checked.clone())),
        fetcher.clone(),
        ExtractorConfig::default(),
    );

    let result = extractor.extract_from_url(PAGE_URL).await;
    assert_eq!(result.status(), "success");
    assert_eq!(fetcher.pinned_addrs(), vec![checked]);
}

#[tokio::test]
async fn page_output_missing_fields_is_incomplete() {
    let mut candidate = page_candidate();
    candidate.as_object_mut().unwrap().remove("method");
    let ai = Arc::new(FakeAiClient::with_response(
        PAGE_EXTRACT_PROMPT_NAME,
        &candidate.to_string(),
    ));
    let extractor = extractor_with(ai, MockFetcher::new().with_html(PAGE_URL, BROWNIE_PAGE));

    let result = extractor.extract_from_url(PAGE_URL).await;
    assert_eq!(result.status(), "incomplete");
    let partial = result.partial_recipe().unwrap();
    assert_eq!(partial.title.as_deref(), Some("Fudgy Brownies"));
    assert_eq!(partial.ingredients.as_ref().map(Vec::len), Some(2));
    assert!(partial.method.is_none());
    assert_eq!(partial.prep_time, Some(15));
    assert_eq!(partial.cook_time, Some(60));
    assert_eq!(partial.serves, Some(16));
    assert_eq!(partial.category, Some(Category::Dessert));
    assert_eq!(partial.nutrition.as_ref().map(|n| n.calories), Some(250));
}

#[tokio::test]
async fn photos_success_sends_images() {
    let ai = Arc::new(FakeAiClient::with_response(
        PHOTO_EXTRACT_PROMPT_NAME,
        &page_candidate().to_string(),
    ));
    let extractor = extractor_with(ai.clone(), MockFetcher::new());

    let result = extractor
        .extract(RecipeSource::Photos(vec![png_bytes(), png_bytes()]))
        .await;
    let recipe = result.recipe().expect("expected success");
    assert_eq!(recipe.title, "Fudgy Brownies");
    assert_eq!(recipe.image_url, None);
    assert_eq!(recipe.source_url, None);

    let (_, request) = &ai.requests()[0];
    assert!(request.has_images());
    assert!(!request.messages[0].has_images());
    assert_eq!(request.messages[1].images.len(), 2);
    assert_eq!(request.messages[1].images[0].media_type, "image/png");
}

#[tokio::test]
async fn bad_photo_fails_without_model_call() {
    let ai = Arc::new(FakeAiClient::new().with_default_response("{}"));
    let extractor = extractor_with(ai.clone(), MockFetcher::new());

    let result = extractor
        .extract_from_photos(vec![png_bytes(), b"definitely not a photo".to_vec()])
        .await;
    assert!(matches!(result, ExtractionResult::Failure { .. }));
    assert!(result.error().unwrap().starts_with("Photo 2"));
    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn no_photos_is_failure() {
    let extractor = extractor_with(Arc::new(FakeAiClient::new()), MockFetcher::new());
    let result = extractor.extract_from_photos(Vec::new()).await;
    assert_eq!(result.error(), Some("No photos provided"));
}

#[tokio::test]
async fn result_serializes_with_status_tag() {
    let (extractor, _) = text_extractor("not json");
    let result = extractor.extract_from_text("Pancakes").await;
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["status"], "incomplete");
    assert!(value.get("partialRecipe").is_none());
}
