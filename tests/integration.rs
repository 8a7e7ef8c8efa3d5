use std::sync::Arc;

use calorie_ledger::app::AppState;
use calorie_ledger::client::FoodDataClient;
use calorie_ledger::config::Config;
use calorie_ledger::models::MealSlot;
use calorie_ledger::store::MemoryStore;

fn live_client() -> Option<FoodDataClient> {
    dotenvy::dotenv().ok();
    std::env::var("USDA_API_KEY").ok()?;
    Some(Config::from_env().client())
}

#[tokio::test]
async fn search_foods_returns_results() {
    let Some(client) = live_client() else {
        eprintln!("skipping search_foods_returns_results: no USDA_API_KEY");
        return;
    };
    let results = client.search_foods("cheddar cheese").await.unwrap();

    assert!(!results.is_empty(), "search should return results");
    let first = &results[0];
    assert!(first.fdc_id > 0);
    assert!(!first.description.is_empty());
}

#[tokio::test]
async fn food_details_have_calories() {
    let Some(client) = live_client() else {
        eprintln!("skipping food_details_have_calories: no USDA_API_KEY");
        return;
    };
    let results = client.search_foods("apple").await.unwrap();
    let details = client.get_food(results[0].fdc_id).await.unwrap();

    assert_eq!(details.fdc_id, results[0].fdc_id);
    assert!(details.facts().calories > 0.0);
}

#[tokio::test]
async fn log_searched_food_into_ledger() {
    let Some(client) = live_client() else {
        eprintln!("skipping log_searched_food_into_ledger: no USDA_API_KEY");
        return;
    };
    let store = Arc::new(MemoryStore::new());
    let mut app = AppState::init(store, client).await.unwrap();

    let hits = app.search_foods("banana").await;
    let food = hits.first().expect("should find a banana");
    let id = app
        .log_food(MealSlot::Breakfast, food.fdc_id)
        .await
        .unwrap()
        .expect("lookup should succeed");

    let meals = app.ledger().meals(MealSlot::Breakfast);
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].id, id);

    let removed = app.ledger_mut().remove_entry(MealSlot::Breakfast, id).await.unwrap();
    assert!(removed.is_some());
    assert!(app.ledger().is_empty());
}

#[tokio::test]
async fn unreachable_api_yields_no_results() {
    let client = FoodDataClient::with_base_url("DEMO_KEY", "http://127.0.0.1:9");
    let store = Arc::new(MemoryStore::new());
    let app = AppState::init(store, client).await.unwrap();

    assert!(app.search_foods("chicken breast").await.is_empty());
    assert!(app.food_details(171477).await.is_none());
}
