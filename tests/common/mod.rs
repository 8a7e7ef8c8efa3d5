#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use calorie_ledger::client::FoodSource;
use calorie_ledger::models::{FoodDetails, FoodSummary, LabelNutrient};
use calorie_ledger::{Error, Result};

/// In-process food database with a switch to simulate an unreachable API.
#[derive(Default)]
pub struct StubFoods {
    foods: HashMap<u64, FoodDetails>,
    offline: AtomicBool,
    pub searches: AtomicUsize,
}

impl StubFoods {
    pub fn new() -> Self {
        let mut stub = Self::default();
        stub.insert(1001, "Oatmeal", Some(150.0));
        stub.insert(1002, "Salad", Some(200.0));
        stub.insert(1003, "Rice", Some(300.0));
        stub.insert(1004, "Black coffee", None);
        stub
    }

    pub fn insert(&mut self, fdc_id: u64, description: &str, calories: Option<f64>) {
        let mut label_nutrients = HashMap::new();
        if let Some(calories) = calories {
            label_nutrients.insert(
                "calories".to_string(),
                LabelNutrient {
                    value: Some(calories),
                },
            );
        }
        self.foods.insert(
            fdc_id,
            FoodDetails {
                fdc_id,
                description: description.to_string(),
                label_nutrients,
                food_nutrients: Vec::new(),
            },
        );
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::LookupFailure("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FoodSource for StubFoods {
    async fn search(&self, query: &str) -> Result<Vec<FoodSummary>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let query = query.to_lowercase();
        let mut hits: Vec<FoodSummary> = self
            .foods
            .values()
            .filter(|food| food.description.to_lowercase().contains(&query))
            .map(|food| FoodSummary {
                fdc_id: food.fdc_id,
                description: food.description.clone(),
                data_type: Some("Branded".to_string()),
                brand_owner: None,
                label_nutrients: food.label_nutrients.clone(),
                food_nutrients: Vec::new(),
            })
            .collect();
        hits.sort_by_key(|hit| hit.fdc_id);
        Ok(hits)
    }

    async fn fetch_details(&self, fdc_id: u64) -> Result<FoodDetails> {
        self.check()?;
        self.foods
            .get(&fdc_id)
            .cloned()
            .ok_or_else(|| Error::LookupFailure(format!("food {fdc_id} not found")))
    }
}
