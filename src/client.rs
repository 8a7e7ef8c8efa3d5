use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::models::{FoodDetails, FoodSummary};

pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Source of food records for the ledger.
#[async_trait]
pub trait FoodSource: Send + Sync {
    async fn search(&self, query: &str) -> crate::Result<Vec<FoodSummary>>;
    async fn fetch_details(&self, fdc_id: u64) -> crate::Result<FoodDetails>;
}

#[async_trait]
impl<T: FoodSource + ?Sized> FoodSource for std::sync::Arc<T> {
    async fn search(&self, query: &str) -> crate::Result<Vec<FoodSummary>> {
        (**self).search(query).await
    }

    async fn fetch_details(&self, fdc_id: u64) -> crate::Result<FoodDetails> {
        (**self).fetch_details(fdc_id).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FoodSummary>,
}

/// USDA FoodData Central client.
#[derive(Clone)]
pub struct FoodDataClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
}

impl FoodDataClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Results per search, clamped to what the API accepts (1..=200).
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 200);
        self
    }

    /// Search foods by free text.
    pub async fn search_foods(&self, query: &str) -> Result<Vec<FoodSummary>> {
        let url = format!("{}/foods/search", self.base_url);
        let page_size = self.page_size.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", page_size.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("FoodData search failed: {} - {}", status, text));
        }

        let data: SearchResponse = resp.json().await?;
        debug!(query, hits = data.foods.len(), "food search");
        Ok(data.foods)
    }

    /// Get the full record for one food.
    pub async fn get_food(&self, fdc_id: u64) -> Result<FoodDetails> {
        let url = format!("{}/food/{}", self.base_url, fdc_id);
        let resp = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("GET food {} failed: {} - {}", fdc_id, status, text));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl FoodSource for FoodDataClient {
    async fn search(&self, query: &str) -> crate::Result<Vec<FoodSummary>> {
        self.search_foods(query)
            .await
            .map_err(|e| Error::LookupFailure(format!("{e:#}")))
    }

    async fn fetch_details(&self, fdc_id: u64) -> crate::Result<FoodDetails> {
        self.get_food(fdc_id)
            .await
            .map_err(|e| Error::LookupFailure(format!("{e:#}")))
    }
}
