// ABOUTME: USDA FoodData Central client for ingredient composition lookup
// ABOUTME: FoodLookup trait seam, HTTP client with cache and rate limiting, mock for tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! USDA `FoodData` Central API client.
//!
//! The resolver only needs text search: the `/foods/search` endpoint already
//! returns each match's per-100 g nutrient entries keyed by stable numeric
//! codes, so no detail round trip is required.
//!
//! # Features
//! - Food search with ranked results
//! - 24-hour response caching to minimize API calls
//! - Rate limiting (30 requests per minute)
//! - Bounded request timeout
//! - Mock client for testing
//!
//! # API Reference
//! USDA `FoodData` Central API: <https://fdc.nal.usda.gov/api-guide.html>

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::UsdaConfig;
use crate::errors::{AppError, AppResult};

/// One nutrient entry of a food record, per 100 g of the food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodNutrient {
    /// Stable USDA nutrient code (e.g. 1008 for energy)
    pub nutrient_id: u32,
    /// Amount per 100 g, in the nutrient's own unit
    pub amount: f64,
}

/// A food record returned by the composition search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodRecord {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Food description, e.g. "Chicken, breast, meat only, cooked, roasted"
    pub description: String,
    /// Per-100 g nutrient entries keyed by numeric code
    pub nutrients: Vec<FoodNutrient>,
}

impl FoodRecord {
    /// Amount per 100 g for a nutrient code, defaulting to 0 when the code is
    /// absent from the record
    #[must_use]
    pub fn nutrient_amount(&self, nutrient_id: u32) -> f64 {
        self.nutrients
            .iter()
            .find(|n| n.nutrient_id == nutrient_id)
            .map_or(0.0, |n| n.amount)
    }
}

/// Seam for the external composition lookup.
///
/// Implementations must be safely invocable concurrently: resolution fans out
/// across all ingredients of one proposal with no shared mutable state.
#[async_trait]
pub trait FoodLookup: Send + Sync {
    /// Search foods by free text, returning a ranked list (best match first)
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or times out. An empty result
    /// list is not an error.
    async fn search_foods(&self, query: &str, page_size: u32) -> AppResult<Vec<FoodRecord>>;
}

// ---------------------------------------------------------------------------
// Wire types (USDA search response)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
struct SearchFood {
    #[serde(rename = "fdcId")]
    fdc_id: u64,
    description: String,
    #[serde(rename = "foodNutrients", default)]
    food_nutrients: Vec<SearchFoodNutrient>,
}

#[derive(Debug, Deserialize)]
struct SearchFoodNutrient {
    #[serde(rename = "nutrientId")]
    nutrient_id: Option<u32>,
    #[serde(rename = "value")]
    value: Option<f64>,
}

impl From<SearchFood> for FoodRecord {
    fn from(food: SearchFood) -> Self {
        let nutrients = food
            .food_nutrients
            .into_iter()
            .filter_map(|n| {
                Some(FoodNutrient {
                    nutrient_id: n.nutrient_id?,
                    amount: n.value.unwrap_or(0.0),
                })
            })
            .collect();
        Self {
            fdc_id: food.fdc_id,
            description: food.description,
            nutrients,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<FoodRecord>,
    expires_at: Instant,
}

/// Sliding-window rate limiter for API requests
#[derive(Debug)]
struct RateLimiter {
    requests: Vec<Instant>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    const fn new(limit: u32, window: Duration) -> Self {
        Self {
            requests: Vec::new(),
            limit,
            window,
        }
    }

    fn can_request(&mut self) -> bool {
        let now = Instant::now();
        self.requests
            .retain(|&t| now.duration_since(t) < self.window);
        self.requests.len() < self.limit as usize
    }

    fn record_request(&mut self) {
        self.requests.push(Instant::now());
    }

    async fn wait_if_needed(&mut self) {
        while !self.can_request() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

/// USDA `FoodData` Central API client
pub struct UsdaClient {
    config: UsdaConfig,
    http_client: reqwest::Client,
    search_cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    rate_limiter: Arc<RwLock<RateLimiter>>,
}

impl UsdaClient {
    /// Create a new client for the given configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the API key is empty or the HTTP
    /// client cannot be built.
    pub fn new(config: UsdaConfig) -> AppResult<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::config(
                "USDA API key not configured. Set USDA_API_KEY.",
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;

        let rate_limiter = RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60));

        Ok(Self {
            config,
            http_client,
            search_cache: Arc::new(RwLock::new(HashMap::new())),
            rate_limiter: Arc::new(RwLock::new(rate_limiter)),
        })
    }

    fn map_request_error(e: reqwest::Error) -> AppError {
        let mapped = if e.is_timeout() {
            AppError::timeout("USDA API")
        } else {
            AppError::external_service("USDA API", e.to_string())
        };
        mapped.with_source(e)
    }
}

#[async_trait]
impl FoodLookup for UsdaClient {
    async fn search_foods(&self, query: &str, page_size: u32) -> AppResult<Vec<FoodRecord>> {
        if query.trim().is_empty() {
            return Err(AppError::invalid_input("search query cannot be empty"));
        }
        if page_size == 0 || page_size > 200 {
            return Err(AppError::invalid_input(
                "page size must be between 1 and 200",
            ));
        }

        let cache_key = format!("{query}:{page_size}");
        {
            let cache = self.search_cache.read().await;
            if let Some(entry) = cache.get(&cache_key) {
                if Instant::now() < entry.expires_at {
                    return Ok(entry.data.clone());
                }
            }
        }

        {
            let mut limiter = self.rate_limiter.write().await;
            limiter.wait_if_needed().await;
            limiter.record_request();
        }

        debug!(query, "searching USDA FoodData Central");

        let url = format!("{}/foods/search", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", &page_size.to_string()),
                ("api_key", &self.config.api_key),
            ])
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(AppError::external_service(
                "USDA API",
                format!(
                    "HTTP {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        let search_response: SearchResponse = response.json().await.map_err(|e| {
            AppError::external_service("USDA API", format!("JSON parse error: {e}")).with_source(e)
        })?;

        let records: Vec<FoodRecord> = search_response
            .foods
            .into_iter()
            .map(FoodRecord::from)
            .collect();

        {
            let mut cache = self.search_cache.write().await;
            cache.insert(
                cache_key,
                CacheEntry {
                    data: records.clone(),
                    expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_secs),
                },
            );
        }

        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Mock client
// ---------------------------------------------------------------------------

/// Mock composition lookup for tests and the demo binary (no API calls).
///
/// Matching is case-insensitive per-word substring against the record
/// description, ranked by matched-word count.
pub struct MockFoodLookup {
    foods: Vec<FoodRecord>,
}

impl MockFoodLookup {
    /// Create a mock with predefined SR Legacy style records
    #[must_use]
    pub fn new() -> Self {
        Self {
            foods: vec![
                mock_food(
                    171_477,
                    "Chicken, breast, meat only, cooked, roasted",
                    165.0,
                    31.02,
                    0.0,
                    3.57,
                    0.0,
                ),
                mock_food(
                    175_167,
                    "Tofu, firm, prepared with calcium sulfate",
                    78.0,
                    9.0,
                    2.3,
                    4.2,
                    0.9,
                ),
                mock_food(
                    175_139,
                    "Lentils, mature seeds, cooked, boiled",
                    116.0,
                    9.02,
                    20.13,
                    0.38,
                    7.9,
                ),
                mock_food(
                    175_215,
                    "Chickpeas (garbanzo beans), mature seeds, cooked",
                    164.0,
                    8.86,
                    27.42,
                    2.59,
                    7.6,
                ),
                mock_food(
                    173_735,
                    "Salmon, Atlantic, farmed, cooked, dry heat",
                    206.0,
                    22.1,
                    0.0,
                    12.35,
                    0.0,
                ),
                mock_food(173_424, "Egg, whole, cooked, hard-boiled", 155.0, 12.58, 1.12, 10.61, 0.0),
                mock_food(
                    168_462,
                    "Spinach, raw",
                    23.0,
                    2.86,
                    3.63,
                    0.39,
                    2.2,
                ),
                mock_food(170_379, "Broccoli, raw", 34.0, 2.82, 6.64, 0.37, 2.6),
                mock_food(
                    170_000,
                    "Kale, raw",
                    49.0,
                    4.28,
                    8.75,
                    0.93,
                    3.6,
                ),
                mock_food(
                    168_878,
                    "Rice, brown, long-grain, cooked",
                    123.0,
                    2.74,
                    25.58,
                    0.97,
                    1.6,
                ),
                mock_food(
                    168_917,
                    "Quinoa, cooked",
                    120.0,
                    4.4,
                    21.3,
                    1.92,
                    2.8,
                ),
                mock_food(
                    170_093,
                    "Sweet potato, cooked, baked in skin",
                    90.0,
                    2.01,
                    20.71,
                    0.15,
                    3.3,
                ),
                mock_food(171_688, "Apples, raw, with skin", 52.0, 0.26, 13.81, 0.17, 2.4),
                mock_food(
                    171_705,
                    "Avocados, raw, all commercial varieties",
                    160.0,
                    2.0,
                    8.53,
                    14.66,
                    6.7,
                ),
            ],
        }
    }

    /// Replace the mock data set
    #[must_use]
    pub fn with_foods(foods: Vec<FoodRecord>) -> Self {
        Self { foods }
    }
}

impl Default for MockFoodLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FoodLookup for MockFoodLookup {
    async fn search_foods(&self, query: &str, _page_size: u32) -> AppResult<Vec<FoodRecord>> {
        if query.trim().is_empty() {
            return Err(AppError::invalid_input("search query cannot be empty"));
        }

        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_owned())
            .filter(|w| !w.is_empty())
            .collect();
        // Rank by how many query words the description contains, so
        // "salmon, cooked" outranks every other "cooked" record.
        let mut scored: Vec<(usize, &FoodRecord)> = self
            .foods
            .iter()
            .filter_map(|food| {
                let haystack = food.description.to_lowercase();
                let score = words.iter().filter(|w| haystack.contains(w.as_str())).count();
                (score > 0).then_some((score, food))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().map(|(_, food)| food.clone()).collect())
    }
}

fn mock_food(
    fdc_id: u64,
    description: &str,
    energy: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
) -> FoodRecord {
    FoodRecord {
        fdc_id,
        description: description.to_owned(),
        nutrients: vec![
            FoodNutrient {
                nutrient_id: super::nutrient_codes::ENERGY_KCAL,
                amount: energy,
            },
            FoodNutrient {
                nutrient_id: super::nutrient_codes::PROTEIN,
                amount: protein,
            },
            FoodNutrient {
                nutrient_id: super::nutrient_codes::CARBOHYDRATE,
                amount: carbs,
            },
            FoodNutrient {
                nutrient_id: super::nutrient_codes::FAT,
                amount: fat,
            },
            FoodNutrient {
                nutrient_id: super::nutrient_codes::FIBER,
                amount: fiber,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::external::nutrient_codes;

    #[tokio::test]
    async fn test_mock_search_matches_partial_words() {
        let lookup = MockFoodLookup::new();
        let results = lookup.search_foods("chicken breast", 5).await.unwrap();
        assert!(!results.is_empty());
        assert!(results[0].description.starts_with("Chicken"));
    }

    #[tokio::test]
    async fn test_mock_search_ranks_by_matched_words() {
        let lookup = MockFoodLookup::new();
        // "cooked" alone matches several records; the extra "salmon" match
        // must put the salmon record on top.
        let results = lookup
            .search_foods("Salmon, Atlantic, farmed, cooked", 5)
            .await
            .unwrap();
        assert!(results[0].description.starts_with("Salmon"));
    }

    #[tokio::test]
    async fn test_mock_search_empty_query_rejected() {
        let lookup = MockFoodLookup::new();
        assert!(lookup.search_foods("  ", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_search_no_match_is_empty_not_error() {
        let lookup = MockFoodLookup::new();
        let results = lookup.search_foods("xyzzy", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_nutrient_amount_defaults_to_zero() {
        let record = FoodRecord {
            fdc_id: 1,
            description: "Test".to_owned(),
            nutrients: vec![FoodNutrient {
                nutrient_id: nutrient_codes::PROTEIN,
                amount: 10.0,
            }],
        };
        assert_eq!(record.nutrient_amount(nutrient_codes::PROTEIN), 10.0);
        assert_eq!(record.nutrient_amount(nutrient_codes::FIBER), 0.0);
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = UsdaConfig::default();
        assert!(UsdaClient::new(config).is_err());
    }

    #[test]
    fn test_search_food_wire_conversion_drops_codeless_entries() {
        let food = SearchFood {
            fdc_id: 7,
            description: "Thing".to_owned(),
            food_nutrients: vec![
                SearchFoodNutrient {
                    nutrient_id: Some(1003),
                    value: Some(5.0),
                },
                SearchFoodNutrient {
                    nutrient_id: None,
                    value: Some(9.0),
                },
                SearchFoodNutrient {
                    nutrient_id: Some(1008),
                    value: None,
                },
            ],
        };
        let record = FoodRecord::from(food);
        assert_eq!(record.nutrients.len(), 2);
        assert_eq!(record.nutrient_amount(1003), 5.0);
        assert_eq!(record.nutrient_amount(1008), 0.0);
    }
}
