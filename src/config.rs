// ABOUTME: Environment-driven application configuration
// ABOUTME: USDA client, LLM, lookup timeout, and goal-derivation constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Application configuration.
//!
//! Everything is environment-driven with documented defaults. The goal
//! derivation constants (BMR coefficients, activity factors, macro fractions)
//! are configuration rather than inline literals so tests and deployments can
//! pin them explicitly.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// USDA FoodData Central client configuration
#[derive(Debug, Clone)]
pub struct UsdaConfig {
    /// API key (free from <https://fdc.nal.usda.gov/api-key-signup.html>)
    pub api_key: String,
    /// Base URL (default: <https://api.nal.usda.gov/fdc/v1>)
    pub base_url: String,
    /// Search cache TTL in seconds (default: 86400 = 24 hours)
    pub cache_ttl_secs: u64,
    /// Rate limit per minute (default: 30)
    pub rate_limit_per_minute: u32,
    /// Per-request timeout (default: 10s)
    pub request_timeout: Duration,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.nal.usda.gov/fdc/v1".to_owned(),
            cache_ttl_secs: 86_400,
            rate_limit_per_minute: 30,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl UsdaConfig {
    /// Build from environment (`USDA_API_KEY`, `USDA_BASE_URL`,
    /// `USDA_TIMEOUT_SECS`)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("USDA_API_KEY").unwrap_or_default(),
            base_url: env::var("USDA_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: env::var("USDA_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.request_timeout, Duration::from_secs),
            ..defaults
        }
    }
}

/// Generative-text provider configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key for the configured provider
    pub api_key: String,
    /// Model override; provider default when `None`
    pub model: Option<String>,
    /// Per-request timeout (default: 30s)
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl LlmConfig {
    /// Build from environment (`GROQ_API_KEY`, `LLM_MODEL`,
    /// `LLM_TIMEOUT_SECS`)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            model: env::var("LLM_MODEL").ok(),
            request_timeout: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.request_timeout, Duration::from_secs),
        }
    }
}

/// Mifflin-St Jeor BMR coefficients
///
/// Reference: Mifflin et al. (1990) DOI: 10.1093/ajcn/51.2.241
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmrConfig {
    /// Weight coefficient (10.0)
    pub weight_coef: f64,
    /// Height coefficient (6.25)
    pub height_coef: f64,
    /// Age coefficient (-5.0)
    pub age_coef: f64,
    /// Male constant (+5)
    pub male_constant: f64,
    /// Female constant (-161)
    pub female_constant: f64,
    /// Floor applied to the computed BMR in kcal/day (1000)
    pub minimum_kcal: f64,
}

impl Default for BmrConfig {
    fn default() -> Self {
        Self {
            weight_coef: 10.0,
            height_coef: 6.25,
            age_coef: -5.0,
            male_constant: 5.0,
            female_constant: -161.0,
            minimum_kcal: 1000.0,
        }
    }
}

/// Activity factor multipliers for TDEE
///
/// Reference: McArdle et al. (2010), Exercise Physiology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityFactorsConfig {
    /// Little/no exercise: 1.2
    pub sedentary: f64,
    /// 1-3 days/week: 1.375
    pub lightly_active: f64,
    /// 3-5 days/week: 1.55
    pub moderately_active: f64,
    /// 6-7 days/week: 1.725
    pub very_active: f64,
    /// Hard training 2x/day: 1.9
    pub extra_active: f64,
}

impl Default for ActivityFactorsConfig {
    fn default() -> Self {
        Self {
            sedentary: 1.2,
            lightly_active: 1.375,
            moderately_active: 1.55,
            very_active: 1.725,
            extra_active: 1.9,
        }
    }
}

/// Goal-derivation constants: fallback calories, macro fractions of the
/// calorie goal, fiber constant, and weight-goal adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalConfig {
    /// Daily calorie target when neither an override nor biometrics exist
    pub fallback_calories: f64,
    /// Protein fraction of the calorie goal (0.20)
    pub protein_fraction: f64,
    /// Carbohydrate fraction of the calorie goal (0.50)
    pub carbs_fraction: f64,
    /// Fat fraction of the calorie goal (0.30)
    pub fat_fraction: f64,
    /// Fixed daily fiber target in grams (25)
    pub fiber_g: f64,
    /// Calorie adjustment applied for a lose/gain weight goal in kcal (500)
    pub weight_goal_adjustment_kcal: f64,
    /// BMR coefficients
    pub bmr: BmrConfig,
    /// Activity factors
    pub activity_factors: ActivityFactorsConfig,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            fallback_calories: 2000.0,
            protein_fraction: 0.20,
            carbs_fraction: 0.50,
            fat_fraction: 0.30,
            fiber_g: 25.0,
            weight_goal_adjustment_kcal: 500.0,
            bmr: BmrConfig::default(),
            activity_factors: ActivityFactorsConfig::default(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// USDA client settings
    pub usda: UsdaConfig,
    /// Generative provider settings
    pub llm: LlmConfig,
    /// Goal-derivation constants
    pub goals: GoalConfig,
}

impl AppConfig {
    /// Build the full configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            usda: UsdaConfig::from_env(),
            llm: LlmConfig::from_env(),
            goals: GoalConfig::default(),
        }
    }
}
