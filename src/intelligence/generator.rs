// ABOUTME: Meal proposal generation strategies producing unresolved skeletons
// ABOUTME: Table-driven heuristic selection and schema-validated generative text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Meal skeleton generation.
//!
//! Two interchangeable strategies produce an unresolved [`MealSkeleton`]:
//! [`HeuristicStrategy`] picks ingredients from diet-keyed candidate tables
//! using a randomness source, and [`GenerativeStrategy`] asks a text model
//! for a JSON meal and defensively decodes the reply. Both run behind the
//! [`ProposalStrategy`] seam so the session layer does not care which one
//! produced the skeleton.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::{Diet, IngredientProposal, MealSkeleton, NutrientTotals, UserProfile};

/// Remaining calories above which the heuristic adds a carbohydrate source
pub const CARB_CALORIE_THRESHOLD: f64 = 500.0;

/// Generation strategy seam: budget and profile in, unresolved skeleton out.
///
/// Implementations may consume randomness or call external services, but must
/// return either a skeleton that passes [`MealSkeleton::validate`] or an
/// error. Callers never receive a partially-valid skeleton.
#[async_trait]
pub trait ProposalStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Produce a meal skeleton for the remaining budget and profile.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedGeneration` when the strategy cannot
    /// produce a valid skeleton, or a network error for external failures.
    async fn propose(&self, budget: &NutrientTotals, profile: &UserProfile) -> AppResult<MealSkeleton>;
}

/// A heuristic candidate: search-style description plus a default portion
struct Candidate {
    /// Comma-segmented description in composition-database style
    description: &'static str,
    /// Portion weight in grams
    grams: f64,
}

const fn candidate(description: &'static str, grams: f64) -> Candidate {
    Candidate { description, grams }
}

const OMNIVORE_PROTEINS: &[Candidate] = &[
    candidate("Chicken breast, meat only, cooked, roasted", 150.0),
    candidate("Salmon, Atlantic, farmed, cooked", 140.0),
    candidate("Egg, whole, cooked, hard-boiled", 100.0),
];

const VEGETARIAN_PROTEINS: &[Candidate] = &[
    candidate("Tofu, firm, prepared with calcium sulfate", 150.0),
    candidate("Egg, whole, cooked, hard-boiled", 100.0),
    candidate("Lentils, mature seeds, cooked, boiled", 150.0),
];

const VEGAN_PROTEINS: &[Candidate] = &[
    candidate("Tofu, firm, prepared with calcium sulfate", 150.0),
    candidate("Lentils, mature seeds, cooked, boiled", 150.0),
    candidate("Chickpeas, mature seeds, cooked", 150.0),
];

const KETO_PROTEINS: &[Candidate] = &[
    candidate("Chicken breast, meat only, cooked, roasted", 150.0),
    candidate("Salmon, Atlantic, farmed, cooked", 140.0),
    candidate("Egg, whole, cooked, hard-boiled", 100.0),
];

const VEGETABLES: &[Candidate] = &[
    candidate("Spinach, raw", 80.0),
    candidate("Broccoli, raw", 100.0),
    candidate("Kale, raw", 70.0),
];

const CARBOHYDRATES: &[Candidate] = &[
    candidate("Rice, brown, long-grain, cooked", 120.0),
    candidate("Quinoa, cooked", 120.0),
    candidate("Sweet potato, cooked, baked in skin", 130.0),
];

/// Table-driven ingredient selection.
///
/// Picks one protein from a diet-keyed table, one vegetable, and, when the
/// remaining calorie budget exceeds [`CARB_CALORIE_THRESHOLD`], one
/// carbohydrate source. Selection is uniform random over candidates that
/// survive the profile's allergy filter.
pub struct HeuristicStrategy {
    rng: Mutex<StdRng>,
}

impl Default for HeuristicStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicStrategy {
    /// Strategy with an entropy-seeded randomness source
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Strategy with a fixed seed for reproducible selection
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn proteins_for(diet: Diet) -> &'static [Candidate] {
        match diet {
            Diet::Vegetarian => VEGETARIAN_PROTEINS,
            Diet::Vegan => VEGAN_PROTEINS,
            Diet::Keto => KETO_PROTEINS,
            Diet::Omnivore | Diet::Other => OMNIVORE_PROTEINS,
        }
    }

    fn is_allowed(candidate: &Candidate, allergies: &[String]) -> bool {
        let description = candidate.description.to_lowercase();
        !allergies
            .iter()
            .any(|allergy| !allergy.trim().is_empty() && description.contains(&allergy.trim().to_lowercase()))
    }

    fn pick(&self, table: &'static [Candidate], allergies: &[String]) -> AppResult<&'static Candidate> {
        let allowed: Vec<&Candidate> = table
            .iter()
            .filter(|c| Self::is_allowed(c, allergies))
            .collect();
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::internal("randomness source poisoned"))?;
        allowed
            .choose(&mut *rng)
            .copied()
            .ok_or_else(|| AppError::invalid_input("no candidate ingredient passes the allergy filter"))
    }

    /// First comma-segment of a composition-style description, e.g.
    /// "Spinach, raw" becomes "Spinach".
    fn short_name(description: &str) -> &str {
        description.split(',').next().unwrap_or(description).trim()
    }
}

#[async_trait]
impl ProposalStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn propose(&self, budget: &NutrientTotals, profile: &UserProfile) -> AppResult<MealSkeleton> {
        let mut picks = vec![
            self.pick(Self::proteins_for(profile.diet), &profile.allergies)?,
            self.pick(VEGETABLES, &profile.allergies)?,
        ];
        if budget.calories > CARB_CALORIE_THRESHOLD {
            picks.push(self.pick(CARBOHYDRATES, &profile.allergies)?);
        }

        let short_names: Vec<&str> = picks.iter().map(|c| Self::short_name(c.description)).collect();
        let name = match short_names.as_slice() {
            [protein, vegetable] => format!("{protein} with {vegetable}"),
            [protein, vegetable, carb] => format!("{protein} with {vegetable} and {carb}"),
            _ => short_names.join(" with "),
        };

        let mut directions: Vec<String> = picks
            .iter()
            .zip(&short_names)
            .map(|(c, short)| format!("Prepare {:.0} g of {}.", c.grams, short.to_lowercase()))
            .collect();
        directions.push("Combine everything and serve.".to_owned());

        let skeleton = MealSkeleton {
            name,
            ingredients: picks
                .iter()
                .map(|c| IngredientProposal::grams(c.description, c.grams))
                .collect(),
            directions,
        };
        skeleton.validate()?;
        debug!(
            meal = %skeleton.name,
            ingredients = skeleton.ingredients.len(),
            "heuristic strategy selected ingredients"
        );
        Ok(skeleton)
    }
}

/// Wire shape expected back from the text model
#[derive(Debug, Deserialize)]
struct GeneratedMeal {
    name: String,
    ingredients: Vec<GeneratedIngredient>,
    directions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedIngredient {
    item: String,
    amount: f64,
    unit: String,
}

impl From<GeneratedMeal> for MealSkeleton {
    fn from(meal: GeneratedMeal) -> Self {
        Self {
            name: meal.name,
            ingredients: meal
                .ingredients
                .into_iter()
                .map(|i| IngredientProposal {
                    item: i.item,
                    amount: i.amount,
                    unit: i.unit,
                })
                .collect(),
            directions: meal.directions,
        }
    }
}

/// Generative-text strategy.
///
/// Builds a prompt from the profile and remaining budget, asks the provider
/// for a single JSON object, and decodes it defensively. A reply that fails
/// decoding or skeleton validation is discarded and regenerated exactly once;
/// a second failure surfaces as `MalformedGeneration`.
pub struct GenerativeStrategy {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
}

const SYSTEM_INSTRUCTION: &str =
    "You are a nutritionist assistant. You answer with a single JSON object and nothing else.";

impl GenerativeStrategy {
    /// Maximum generation attempts, counting the first
    const MAX_ATTEMPTS: u32 = 2;

    /// Reply token ceiling, generous for a single meal object
    const MAX_REPLY_TOKENS: u32 = 1024;

    /// Strategy backed by the given text-model provider
    #[must_use]
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: 0.7,
        }
    }

    fn build_prompt(budget: &NutrientTotals, profile: &UserProfile) -> String {
        let mut prompt = format!(
            "Suggest one meal for a user on a {} diet.\n\
             Remaining nutrient budget for today: {:.0} kcal, {:.0} g protein, \
             {:.0} g carbohydrates, {:.0} g fat, {:.0} g fiber.\n\
             Prioritize the most depleted nutrients.",
            profile.diet.label(),
            budget.calories,
            budget.protein_g,
            budget.carbs_g,
            budget.fat_g,
            budget.fiber_g,
        );
        if !profile.allergies.is_empty() {
            prompt.push_str(&format!(
                "\nStrictly avoid these allergens: {}.",
                profile.allergies.join(", ")
            ));
        }
        if !profile.medical_conditions.is_empty() {
            prompt.push_str(&format!(
                "\nAccount for these medical conditions: {}.",
                profile.medical_conditions.join(", ")
            ));
        }
        if let Some(mins) = profile.time_constraint_mins {
            prompt.push_str(&format!("\nPreparation must take at most {mins} minutes."));
        }
        prompt.push_str(
            "\nRespond with ONLY a JSON object, no prose:\n\
             {\"name\": string, \"ingredients\": [{\"item\": string, \"amount\": number, \"unit\": \"g\"}], \
             \"directions\": [string]}\n\
             Every amount is a weight in grams. Include at least 2 ingredients.",
        );
        prompt
    }

    /// Strip whitespace and a Markdown code fence, if the model added one
    /// despite being told not to.
    fn strip_reply(content: &str) -> &str {
        let trimmed = content.trim();
        let without_open = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        without_open.strip_suffix("```").unwrap_or(without_open).trim()
    }

    fn decode(content: &str) -> AppResult<MealSkeleton> {
        let meal: GeneratedMeal = serde_json::from_str(Self::strip_reply(content))
            .map_err(|e| AppError::malformed_generation(format!("reply is not a valid meal object: {e}")))?;
        let skeleton = MealSkeleton::from(meal);
        skeleton
            .validate()
            .map_err(|e| AppError::malformed_generation(e.message))?;
        Ok(skeleton)
    }
}

#[async_trait]
impl ProposalStrategy for GenerativeStrategy {
    fn name(&self) -> &'static str {
        "generative"
    }

    async fn propose(&self, budget: &NutrientTotals, profile: &UserProfile) -> AppResult<MealSkeleton> {
        let prompt = Self::build_prompt(budget, profile);
        // Providers without a system role get the instruction folded into
        // the user message instead.
        let messages = if self.provider.capabilities().supports_system_messages() {
            vec![ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(prompt)]
        } else {
            vec![ChatMessage::user(format!("{SYSTEM_INSTRUCTION}\n\n{prompt}"))]
        };
        let request = ChatRequest::new(messages)
            .with_temperature(self.temperature)
            .with_max_tokens(Self::MAX_REPLY_TOKENS);

        let mut last_error = AppError::malformed_generation("no generation attempt made");
        for attempt in 1..=Self::MAX_ATTEMPTS {
            let response = self.provider.complete(&request).await?;
            match Self::decode(&response.content) {
                Ok(skeleton) => {
                    debug!(
                        provider = self.provider.name(),
                        meal = %skeleton.name,
                        attempt,
                        "generative strategy produced a valid skeleton"
                    );
                    return Ok(skeleton);
                }
                Err(e) => {
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        error = %e,
                        "discarding malformed generation"
                    );
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}
