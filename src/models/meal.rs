// ABOUTME: Meal lifecycle models from unresolved skeleton to finalized proposal
// ABOUTME: IngredientProposal, ResolvedIngredient, MealSkeleton, MealProposal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

use serde::{Deserialize, Serialize};

use super::nutrition::NutrientTotals;
use crate::errors::{AppError, AppResult};

/// Minimum ingredient count for a valid meal skeleton
pub const MIN_INGREDIENTS: usize = 2;

/// An ingredient as proposed by a generation strategy, before any nutrient
/// resolution. Created per generation attempt and discarded after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientProposal {
    /// Free-text ingredient name used for the composition lookup
    pub item: String,
    /// Quantity in `unit`, strictly positive
    pub amount: f64,
    /// Measurement unit; the pipeline works in grams
    pub unit: String,
}

impl IngredientProposal {
    /// Propose an ingredient by weight in grams
    #[must_use]
    pub fn grams(item: impl Into<String>, amount: f64) -> Self {
        Self {
            item: item.into(),
            amount,
            unit: "g".to_owned(),
        }
    }
}

/// An ingredient whose nutrients were resolved against the composition
/// database and scaled to its amount. Lives for one proposal's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedIngredient {
    /// Description from the top-ranked composition match
    pub name: String,
    /// Quantity the nutrition was scaled to
    pub amount: f64,
    /// Measurement unit
    pub unit: String,
    /// Nutrients scaled to `amount`
    pub nutrition: NutrientTotals,
}

/// An unresolved meal produced by a generation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSkeleton {
    /// Meal name
    pub name: String,
    /// Proposed ingredients, not yet resolved
    pub ingredients: Vec<IngredientProposal>,
    /// Ordered preparation steps
    pub directions: Vec<String>,
}

impl MealSkeleton {
    /// Validate the structural invariants every skeleton must satisfy,
    /// regardless of which strategy produced it: a non-empty name, at least
    /// [`MIN_INGREDIENTS`] ingredients with positive amounts, and at least one
    /// direction.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` naming the first violated constraint.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid_input("meal name must not be empty"));
        }
        if self.ingredients.len() < MIN_INGREDIENTS {
            return Err(AppError::invalid_input(format!(
                "meal must have at least {MIN_INGREDIENTS} ingredients, got {}",
                self.ingredients.len()
            )));
        }
        for ingredient in &self.ingredients {
            if ingredient.item.trim().is_empty() {
                return Err(AppError::invalid_input("ingredient name must not be empty"));
            }
            if !(ingredient.amount > 0.0) {
                return Err(AppError::invalid_input(format!(
                    "ingredient {:?} must have a positive amount",
                    ingredient.item
                )));
            }
        }
        if self.directions.iter().all(|d| d.trim().is_empty()) {
            return Err(AppError::invalid_input("directions must not be empty"));
        }
        Ok(())
    }
}

/// A finalized meal proposal: resolved ingredients plus their aggregate
/// nutrition. Transient in a generation session until confirmed; immutable
/// history owned by the persistence gateway after save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealProposal {
    /// Meal name
    pub name: String,
    /// Resolved ingredients, in proposal order (unresolved ones excluded)
    pub ingredients: Vec<ResolvedIngredient>,
    /// Ordered preparation steps
    pub directions: Vec<String>,
    /// Aggregate nutrition over all resolved ingredients
    pub nutrition: NutrientTotals,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn skeleton() -> MealSkeleton {
        MealSkeleton {
            name: "Chicken with Spinach".to_owned(),
            ingredients: vec![
                IngredientProposal::grams("chicken breast", 150.0),
                IngredientProposal::grams("spinach", 80.0),
            ],
            directions: vec!["Cook the chicken.".to_owned(), "Serve.".to_owned()],
        }
    }

    #[test]
    fn test_valid_skeleton_passes() {
        assert!(skeleton().validate().is_ok());
    }

    #[test]
    fn test_too_few_ingredients_rejected() {
        let mut s = skeleton();
        s.ingredients.truncate(1);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_nonpositive_amount_rejected() {
        let mut s = skeleton();
        s.ingredients[0].amount = 0.0;
        assert!(s.validate().is_err());
        s.ingredients[0].amount = f64::NAN;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_empty_directions_rejected() {
        let mut s = skeleton();
        s.directions.clear();
        assert!(s.validate().is_err());
        s.directions = vec!["  ".to_owned()];
        assert!(s.validate().is_err());
    }
}
