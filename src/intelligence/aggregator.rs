// ABOUTME: Meal-level nutrition aggregation over resolved ingredients
// ABOUTME: Elementwise sum from a zero accumulator, rounded only after the fold
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

use crate::models::{NutrientTotals, ResolvedIngredient};

/// Sum the nutrients of the resolved ingredients into a meal total.
///
/// Elementwise fold from a zero accumulator; an empty slice yields all
/// zeros. The result is the exact sum of the scaled contributions — the
/// value that gets persisted. Rounding to display precision is a
/// presentation concern; apply [`NutrientTotals::rounded`] when rendering,
/// never here or per ingredient, so rounding error cannot compound.
#[must_use]
pub fn aggregate(ingredients: &[ResolvedIngredient]) -> NutrientTotals {
    ingredients
        .iter()
        .fold(NutrientTotals::zero(), |acc, ingredient| acc.add(&ingredient.nutrition))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn ingredient(calories: f64, protein: f64) -> ResolvedIngredient {
        ResolvedIngredient {
            name: "test food".to_owned(),
            amount: 100.0,
            unit: "g".to_owned(),
            nutrition: NutrientTotals {
                calories,
                protein_g: protein,
                carbs_g: 1.0,
                fat_g: 0.5,
                fiber_g: 0.25,
            },
        }
    }

    #[test]
    fn test_empty_input_is_all_zeros() {
        assert_eq!(aggregate(&[]), NutrientTotals::zero());
    }

    #[test]
    fn test_sum_is_elementwise() {
        let total = aggregate(&[ingredient(100.0, 10.0), ingredient(50.0, 5.0)]);
        assert_eq!(total.calories, 150.0);
        assert_eq!(total.protein_g, 15.0);
        assert_eq!(total.carbs_g, 2.0);
        assert_eq!(total.fat_g, 1.0);
        assert_eq!(total.fiber_g, 0.5);
    }

    #[test]
    fn test_order_independent() {
        let a = ingredient(123.4, 9.9);
        let b = ingredient(55.5, 3.3);
        let c = ingredient(200.1, 17.0);
        let forward = aggregate(&[a.clone(), b.clone(), c.clone()]);
        let backward = aggregate(&[c, b, a]);
        assert!(forward.approx_eq(&backward, 1e-9));
    }

    #[test]
    fn test_preserves_exact_sum_without_rounding() {
        // 0.04 + 0.04 + 0.04 = 0.12; a display-rounded total would be 0.1.
        let tiny = |_| ResolvedIngredient {
            nutrition: NutrientTotals {
                fiber_g: 0.04,
                ..NutrientTotals::zero()
            },
            ..ingredient(0.0, 0.0)
        };
        let total = aggregate(&(0..3).map(tiny).collect::<Vec<_>>());
        assert!((total.fiber_g - 0.12).abs() < 1e-9);
        assert!((total.fiber_g - total.rounded().fiber_g).abs() > 1e-3);
    }
}
