// ABOUTME: Core nutrient value types shared across the pipeline
// ABOUTME: NutrientTotals and NutrientGoals with elementwise arithmetic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

use serde::{Deserialize, Serialize};

/// Per-nutrient amounts tracked by the application.
///
/// All five fields are always present and default to zero. Stored totals are
/// never negative; a *remaining budget* derived from goals minus intake may
/// legitimately carry negative values (over budget) and must not be clamped
/// here — clamping is a caller decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    /// Energy in kcal
    pub calories: f64,
    /// Protein in grams
    pub protein_g: f64,
    /// Carbohydrates in grams
    pub carbs_g: f64,
    /// Fat in grams
    pub fat_g: f64,
    /// Dietary fiber in grams
    pub fiber_g: f64,
}

impl NutrientTotals {
    /// All-zero totals
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            fiber_g: 0.0,
        }
    }

    /// Elementwise sum
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein_g: self.protein_g + other.protein_g,
            carbs_g: self.carbs_g + other.carbs_g,
            fat_g: self.fat_g + other.fat_g,
            fiber_g: self.fiber_g + other.fiber_g,
        }
    }

    /// Elementwise difference. Negative results pass through unclamped.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        Self {
            calories: self.calories - other.calories,
            protein_g: self.protein_g - other.protein_g,
            carbs_g: self.carbs_g - other.carbs_g,
            fat_g: self.fat_g - other.fat_g,
            fiber_g: self.fiber_g - other.fiber_g,
        }
    }

    /// Scale every field by a factor
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
            fiber_g: self.fiber_g * factor,
        }
    }

    /// Round every field to one decimal place for display.
    ///
    /// Apply only after aggregation, never per ingredient, so rounding error
    /// does not compound across the sum.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let round1 = |v: f64| (v * 10.0).round() / 10.0;
        Self {
            calories: round1(self.calories),
            protein_g: round1(self.protein_g),
            carbs_g: round1(self.carbs_g),
            fat_g: round1(self.fat_g),
            fiber_g: round1(self.fiber_g),
        }
    }

    /// Approximate field-by-field equality within `tolerance`
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.calories - other.calories).abs() <= tolerance
            && (self.protein_g - other.protein_g).abs() <= tolerance
            && (self.carbs_g - other.carbs_g).abs() <= tolerance
            && (self.fat_g - other.fat_g).abs() <= tolerance
            && (self.fiber_g - other.fiber_g).abs() <= tolerance
    }
}

/// Per-nutrient daily targets, each a positive value.
///
/// Calories come from the profile override when present, else are derived from
/// biometrics, else fall back to a documented constant; macros are fixed
/// fractions of the calorie goal and fiber is a fixed constant. See
/// `intelligence::goals::derive_goals`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientGoals {
    /// Daily energy target in kcal
    pub calories: f64,
    /// Daily protein target in grams
    pub protein_g: f64,
    /// Daily carbohydrate target in grams
    pub carbs_g: f64,
    /// Daily fat target in grams
    pub fat_g: f64,
    /// Daily fiber target in grams
    pub fiber_g: f64,
}

impl NutrientGoals {
    /// View the goals as plain totals for elementwise arithmetic
    #[must_use]
    pub const fn as_totals(&self) -> NutrientTotals {
        NutrientTotals {
            calories: self.calories,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            fiber_g: self.fiber_g,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_zero_is_all_zero() {
        let z = NutrientTotals::zero();
        assert_eq!(z, NutrientTotals::default());
        assert_eq!(z.calories, 0.0);
        assert_eq!(z.fiber_g, 0.0);
    }

    #[test]
    fn test_sub_passes_negatives_through() {
        let goals = NutrientTotals {
            calories: 2000.0,
            protein_g: 100.0,
            carbs_g: 250.0,
            fat_g: 65.0,
            fiber_g: 25.0,
        };
        let intake = NutrientTotals {
            calories: 2400.0,
            protein_g: 80.0,
            carbs_g: 300.0,
            fat_g: 70.0,
            fiber_g: 10.0,
        };
        let remaining = goals.sub(&intake);
        assert_eq!(remaining.calories, -400.0);
        assert_eq!(remaining.protein_g, 20.0);
        assert_eq!(remaining.carbs_g, -50.0);
        assert_eq!(remaining.fat_g, -5.0);
        assert_eq!(remaining.fiber_g, 15.0);
    }

    #[test]
    fn test_scaled_doubles_every_field() {
        let base = NutrientTotals {
            calories: 52.0,
            protein_g: 0.26,
            carbs_g: 13.81,
            fat_g: 0.17,
            fiber_g: 2.4,
        };
        let doubled = base.scaled(2.0);
        assert!(doubled.approx_eq(&base.add(&base), 1e-9));
    }

    #[test]
    fn test_rounded_one_decimal() {
        let v = NutrientTotals {
            calories: 123.456,
            protein_g: 0.04,
            carbs_g: 99.95,
            fat_g: 1.25,
            fiber_g: 0.0,
        };
        let r = v.rounded();
        assert_eq!(r.calories, 123.5);
        assert_eq!(r.protein_g, 0.0);
        assert_eq!(r.carbs_g, 100.0);
    }
}
