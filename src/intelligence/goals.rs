// ABOUTME: Nutrient goal derivation and remaining-budget calculation
// ABOUTME: Mifflin-St Jeor BMR, activity-factor TDEE, macro fractions, fallbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Goal derivation and the remaining nutrient budget.
//!
//! The calorie goal resolves in precedence order: explicit profile override,
//! then biometric derivation (Mifflin-St Jeor BMR × activity factor, adjusted
//! for the weight goal), then the configured fallback constant. Macros are
//! fixed fractions of the calorie goal at 4/4/9 kcal per gram; fiber is a
//! fixed constant.
//!
//! # Reference
//! Mifflin, M.D., et al. (1990). A new predictive equation for resting energy
//! expenditure. *American Journal of Clinical Nutrition*, 51(2), 241-247.

use crate::config::{ActivityFactorsConfig, BmrConfig, GoalConfig};
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityLevel, Biometrics, Gender, NutrientGoals, NutrientTotals, UserProfile, WeightGoal};

/// kcal per gram of protein and carbohydrate
const KCAL_PER_G_PROTEIN_CARB: f64 = 4.0;
/// kcal per gram of fat
const KCAL_PER_G_FAT: f64 = 9.0;

/// Compute the remaining per-nutrient budget for today.
///
/// Pure elementwise `goals − intake`. Values may be negative (over budget)
/// and pass through unclamped; clamping is a caller decision.
#[must_use]
pub fn remaining_budget(goals: &NutrientGoals, intake: &NutrientTotals) -> NutrientTotals {
    goals.as_totals().sub(intake)
}

/// Calculate Basal Metabolic Rate using the Mifflin-St Jeor equation
///
/// `BMR = 10·weight_kg + 6.25·height_cm − 5·age + gender_constant`
///
/// # Errors
///
/// Returns `AppError::InvalidInput` if weight, height, or age is out of the
/// formula's validated range.
pub fn calculate_bmr(biometrics: &Biometrics, config: &BmrConfig) -> AppResult<f64> {
    if biometrics.weight_kg <= 0.0 || biometrics.weight_kg > 300.0 {
        return Err(AppError::invalid_input("weight must be between 0 and 300 kg"));
    }
    if biometrics.height_cm <= 0.0 || biometrics.height_cm > 300.0 {
        return Err(AppError::invalid_input("height must be between 0 and 300 cm"));
    }
    if !(10..=120).contains(&biometrics.age) {
        return Err(AppError::invalid_input(
            "age must be between 10 and 120 years",
        ));
    }

    let gender_constant = match biometrics.gender {
        Gender::Male => config.male_constant,
        Gender::Female => config.female_constant,
    };

    let bmr = config.weight_coef * biometrics.weight_kg
        + config.height_coef * biometrics.height_cm
        + config.age_coef * f64::from(biometrics.age)
        + gender_constant;

    Ok(bmr.max(config.minimum_kcal))
}

/// Total Daily Energy Expenditure: BMR scaled by the activity factor
#[must_use]
pub fn calculate_tdee(bmr: f64, activity_level: ActivityLevel, config: &ActivityFactorsConfig) -> f64 {
    let factor = match activity_level {
        ActivityLevel::Sedentary => config.sedentary,
        ActivityLevel::LightlyActive => config.lightly_active,
        ActivityLevel::ModeratelyActive => config.moderately_active,
        ActivityLevel::VeryActive => config.very_active,
        ActivityLevel::ExtraActive => config.extra_active,
    };
    bmr * factor
}

/// Derive the daily nutrient goals for a profile.
///
/// A possibly-incomplete profile is fine: missing biometrics fall back to the
/// configured calorie constant, and an invalid biometric set degrades to the
/// same fallback rather than failing goal derivation.
#[must_use]
pub fn derive_goals(profile: &UserProfile, config: &GoalConfig) -> NutrientGoals {
    let calories = profile.calorie_override.filter(|c| *c > 0.0).unwrap_or_else(|| {
        profile
            .biometrics
            .as_ref()
            .and_then(|b| calculate_bmr(b, &config.bmr).ok())
            .map_or(config.fallback_calories, |bmr| {
                let tdee = calculate_tdee(bmr, profile.activity_level, &config.activity_factors);
                let adjusted = match profile.weight_goal {
                    WeightGoal::Lose => tdee - config.weight_goal_adjustment_kcal,
                    WeightGoal::Maintain => tdee,
                    WeightGoal::Gain => tdee + config.weight_goal_adjustment_kcal,
                };
                adjusted.max(config.bmr.minimum_kcal)
            })
    });

    NutrientGoals {
        calories,
        protein_g: calories * config.protein_fraction / KCAL_PER_G_PROTEIN_CARB,
        carbs_g: calories * config.carbs_fraction / KCAL_PER_G_PROTEIN_CARB,
        fat_g: calories * config.fat_fraction / KCAL_PER_G_FAT,
        fiber_g: config.fiber_g,
    }
}
