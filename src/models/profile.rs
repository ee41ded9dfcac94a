// ABOUTME: User profile model read by the meal-suggestion core
// ABOUTME: Diet, Gender, ActivityLevel, WeightGoal enums and the UserProfile struct
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

use serde::{Deserialize, Serialize};

/// Dietary pattern, as a closed tagged variant with an explicit fallback.
///
/// Free-text diet strings from the profile store are normalized through
/// [`Diet::from_str_lossy`]; anything unrecognized maps to [`Diet::Other`]
/// rather than being matched ad hoc downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diet {
    /// No dietary restriction
    #[default]
    Omnivore,
    /// No meat or fish
    Vegetarian,
    /// No animal products
    Vegan,
    /// Very low carbohydrate
    Keto,
    /// Anything else, treated as unrestricted for candidate selection
    Other,
}

impl Diet {
    /// Parse a diet from free text, falling back to `Other`
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "omnivore" | "" | "none" => Self::Omnivore,
            "vegetarian" => Self::Vegetarian,
            "vegan" => Self::Vegan,
            "keto" | "ketogenic" => Self::Keto,
            _ => Self::Other,
        }
    }

    /// Human-readable label for prompts and logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Omnivore => "omnivore",
            Self::Vegetarian => "vegetarian",
            Self::Vegan => "vegan",
            Self::Keto => "keto",
            Self::Other => "other",
        }
    }
}

/// Gender for BMR calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male (higher BMR constant)
    Male,
    /// Female (lower BMR constant)
    Female,
}

/// Activity level for the TDEE multiplier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Exercise 1-3 days/week
    #[default]
    LightlyActive,
    /// Exercise 3-5 days/week
    ModeratelyActive,
    /// Exercise 6-7 days/week
    VeryActive,
    /// Hard training twice a day
    ExtraActive,
}

/// Weight goal, adjusting the derived calorie target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightGoal {
    /// Caloric deficit
    Lose,
    /// Caloric balance
    #[default]
    Maintain,
    /// Caloric surplus
    Gain,
}

/// Biometric inputs for goal derivation, present only when the user has
/// completed their profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Biometrics {
    /// Age in years
    pub age: u32,
    /// Gender for the BMR formula
    pub gender: Gender,
    /// Height in centimeters
    pub height_cm: f64,
    /// Weight in kilograms
    pub weight_kg: f64,
}

/// A user's profile as read from the profile store.
///
/// The core only reads this, never mutates it. A possibly-incomplete profile
/// is expected: every optional field has a defined fallback in goal derivation
/// and proposal generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Biometrics, when the user has entered them
    pub biometrics: Option<Biometrics>,
    /// Activity level for TDEE
    #[serde(default)]
    pub activity_level: ActivityLevel,
    /// Weight goal for calorie adjustment
    #[serde(default)]
    pub weight_goal: WeightGoal,
    /// Dietary pattern
    #[serde(default)]
    pub diet: Diet,
    /// Allergies the generator must avoid
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Medical conditions the generator should account for
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    /// Maximum cooking time in minutes, when the user set one
    pub time_constraint_mins: Option<u16>,
    /// Explicit daily calorie override, taking precedence over derivation
    pub calorie_override: Option<f64>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            biometrics: None,
            activity_level: ActivityLevel::default(),
            weight_goal: WeightGoal::default(),
            diet: Diet::default(),
            allergies: Vec::new(),
            medical_conditions: Vec::new(),
            time_constraint_mins: None,
            calorie_override: None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_diet_from_str_lossy() {
        assert_eq!(Diet::from_str_lossy("Vegan"), Diet::Vegan);
        assert_eq!(Diet::from_str_lossy("  KETOGENIC "), Diet::Keto);
        assert_eq!(Diet::from_str_lossy(""), Diet::Omnivore);
        assert_eq!(Diet::from_str_lossy("pescatarian"), Diet::Other);
    }

    #[test]
    fn test_default_profile_is_empty_baseline() {
        let profile = UserProfile::default();
        assert!(profile.biometrics.is_none());
        assert!(profile.allergies.is_empty());
        assert_eq!(profile.diet, Diet::Omnivore);
        assert!(profile.calorie_override.is_none());
    }
}
