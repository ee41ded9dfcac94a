// ABOUTME: Domain models for the nutrition core
// ABOUTME: Re-exports nutrient, profile, and meal types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Domain models shared across the pipeline.

pub mod meal;
pub mod nutrition;
pub mod profile;

pub use meal::{IngredientProposal, MealProposal, MealSkeleton, ResolvedIngredient};
pub use nutrition::{NutrientGoals, NutrientTotals};
pub use profile::{ActivityLevel, Biometrics, Diet, Gender, UserProfile, WeightGoal};
