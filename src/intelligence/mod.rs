// ABOUTME: Core meal-suggestion pipeline: goals, generation, resolution, aggregation
// ABOUTME: Pure budget math plus the strategy and resolver seams the session drives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! The meal-suggestion pipeline.
//!
//! Data flows `goals − intake` ([`remaining_budget`]) into a
//! [`ProposalStrategy`] that produces a skeleton, through the
//! [`IngredientResolver`] fan-out, into [`aggregate`] for the meal total.

pub mod aggregator;
pub mod generator;
pub mod goals;
pub mod resolver;

pub use aggregator::aggregate;
pub use generator::{GenerativeStrategy, HeuristicStrategy, ProposalStrategy, CARB_CALORIE_THRESHOLD};
pub use goals::{calculate_bmr, calculate_tdee, derive_goals, remaining_budget};
pub use resolver::{IngredientResolver, Resolution};
