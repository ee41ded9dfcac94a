// ABOUTME: FusionBite nutrition core: budget tracking and meal suggestion pipeline
// ABOUTME: Crate root wiring models, external lookups, strategies, and sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Nutrient tracking and meal suggestion.
//!
//! The crate computes a user's remaining per-nutrient budget from their goals
//! and logged intake, synthesizes a candidate meal for that budget with
//! either a table-driven heuristic or a generative-text strategy, resolves
//! each proposed ingredient against a food-composition lookup, aggregates
//! the resolved nutrients into a meal total, and persists the meal only on
//! explicit confirmation.
//!
//! Entry point is [`session::MealSession`], which drives the pipeline and
//! enforces the session lifecycle, including superseding stale in-flight
//! generations and keeping a proposal intact across failed saves.

pub mod config;
pub mod errors;
pub mod external;
pub mod intelligence;
pub mod llm;
pub mod logging;
pub mod models;
pub mod session;
pub mod storage;

pub use errors::{AppError, AppResult, ErrorCode};
pub use session::{GenerateOutcome, MealSession, SessionState};
