// ABOUTME: External service clients for the nutrition core
// ABOUTME: USDA composition lookup and the stable nutrient-code mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! External service integrations.

pub mod usda;

pub use usda::{FoodLookup, FoodNutrient, FoodRecord, MockFoodLookup, UsdaClient};

/// Stable USDA nutrient codes used for extraction.
///
/// Extraction keys exclusively on these numeric codes, never on
/// human-readable nutrient names, which vary across data types. Each amount
/// is defined per 100 g of the food.
pub mod nutrient_codes {
    /// Energy in kcal
    pub const ENERGY_KCAL: u32 = 1008;
    /// Protein in grams
    pub const PROTEIN: u32 = 1003;
    /// Carbohydrate, by difference, in grams
    pub const CARBOHYDRATE: u32 = 1005;
    /// Total lipid (fat) in grams
    pub const FAT: u32 = 1004;
    /// Dietary fiber in grams
    pub const FIBER: u32 = 1079;
}
