// ABOUTME: Per-ingredient nutrient resolution against the composition lookup
// ABOUTME: Code-keyed extraction, per-100g scaling, concurrent fan-out with timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Ingredient resolution.
//!
//! Each proposed ingredient is resolved independently: a free-text search
//! against the composition lookup, nutrient extraction from the top-ranked
//! match by fixed numeric code, and scaling from the per-100 g reference to
//! the proposed amount. A miss or a failing lookup yields an explicit
//! [`Resolution::Unresolved`] so siblings keep going and the aggregator can
//! drop it from the totals.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::external::nutrient_codes;
use crate::external::{FoodLookup, FoodRecord};
use crate::models::{IngredientProposal, NutrientTotals, ResolvedIngredient};

/// Matches returned per search; only the top-ranked one is used
const SEARCH_PAGE_SIZE: u32 = 5;

/// Outcome of resolving a single proposed ingredient
#[derive(Debug)]
pub enum Resolution {
    /// The lookup matched and the nutrients were scaled to the amount
    Resolved(ResolvedIngredient),
    /// The lookup missed, errored, or timed out; the ingredient is dropped
    Unresolved {
        /// The proposed free-text name that could not be resolved
        item: String,
        /// Why resolution failed
        error: AppError,
    },
}

impl Resolution {
    /// The resolved ingredient, if any
    #[must_use]
    pub fn into_resolved(self) -> Option<ResolvedIngredient> {
        match self {
            Self::Resolved(ingredient) => Some(ingredient),
            Self::Unresolved { .. } => None,
        }
    }
}

/// Resolves ingredient proposals against a composition lookup.
///
/// Holds no mutable state, so one resolver is safely shared across the
/// concurrent per-ingredient tasks of a proposal.
pub struct IngredientResolver {
    lookup: Arc<dyn FoodLookup>,
    lookup_timeout: Duration,
}

impl IngredientResolver {
    /// Resolver with the default per-lookup timeout
    #[must_use]
    pub fn new(lookup: Arc<dyn FoodLookup>) -> Self {
        Self {
            lookup,
            lookup_timeout: Duration::from_secs(10),
        }
    }

    /// Override the per-lookup timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Extract the five tracked nutrients from a per-100 g record and scale
    /// them to `amount`. Codes absent from the record contribute zero.
    fn scale_record(record: &FoodRecord, amount: f64) -> NutrientTotals {
        let per_100 = NutrientTotals {
            calories: record.nutrient_amount(nutrient_codes::ENERGY_KCAL),
            protein_g: record.nutrient_amount(nutrient_codes::PROTEIN),
            carbs_g: record.nutrient_amount(nutrient_codes::CARBOHYDRATE),
            fat_g: record.nutrient_amount(nutrient_codes::FAT),
            fiber_g: record.nutrient_amount(nutrient_codes::FIBER),
        };
        per_100.scaled(amount / 100.0)
    }

    /// Resolve one proposed ingredient.
    ///
    /// # Errors
    ///
    /// Returns `AppError::LookupMiss` when the search has no match, a network
    /// error when the lookup fails, or `AppError::ExternalServiceTimeout`
    /// when it exceeds the configured deadline.
    pub async fn resolve(&self, proposal: &IngredientProposal) -> AppResult<ResolvedIngredient> {
        let records = tokio::time::timeout(
            self.lookup_timeout,
            self.lookup.search_foods(&proposal.item, SEARCH_PAGE_SIZE),
        )
        .await
        .map_err(|_| AppError::timeout("food composition lookup"))??;

        let top = records
            .first()
            .ok_or_else(|| AppError::lookup_miss(&proposal.item))?;

        let nutrition = Self::scale_record(top, proposal.amount);
        debug!(
            item = %proposal.item,
            matched = %top.description,
            amount = proposal.amount,
            calories = nutrition.calories,
            "resolved ingredient"
        );
        Ok(ResolvedIngredient {
            name: top.description.clone(),
            amount: proposal.amount,
            unit: proposal.unit.clone(),
            nutrition,
        })
    }

    /// Resolve every ingredient of a proposal concurrently.
    ///
    /// All lookups run at once and the result is joined only after every one
    /// settles. Failures never abort siblings; each failed ingredient comes
    /// back as [`Resolution::Unresolved`] in its original position.
    pub async fn resolve_all(&self, proposals: &[IngredientProposal]) -> Vec<Resolution> {
        let tasks = proposals.iter().map(|proposal| async move {
            match self.resolve(proposal).await {
                Ok(ingredient) => Resolution::Resolved(ingredient),
                Err(error) => {
                    warn!(item = %proposal.item, error = %error, "dropping unresolved ingredient");
                    Resolution::Unresolved {
                        item: proposal.item.clone(),
                        error,
                    }
                }
            }
        });
        join_all(tasks).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use async_trait::async_trait;

    use super::*;
    use crate::errors::ErrorCode;
    use crate::external::MockFoodLookup;

    fn resolver() -> IngredientResolver {
        IngredientResolver::new(Arc::new(MockFoodLookup::new()))
    }

    #[tokio::test]
    async fn test_resolve_scales_per_100g() {
        let r = resolver();
        let resolved = r
            .resolve(&IngredientProposal::grams("chicken breast", 200.0))
            .await
            .unwrap();
        // Mock record is 165 kcal / 31.02 g protein per 100 g
        assert!((resolved.nutrition.calories - 330.0).abs() < 1e-9);
        assert!((resolved.nutrition.protein_g - 62.04).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_double_amount_doubles_nutrients() {
        let r = resolver();
        let at_100 = r
            .resolve(&IngredientProposal::grams("spinach", 100.0))
            .await
            .unwrap();
        let at_200 = r
            .resolve(&IngredientProposal::grams("spinach", 200.0))
            .await
            .unwrap();
        assert!(at_200.nutrition.approx_eq(&at_100.nutrition.scaled(2.0), 1e-9));
    }

    #[tokio::test]
    async fn test_miss_is_lookup_miss() {
        let r = resolver();
        let err = r
            .resolve(&IngredientProposal::grams("unobtainium", 50.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LookupMiss);
    }

    #[tokio::test]
    async fn test_resolve_all_drops_misses_keeps_order() {
        let r = resolver();
        let resolutions = r
            .resolve_all(&[
                IngredientProposal::grams("chicken breast", 150.0),
                IngredientProposal::grams("unobtainium", 50.0),
                IngredientProposal::grams("spinach", 80.0),
            ])
            .await;
        assert_eq!(resolutions.len(), 3);
        assert!(matches!(resolutions[0], Resolution::Resolved(_)));
        assert!(matches!(resolutions[1], Resolution::Unresolved { .. }));
        assert!(matches!(resolutions[2], Resolution::Resolved(_)));
    }

    /// Lookup that never completes within any reasonable deadline
    struct StalledLookup;

    #[async_trait]
    impl FoodLookup for StalledLookup {
        async fn search_foods(&self, _query: &str, _page_size: u32) -> AppResult<Vec<FoodRecord>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let r = IngredientResolver::new(Arc::new(StalledLookup))
            .with_timeout(Duration::from_millis(20));
        let err = r
            .resolve(&IngredientProposal::grams("anything", 100.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalServiceTimeout);
    }
}
