// ABOUTME: External collaborator seams: profile reads, intake reads, meal persistence
// ABOUTME: Async traits with in-memory implementations for tests and the demo binary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Storage collaborators.
//!
//! The pipeline only ever reads profiles and intake and appends confirmed
//! meals; it owns none of that data. These traits are the seams, and the
//! `InMemory*` types back tests and the demo binary. Missing profile or
//! intake data is a defaulted baseline, not an error.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{MealProposal, NutrientTotals, UserProfile};

/// Read-only access to user profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a user's profile, `None` if they have not set one up.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backing store is unavailable.
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;
}

/// Read-only access to logged daily intake totals
#[async_trait]
pub trait IntakeStore: Send + Sync {
    /// Total nutrients the user has logged for the given date. Nothing
    /// logged yields all zeros.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backing store is unavailable.
    async fn intake_for(&self, user_id: Uuid, date: NaiveDate) -> AppResult<NutrientTotals>;
}

/// A confirmed meal as the persistence gateway stores it
#[derive(Debug, Clone)]
pub struct SavedMeal {
    /// Identifier assigned by the gateway on append
    pub id: Uuid,
    /// When the meal was saved
    pub saved_at: DateTime<Utc>,
    /// The confirmed proposal, immutable from here on
    pub meal: MealProposal,
}

/// Append-only meal persistence, a fallible non-idempotent remote write
#[async_trait]
pub trait MealStore: Send + Sync {
    /// Append a confirmed meal to the user's history and return its id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PersistenceError` when the write does not complete;
    /// the caller keeps the proposal and may retry.
    async fn append_meal(&self, user_id: Uuid, meal: &MealProposal) -> AppResult<Uuid>;

    /// The user's saved meals, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backing store is unavailable.
    async fn meals_for(&self, user_id: Uuid) -> AppResult<Vec<SavedMeal>>;
}

/// In-memory profile store
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl InMemoryProfileStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user's profile
    pub async fn put_profile(&self, user_id: Uuid, profile: UserProfile) {
        self.profiles.write().await.insert(user_id, profile);
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }
}

/// In-memory intake store keyed by user and date
#[derive(Default)]
pub struct InMemoryIntakeStore {
    intake: RwLock<HashMap<(Uuid, NaiveDate), NutrientTotals>>,
}

impl InMemoryIntakeStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a day's logged totals
    pub async fn put_intake(&self, user_id: Uuid, date: NaiveDate, totals: NutrientTotals) {
        self.intake.write().await.insert((user_id, date), totals);
    }
}

#[async_trait]
impl IntakeStore for InMemoryIntakeStore {
    async fn intake_for(&self, user_id: Uuid, date: NaiveDate) -> AppResult<NutrientTotals> {
        Ok(self
            .intake
            .read()
            .await
            .get(&(user_id, date))
            .copied()
            .unwrap_or_else(NutrientTotals::zero))
    }
}

/// In-memory meal history
#[derive(Default)]
pub struct InMemoryMealStore {
    meals: RwLock<HashMap<Uuid, Vec<SavedMeal>>>,
}

impl InMemoryMealStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MealStore for InMemoryMealStore {
    async fn append_meal(&self, user_id: Uuid, meal: &MealProposal) -> AppResult<Uuid> {
        let saved = SavedMeal {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            meal: meal.clone(),
        };
        let id = saved.id;
        self.meals.write().await.entry(user_id).or_default().push(saved);
        Ok(id)
    }

    async fn meals_for(&self, user_id: Uuid) -> AppResult<Vec<SavedMeal>> {
        Ok(self.meals.read().await.get(&user_id).cloned().unwrap_or_default())
    }
}
