// ABOUTME: Per-user meal generation session driving the pipeline end to end
// ABOUTME: State machine with supersede semantics and retry-safe persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Generation sessions.
//!
//! One [`MealSession`] per user drives the whole pipeline: budget
//! calculation, skeleton generation, concurrent ingredient resolution,
//! aggregation, and the explicit save. States move
//! `Idle → Generating → {Resolving → Ready | Failed}` and back to
//! `Generating` on regenerate, or `Ready → Saved` on confirm.
//!
//! A new generate request supersedes any in-flight one: every attempt takes
//! a ticket from a monotonic counter and only the holder of the newest
//! ticket may write session state, so stale results can never overwrite a
//! newer proposal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GoalConfig;
use crate::errors::{AppError, AppResult};
use crate::intelligence::{aggregate, derive_goals, remaining_budget, IngredientResolver, ProposalStrategy};
use crate::models::{MealProposal, NutrientGoals, NutrientTotals, UserProfile};
use crate::storage::{IntakeStore, MealStore, ProfileStore};

/// Where a session currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No generation attempted yet, or the last proposal was discarded
    Idle,
    /// A skeleton is being generated
    Generating,
    /// Ingredients are being resolved and aggregated
    Resolving,
    /// A finalized proposal is waiting for the user's decision
    Ready,
    /// The last attempt failed; the user may re-issue generate
    Failed,
    /// The proposal was confirmed and persisted
    Saved,
}

/// Outcome of one generate attempt
#[derive(Debug)]
pub enum GenerateOutcome {
    /// The attempt finished and its proposal is the session's current one
    Ready(MealProposal),
    /// A newer generate request took over; this result was discarded
    Superseded,
}

struct SessionInner {
    state: SessionState,
    proposal: Option<MealProposal>,
}

/// A user's meal generation session.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct MealSession {
    user_id: Uuid,
    profiles: Arc<dyn ProfileStore>,
    intake: Arc<dyn IntakeStore>,
    meals: Arc<dyn MealStore>,
    strategy: Arc<dyn ProposalStrategy>,
    resolver: IngredientResolver,
    goal_config: GoalConfig,
    generation: AtomicU64,
    inner: Mutex<SessionInner>,
}

impl MealSession {
    /// Open a session for an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AuthRequired` when no user identity is present; no
    /// downstream call is attempted in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        user_id: Option<Uuid>,
        profiles: Arc<dyn ProfileStore>,
        intake: Arc<dyn IntakeStore>,
        meals: Arc<dyn MealStore>,
        strategy: Arc<dyn ProposalStrategy>,
        resolver: IngredientResolver,
        goal_config: GoalConfig,
    ) -> AppResult<Self> {
        let user_id = user_id.ok_or_else(AppError::auth_required)?;
        Ok(Self {
            user_id,
            profiles,
            intake,
            meals,
            strategy,
            resolver,
            goal_config,
            generation: AtomicU64::new(0),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                proposal: None,
            }),
        })
    }

    /// The session's user
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Current state
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// The current finalized proposal, if the session is `Ready` or `Saved`
    pub async fn proposal(&self) -> Option<MealProposal> {
        self.inner.lock().await.proposal.clone()
    }

    /// This user's remaining nutrient budget for today.
    ///
    /// Goals come from the profile (or the configured fallbacks when the
    /// profile is missing or incomplete) minus today's logged intake.
    ///
    /// # Errors
    ///
    /// Returns a storage error when profile or intake reads fail.
    pub async fn budget(&self) -> AppResult<(NutrientGoals, NutrientTotals)> {
        let profile = self.profile().await?;
        let goals = derive_goals(&profile, &self.goal_config);
        let today = Utc::now().date_naive();
        let intake = self.intake.intake_for(self.user_id, today).await?;
        Ok((goals, remaining_budget(&goals, &intake)))
    }

    async fn profile(&self) -> AppResult<UserProfile> {
        Ok(self
            .profiles
            .get_profile(self.user_id)
            .await?
            .unwrap_or_default())
    }

    /// True if `ticket` is still the newest generate attempt
    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    async fn set_state(&self, ticket: u64, state: SessionState) -> bool {
        let mut inner = self.inner.lock().await;
        if !self.is_current(ticket) {
            return false;
        }
        inner.state = state;
        true
    }

    /// Run one full generation attempt: budget, skeleton, resolution,
    /// aggregation. Discards any previous proposal. If a newer generate call
    /// starts while this one is in flight, this one's result is dropped and
    /// [`GenerateOutcome::Superseded`] is returned.
    ///
    /// # Errors
    ///
    /// Surfaces strategy and storage errors after moving the session to
    /// `Failed`; the user can always re-issue generate. A proposal whose
    /// ingredients all fail resolution also fails rather than producing an
    /// empty meal.
    pub async fn generate(&self) -> AppResult<GenerateOutcome> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut inner = self.inner.lock().await;
            inner.state = SessionState::Generating;
            inner.proposal = None;
        }
        match self.run_attempt(ticket).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if self.set_state(ticket, SessionState::Failed).await {
                    warn!(user_id = %self.user_id, error = %e, "generation attempt failed");
                    Err(e.with_user_id(self.user_id))
                } else {
                    debug!(user_id = %self.user_id, ticket, "failed attempt was already superseded");
                    Ok(GenerateOutcome::Superseded)
                }
            }
        }
    }

    async fn run_attempt(&self, ticket: u64) -> AppResult<GenerateOutcome> {
        let profile = self.profile().await?;
        let goals = derive_goals(&profile, &self.goal_config);
        let today = Utc::now().date_naive();
        let intake = self.intake.intake_for(self.user_id, today).await?;
        let budget = remaining_budget(&goals, &intake);
        debug!(
            user_id = %self.user_id,
            strategy = self.strategy.name(),
            remaining_calories = budget.calories,
            "generating meal skeleton"
        );

        let skeleton = self.strategy.propose(&budget, &profile).await?;
        if !self.set_state(ticket, SessionState::Resolving).await {
            return Ok(GenerateOutcome::Superseded);
        }

        let resolutions = self.resolver.resolve_all(&skeleton.ingredients).await;
        let proposed = resolutions.len();
        let ingredients: Vec<_> = resolutions
            .into_iter()
            .filter_map(crate::intelligence::Resolution::into_resolved)
            .collect();
        if ingredients.is_empty() {
            return Err(AppError::lookup_miss(format!(
                "none of the {proposed} proposed ingredients could be resolved"
            )));
        }

        let nutrition = aggregate(&ingredients);
        let proposal = MealProposal {
            name: skeleton.name,
            ingredients,
            directions: skeleton.directions,
            nutrition,
        };

        let mut inner = self.inner.lock().await;
        if !self.is_current(ticket) {
            debug!(user_id = %self.user_id, ticket, "discarding superseded proposal");
            return Ok(GenerateOutcome::Superseded);
        }
        inner.state = SessionState::Ready;
        inner.proposal = Some(proposal.clone());
        info!(
            user_id = %self.user_id,
            meal = %proposal.name,
            ingredients = proposal.ingredients.len(),
            calories = proposal.nutrition.calories,
            "meal proposal ready"
        );
        Ok(GenerateOutcome::Ready(proposal))
    }

    /// Persist the current proposal on explicit user confirmation.
    ///
    /// A single-shot write: on failure the session stays `Ready` with the
    /// proposal intact, so the user can retry the save without regenerating.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` when no proposal is ready and
    /// `AppError::PersistenceError` when the write fails.
    pub async fn save(&self) -> AppResult<Uuid> {
        let proposal = {
            let inner = self.inner.lock().await;
            if inner.state != SessionState::Ready {
                return Err(AppError::invalid_input("no proposal is ready to save"));
            }
            inner
                .proposal
                .clone()
                .ok_or_else(|| AppError::internal("session ready without a proposal"))?
        };

        let id = self
            .meals
            .append_meal(self.user_id, &proposal)
            .await
            .map_err(|e| e.with_user_id(self.user_id))?;

        let mut inner = self.inner.lock().await;
        // A regenerate racing the save leaves the newer state alone.
        if inner.state == SessionState::Ready {
            inner.state = SessionState::Saved;
        }
        info!(user_id = %self.user_id, meal_id = %id, meal = %proposal.name, "meal saved");
        Ok(id)
    }

    /// Discard the session's proposal and return to `Idle`
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Idle;
        inner.proposal = None;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::ErrorCode;
    use crate::external::MockFoodLookup;
    use crate::intelligence::HeuristicStrategy;
    use crate::models::{IngredientProposal, MealSkeleton};
    use crate::storage::{InMemoryIntakeStore, InMemoryMealStore, InMemoryProfileStore, SavedMeal};

    fn session_with(strategy: Arc<dyn ProposalStrategy>, meals: Arc<dyn MealStore>) -> MealSession {
        MealSession::open(
            Some(Uuid::new_v4()),
            Arc::new(InMemoryProfileStore::new()),
            Arc::new(InMemoryIntakeStore::new()),
            meals,
            strategy,
            IngredientResolver::new(Arc::new(MockFoodLookup::new())),
            GoalConfig::default(),
        )
        .unwrap()
    }

    fn heuristic_session() -> MealSession {
        session_with(
            Arc::new(HeuristicStrategy::with_seed(11)),
            Arc::new(InMemoryMealStore::new()),
        )
    }

    #[test]
    fn test_open_requires_identity() {
        let result = MealSession::open(
            None,
            Arc::new(InMemoryProfileStore::new()),
            Arc::new(InMemoryIntakeStore::new()),
            Arc::new(InMemoryMealStore::new()),
            Arc::new(HeuristicStrategy::with_seed(1)),
            IngredientResolver::new(Arc::new(MockFoodLookup::new())),
            GoalConfig::default(),
        );
        let Err(err) = result else {
            panic!("opening without an identity must fail");
        };
        assert_eq!(err.code, ErrorCode::AuthRequired);
    }

    #[tokio::test]
    async fn test_generate_reaches_ready() {
        let session = heuristic_session();
        assert_eq!(session.state().await, SessionState::Idle);
        let outcome = session.generate().await.unwrap();
        let GenerateOutcome::Ready(proposal) = outcome else {
            panic!("expected a ready proposal");
        };
        assert_eq!(session.state().await, SessionState::Ready);
        assert!(!proposal.ingredients.is_empty());
        assert!(proposal.nutrition.calories > 0.0);
    }

    #[tokio::test]
    async fn test_save_moves_to_saved() {
        let meals = Arc::new(InMemoryMealStore::new());
        let session = session_with(Arc::new(HeuristicStrategy::with_seed(5)), meals.clone());
        session.generate().await.unwrap();
        let id = session.save().await.unwrap();
        assert_eq!(session.state().await, SessionState::Saved);
        let history = meals.meals_for(session.user_id()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
    }

    #[tokio::test]
    async fn test_save_without_proposal_rejected() {
        let session = heuristic_session();
        let err = session.save().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    /// Store whose writes always fail
    struct FailingMealStore;

    #[async_trait]
    impl MealStore for FailingMealStore {
        async fn append_meal(&self, _user_id: Uuid, _meal: &MealProposal) -> AppResult<Uuid> {
            Err(AppError::persistence("write refused"))
        }

        async fn meals_for(&self, _user_id: Uuid) -> AppResult<Vec<SavedMeal>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failed_save_keeps_proposal_for_retry() {
        let session = session_with(
            Arc::new(HeuristicStrategy::with_seed(5)),
            Arc::new(FailingMealStore),
        );
        session.generate().await.unwrap();
        let before = session.proposal().await.unwrap();

        let err = session.save().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistenceError);
        assert_eq!(err.user_id, Some(session.user_id()));
        assert_eq!(session.state().await, SessionState::Ready);
        let after = session.proposal().await.unwrap();
        assert_eq!(after.name, before.name);

        // Retrying the save is allowed without regenerating.
        let err = session.save().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistenceError);
    }

    /// Strategy whose first call stalls long enough to be superseded
    struct SlowThenFastStrategy {
        calls: AtomicU64,
    }

    #[async_trait]
    impl ProposalStrategy for SlowThenFastStrategy {
        fn name(&self) -> &'static str {
            "slow-then-fast"
        }

        async fn propose(&self, _budget: &NutrientTotals, _profile: &UserProfile) -> AppResult<MealSkeleton> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let name = if call == 0 {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "Stale Meal"
            } else {
                "Fresh Meal"
            };
            Ok(MealSkeleton {
                name: name.to_owned(),
                ingredients: vec![
                    IngredientProposal::grams("chicken breast", 150.0),
                    IngredientProposal::grams("spinach", 80.0),
                ],
                directions: vec!["Cook and serve.".to_owned()],
            })
        }
    }

    #[tokio::test]
    async fn test_new_generate_supersedes_in_flight_one() {
        let session = Arc::new(session_with(
            Arc::new(SlowThenFastStrategy {
                calls: AtomicU64::new(0),
            }),
            Arc::new(InMemoryMealStore::new()),
        ));

        let slow = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.generate().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fast = session.generate().await.unwrap();

        let GenerateOutcome::Ready(proposal) = fast else {
            panic!("newer attempt must win");
        };
        assert_eq!(proposal.name, "Fresh Meal");

        let stale = slow.await.unwrap().unwrap();
        assert!(matches!(stale, GenerateOutcome::Superseded));
        // The stale result must not have overwritten the newer proposal.
        assert_eq!(session.proposal().await.unwrap().name, "Fresh Meal");
        assert_eq!(session.state().await, SessionState::Ready);
    }

    /// Strategy that always fails with a network error
    struct ErroringStrategy;

    #[async_trait]
    impl ProposalStrategy for ErroringStrategy {
        fn name(&self) -> &'static str {
            "erroring"
        }

        async fn propose(&self, _budget: &NutrientTotals, _profile: &UserProfile) -> AppResult<MealSkeleton> {
            Err(AppError::external_service("text model", "connection refused"))
        }
    }

    #[tokio::test]
    async fn test_strategy_failure_moves_to_failed() {
        let session = session_with(Arc::new(ErroringStrategy), Arc::new(InMemoryMealStore::new()));
        let err = session.generate().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.user_id, Some(session.user_id()));
        assert_eq!(session.state().await, SessionState::Failed);
        assert!(session.proposal().await.is_none());

        // The user can always re-issue generate after a failure.
        assert!(session.generate().await.is_err());
        assert_eq!(session.state().await, SessionState::Failed);
    }

    /// Strategy proposing only unknown ingredients
    struct UnknownIngredientsStrategy;

    #[async_trait]
    impl ProposalStrategy for UnknownIngredientsStrategy {
        fn name(&self) -> &'static str {
            "unknown-ingredients"
        }

        async fn propose(&self, _budget: &NutrientTotals, _profile: &UserProfile) -> AppResult<MealSkeleton> {
            Ok(MealSkeleton {
                name: "Mystery Meal".to_owned(),
                ingredients: vec![
                    IngredientProposal::grams("unobtainium", 100.0),
                    IngredientProposal::grams("phlebotinum", 50.0),
                ],
                directions: vec!["Wonder.".to_owned()],
            })
        }
    }

    #[tokio::test]
    async fn test_all_ingredients_unresolved_fails_session() {
        let session = session_with(
            Arc::new(UnknownIngredientsStrategy),
            Arc::new(InMemoryMealStore::new()),
        );
        let err = session.generate().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LookupMiss);
        assert_eq!(session.state().await, SessionState::Failed);
    }

    #[tokio::test]
    async fn test_regenerate_discards_ready_proposal() {
        let session = heuristic_session();
        session.generate().await.unwrap();
        assert!(session.proposal().await.is_some());
        session.generate().await.unwrap();
        assert_eq!(session.state().await, SessionState::Ready);
        // The old proposal object was discarded and replaced.
        let second = session.proposal().await.unwrap();
        assert!(!second.ingredients.is_empty());
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let session = heuristic_session();
        session.generate().await.unwrap();
        session.reset().await;
        assert_eq!(session.state().await, SessionState::Idle);
        assert!(session.proposal().await.is_none());
    }
}
