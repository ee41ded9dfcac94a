// ABOUTME: Demo CLI running one meal-suggestion round against seeded stores
// ABOUTME: Flags pick the strategy, diet, and logged intake; prints the proposal as JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! Command-line demo for the meal-suggestion pipeline.
//!
//! Runs one generation session for a synthetic user: seeds in-memory
//! profile and intake stores from the flags, generates a proposal with the
//! chosen strategy, and prints the result as JSON. With `--save` the
//! proposal is also appended to the in-memory history.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use uuid::Uuid;

use fusionbite::config::AppConfig;
use fusionbite::external::{FoodLookup, MockFoodLookup, UsdaClient};
use fusionbite::intelligence::{GenerativeStrategy, HeuristicStrategy, IngredientResolver, ProposalStrategy};
use fusionbite::llm::GroqProvider;
use fusionbite::logging::LoggingConfig;
use fusionbite::models::{Diet, NutrientTotals, UserProfile};
use fusionbite::session::{GenerateOutcome, MealSession};
use fusionbite::storage::{InMemoryIntakeStore, InMemoryMealStore, InMemoryProfileStore, MealStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Table-driven ingredient selection, no network
    Heuristic,
    /// Generative-text meal suggestion (requires `GROQ_API_KEY`)
    Generative,
}

#[derive(Debug, Parser)]
#[command(name = "fusionbite", about = "Suggest a meal for the remaining nutrient budget", version)]
struct Cli {
    /// Generation strategy
    #[arg(long, value_enum, default_value = "heuristic")]
    strategy: StrategyArg,

    /// Diet the suggestion must respect
    #[arg(long, default_value = "omnivore")]
    diet: String,

    /// Allergen to avoid; repeat for several
    #[arg(long = "allergy")]
    allergies: Vec<String>,

    /// Calories already logged today
    #[arg(long, default_value_t = 0.0)]
    calories_logged: f64,

    /// Protein grams already logged today
    #[arg(long, default_value_t = 0.0)]
    protein_logged: f64,

    /// Daily calorie goal override
    #[arg(long)]
    calorie_goal: Option<f64>,

    /// Resolve ingredients against the live composition API
    /// (requires `USDA_API_KEY`) instead of the built-in fixture data
    #[arg(long)]
    live_lookup: bool,

    /// Confirm and persist the proposal after generating it
    #[arg(long)]
    save: bool,
}

fn build_strategy(cli: &Cli, config: &AppConfig) -> Result<Arc<dyn ProposalStrategy>> {
    Ok(match cli.strategy {
        StrategyArg::Heuristic => Arc::new(HeuristicStrategy::new()),
        StrategyArg::Generative => {
            let provider = GroqProvider::new(&config.llm)
                .context("generative strategy needs GROQ_API_KEY")?;
            Arc::new(GenerativeStrategy::new(Box::new(provider)))
        }
    })
}

fn build_lookup(cli: &Cli, config: &AppConfig) -> Result<Arc<dyn FoodLookup>> {
    Ok(if cli.live_lookup {
        Arc::new(UsdaClient::new(config.usda.clone()).context("live lookup needs USDA_API_KEY")?)
    } else {
        Arc::new(MockFoodLookup::new())
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    LoggingConfig::from_env().init()?;
    let config = AppConfig::from_env();

    let user_id = Uuid::new_v4();
    let profiles = Arc::new(InMemoryProfileStore::new());
    profiles
        .put_profile(
            user_id,
            UserProfile {
                diet: Diet::from_str_lossy(&cli.diet),
                allergies: cli.allergies.clone(),
                calorie_override: cli.calorie_goal,
                ..UserProfile::default()
            },
        )
        .await;

    let intake = Arc::new(InMemoryIntakeStore::new());
    intake
        .put_intake(
            user_id,
            chrono::Utc::now().date_naive(),
            NutrientTotals {
                calories: cli.calories_logged,
                protein_g: cli.protein_logged,
                ..NutrientTotals::zero()
            },
        )
        .await;

    let meals: Arc<InMemoryMealStore> = Arc::new(InMemoryMealStore::new());
    let session = MealSession::open(
        Some(user_id),
        profiles,
        intake,
        Arc::clone(&meals) as Arc<dyn MealStore>,
        build_strategy(&cli, &config)?,
        IngredientResolver::new(build_lookup(&cli, &config)?)
            .with_timeout(config.usda.request_timeout),
        config.goals.clone(),
    )?;

    let (goals, budget) = session.budget().await?;
    info!(
        calorie_goal = goals.calories,
        remaining_calories = budget.calories,
        "computed remaining budget"
    );

    let proposal = match session.generate().await? {
        GenerateOutcome::Ready(proposal) => proposal,
        GenerateOutcome::Superseded => anyhow::bail!("generation was superseded"),
    };

    // Stored totals are exact; round only this rendered copy.
    let mut rendered = proposal.clone();
    rendered.nutrition = rendered.nutrition.rounded();
    for ingredient in &mut rendered.ingredients {
        ingredient.nutrition = ingredient.nutrition.rounded();
    }
    println!("{}", serde_json::to_string_pretty(&rendered)?);

    if cli.save {
        let id = session.save().await?;
        println!("saved meal {id}");
    }

    Ok(())
}
