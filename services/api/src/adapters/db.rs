//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `RecipeCatalog` port from the `core` crate. It reads recipes, timelines,
//! pantry items and leftovers from the hosted PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dinner_core::domain::{Ingredient, Leftover, Nutrition, Recipe, TimelineStep};
use dinner_core::ports::{PortError, PortResult, RecipeCatalog};
use sqlx::{types::Json, FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RecipeCatalog` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct RecipeRecord {
    id: String,
    title: String,
    image_url: Option<String>,
    total_time_minutes: i32,
    cookware_count: i32,
    servings: i32,
    tags: Vec<String>,
    cuisine: Option<String>,
    cook_type: Option<String>,
    equipment: Vec<String>,
    kid_friendly: bool,
    spice_level: i16,
    oil_level: i16,
    diet_tags: Vec<String>,
    ingredients: Json<Vec<Ingredient>>,
    nutrition: Option<Json<Nutrition>>,
    is_golden: bool,
}
impl RecipeRecord {
    fn to_domain(self) -> Recipe {
        Recipe {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            total_time_minutes: self.total_time_minutes.max(0) as u32,
            cookware_count: self.cookware_count.max(0) as u32,
            servings: self.servings.max(0) as u32,
            tags: self.tags,
            cuisine: self.cuisine,
            cook_type: self.cook_type,
            equipment: self.equipment,
            kid_friendly: self.kid_friendly,
            spice_level: self.spice_level.clamp(0, u8::MAX as i16) as u8,
            oil_level: self.oil_level.clamp(0, u8::MAX as i16) as u8,
            diet_tags: self.diet_tags,
            ingredients: self.ingredients.0,
            nutrition: self.nutrition.map(|n| n.0),
            is_golden: self.is_golden,
        }
    }
}

#[derive(FromRow)]
struct StepRecord {
    step_order: i32,
    instruction: String,
    instruction_localized: Option<String>,
    estimated_minutes: i32,
    timer_seconds: i32,
    method: String,
    equipment: String,
    concurrency_group: Option<String>,
    cleanup_hint: Option<String>,
    temperature: Option<String>,
    completion_cue: Option<String>,
    icons: Vec<String>,
}
impl StepRecord {
    fn to_domain(self) -> TimelineStep {
        TimelineStep {
            order: self.step_order.max(0) as u32,
            instruction: self.instruction,
            instruction_localized: self.instruction_localized,
            estimated_minutes: self.estimated_minutes.max(0) as u32,
            timer_seconds: self.timer_seconds.max(0) as u32,
            method: self.method,
            equipment: self.equipment,
            concurrency_group: self.concurrency_group,
            cleanup_hint: self.cleanup_hint,
            temperature: self.temperature,
            completion_cue: self.completion_cue,
            icons: self.icons,
        }
    }
}

#[derive(FromRow)]
struct LeftoverRecord {
    name: String,
    servings: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
}
impl LeftoverRecord {
    fn to_domain(self) -> Leftover {
        Leftover {
            name: self.name,
            servings: self.servings.map(|s| s.max(0) as u32),
            expires_at: self.expires_at,
        }
    }
}

const RECIPE_COLUMNS: &str = "id, title, image_url, total_time_minutes, cookware_count, servings, \
     tags, cuisine, cook_type, equipment, kid_friendly, spice_level, oil_level, diet_tags, \
     ingredients, nutrition, is_golden";

//=========================================================================================
// `RecipeCatalog` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecipeCatalog for DbAdapter {
    async fn list_recipes(&self) -> PortResult<Vec<Recipe>> {
        let records = sqlx::query_as::<_, RecipeRecord>(&format!(
            "SELECT {} FROM recipes ORDER BY created_at ASC, id ASC",
            RECIPE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn golden_recipes(&self) -> PortResult<Vec<Recipe>> {
        let records = sqlx::query_as::<_, RecipeRecord>(&format!(
            "SELECT {} FROM recipes WHERE is_golden ORDER BY created_at ASC, id ASC",
            RECIPE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn timeline(&self, recipe_id: &str) -> PortResult<Vec<TimelineStep>> {
        let records = sqlx::query_as::<_, StepRecord>(
            "SELECT step_order, instruction, instruction_localized, estimated_minutes, timer_seconds, \
             method, equipment, concurrency_group, cleanup_hint, temperature, completion_cue, icons \
             FROM recipe_steps WHERE recipe_id = $1 ORDER BY step_order ASC",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn pantry(&self, user_id: &str) -> PortResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM pantry_items WHERE user_id = $1 ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(names)
    }

    async fn leftovers(&self, user_id: &str) -> PortResult<Vec<Leftover>> {
        let records = sqlx::query_as::<_, LeftoverRecord>(
            "SELECT name, servings, expires_at FROM leftovers WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
