//! crates/dinner_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport; they derive
//! `serde` so the web layer can hand them straight to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

//=========================================================================================
// Cooking Sessions
//=========================================================================================

/// Where a cooking walkthrough currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Cooking,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Cooking => "cooking",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        }
    }
}

/// A single, read-only cooking instruction within a recipe's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStep {
    pub order: u32,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction_localized: Option<String>,
    #[serde(default)]
    pub estimated_minutes: u32,
    /// Countdown for this step; 0 means the step has no timer.
    #[serde(default)]
    pub timer_seconds: u32,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub equipment: String,
    /// Steps sharing a group may be worked in parallel by the cook. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_cue: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<String>,
}

/// One in-progress walkthrough of a recipe's steps by a user.
///
/// The identity fields and the step list are fixed at creation and only
/// exposed through getters. The pointer, status and countdown are mutated by
/// the cooking state machine and the timer engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookSession {
    session_id: Uuid,
    user_id: String,
    recipe_id: String,
    pub current_step_index: usize,
    pub status: SessionStatus,
    /// Remaining countdown for the current step only.
    pub timer_remaining_seconds: u32,
    steps: Vec<TimelineStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CookSession {
    /// Builds a fresh, idle session positioned on the first step.
    ///
    /// Fails with `InvalidInput` when the timeline is empty or its `order`
    /// values are not strictly increasing.
    pub fn new(recipe_id: &str, user_id: &str, steps: Vec<TimelineStep>) -> PortResult<Self> {
        validate_timeline(&steps)?;
        let now = Utc::now();
        let timer_remaining_seconds = steps.first().map(|s| s.timer_seconds).unwrap_or(0);
        Ok(Self {
            session_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            current_step_index: 0,
            status: SessionStatus::Idle,
            timer_remaining_seconds,
            steps,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    /// The step the pointer is on. The constructor guarantees at least one step.
    pub fn current_step(&self) -> &TimelineStep {
        &self.steps[self.current_step_index]
    }

    pub fn last_step_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn is_on_last_step(&self) -> bool {
        self.current_step_index >= self.last_step_index()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Checks that a timeline is non-empty and strictly ordered.
pub fn validate_timeline(steps: &[TimelineStep]) -> PortResult<()> {
    if steps.is_empty() {
        return Err(PortError::InvalidInput(
            "A cooking session needs at least one step".to_string(),
        ));
    }
    if steps.windows(2).any(|pair| pair[0].order >= pair[1].order) {
        return Err(PortError::InvalidInput(
            "Timeline step order values must be unique and increasing".to_string(),
        ));
    }
    Ok(())
}

//=========================================================================================
// Recipes, Pantry and Leftovers
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    /// Optional garnishes and extras don't count towards pantry coverage.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub substitutes: Vec<String>,
}

impl Ingredient {
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            optional: false,
            substitutes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub calories: u32,
    pub protein_g: f32,
    pub carbs_g: f32,
    pub fat_g: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub total_time_minutes: u32,
    pub cookware_count: u32,
    pub servings: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub cook_type: Option<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub kid_friendly: bool,
    #[serde(default)]
    pub spice_level: u8,
    #[serde(default)]
    pub oil_level: u8,
    #[serde(default)]
    pub diet_tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
    /// Part of the curated fallback set.
    #[serde(default)]
    pub is_golden: bool,
}

impl Recipe {
    pub fn required_ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter().filter(|i| !i.optional)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// A previously cooked, not-yet-consumed dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leftover {
    pub name: String,
    #[serde(default)]
    pub servings: Option<u32>,
    /// Safety expiry; past this point the leftover should not be eaten.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Leftover {
    pub fn is_safe_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at > now).unwrap_or(true)
    }
}

//=========================================================================================
// Dinner Intent and Ranking Output
//=========================================================================================

/// Structured dinner request. Every field is optional; an absent field is no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DinnerIntent {
    pub max_time_minutes: Option<u32>,
    pub max_cookware: Option<u32>,
    pub kid_friendly: Option<bool>,
    pub max_spice_level: Option<u8>,
    pub max_oil_level: Option<u8>,
    pub cook_types: Vec<String>,
    pub equipment: Vec<String>,
    pub cuisines: Vec<String>,
    pub diet: Vec<String>,
    /// Hard exclusions: recipes containing any of these never rank.
    pub avoid: Vec<String>,
    /// Ingredients the cook wants to use up; they weigh double in pantry coverage.
    pub must_use: Vec<String>,
    pub servings: Option<u32>,
}

/// Caller state the ranking engine scores against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchContext {
    pub pantry_snapshot: Vec<String>,
    pub leftovers: Vec<Leftover>,
    pub preferred_appliance: Option<String>,
    pub limit: Option<usize>,
}

/// A scored, explained recipe recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionCard {
    pub recipe_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub total_time_minutes: u32,
    pub cookware_count: u32,
    pub servings: u32,
    pub tags: Vec<String>,
    pub kid_friendly: bool,
    pub equipment: Vec<String>,
    pub substitutions: Vec<String>,
    pub leftover_potential: String,
    pub nutrition: Option<Nutrition>,
    pub score: f64,
    pub rank_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub candidates: Vec<SuggestionCard>,
    pub decision_time_ms: u64,
}
