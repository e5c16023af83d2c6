//! crates/dinner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the hosted database and the conversational-AI provider.

use async_trait::async_trait;

use crate::domain::{DinnerIntent, Leftover, Recipe, TimelineStep};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read access to recipes and the per-user kitchen state they are ranked against.
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    /// All rankable recipes, in the catalog's natural fetch order.
    async fn list_recipes(&self) -> PortResult<Vec<Recipe>>;

    /// The curated fallback set used when a search comes back empty.
    async fn golden_recipes(&self) -> PortResult<Vec<Recipe>> {
        let recipes = self.list_recipes().await?;
        Ok(recipes.into_iter().filter(|r| r.is_golden).collect())
    }

    /// The ordered step list for one recipe. May be empty when none was authored.
    async fn timeline(&self, recipe_id: &str) -> PortResult<Vec<TimelineStep>>;

    async fn pantry(&self, user_id: &str) -> PortResult<Vec<String>>;

    async fn leftovers(&self, user_id: &str) -> PortResult<Vec<Leftover>>;
}

#[async_trait]
pub trait IntentParser: Send + Sync {
    /// Turns a natural-language dinner request into structured criteria.
    async fn parse_intent(&self, text: &str) -> PortResult<DinnerIntent>;
}
