//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::cook::CookService;
use dinner_core::ports::{IntentParser, RecipeCatalog};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn RecipeCatalog>,
    pub intent_parser: Arc<dyn IntentParser>,
    pub cook: Arc<CookService>,
}

impl AppState {
    /// Wires a fresh `CookService` onto the given catalog using the configured timings.
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<dyn RecipeCatalog>,
        intent_parser: Arc<dyn IntentParser>,
    ) -> Arc<Self> {
        let cook = Arc::new(CookService::new(catalog.clone(), config.cook.clone()));
        Arc::new(Self {
            config,
            catalog,
            intent_parser,
            cook,
        })
    }
}
