pub mod domain;
pub mod intent;
pub mod ports;
pub mod ranking;
pub mod timeline;

pub use domain::{
    CookSession, DinnerIntent, Ingredient, Leftover, Nutrition, Recipe, SearchContext,
    SearchOutcome, SessionStatus, SuggestionCard, TimelineStep,
};
pub use intent::KeywordIntentParser;
pub use ports::{IntentParser, PortError, PortResult, RecipeCatalog};
