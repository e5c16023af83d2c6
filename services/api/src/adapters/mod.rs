pub mod db;
pub mod intent_llm;
pub mod memory;

pub use db::DbAdapter;
pub use intent_llm::OpenAiIntentAdapter;
pub use memory::InMemoryCatalog;
