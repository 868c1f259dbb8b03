pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{FileSessionStore, HttpPlatformClient};
pub use config::AppConfig;
pub use self::core::{
    engine::MealStoryEngine,
    fetcher::NeisMenuFetcher,
    normalizer::normalize_dish_text,
    publisher::{AuthState, Authenticator, Publisher},
    renderer::ImageRenderer,
};
pub use domain::model::{MealDate, MealEntry, MealRecord, MealSlot, RunSummary, SlotOutcome};
pub use utils::error::{Result, StoryError};
