pub mod engine;
pub mod fetcher;
pub mod layout;
pub mod normalizer;
pub mod publisher;
pub mod renderer;

pub use crate::domain::model::{MealDate, MealEntry, MealRecord, MealSlot};
pub use crate::domain::ports::{CredentialStore, MenuSource, SessionProvider, StoryUploader};
pub use crate::utils::error::Result;
