mod items;
pub mod validation;

pub use items::{ItemService, ItemUpdate, NewItem, UpdateOutcome};
pub use validation::ImageUpload;
