mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Category operations
    fn get_or_create_category(&self, name: &str) -> Result<i64>;
    fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;

    // Item operations
    fn create_item(&self, name: &str, category_id: i64, image_name: &str) -> Result<i64>;
    fn get_item(&self, id: i64) -> Result<Option<Item>>;
    fn get_item_by_name(&self, name: &str) -> Result<Option<Item>>;
    fn list_items(&self) -> Result<Vec<Item>>;
    fn search_items(&self, keyword: &str) -> Result<Vec<Item>>;
    /// Applies the fields of `changes` that differ from the stored row.
    /// Returns `false` when nothing differed and no write happened.
    fn update_item(&self, id: i64, changes: &ItemChanges) -> Result<bool>;
    /// Removes the item and returns the image name it referenced.
    fn delete_item(&self, id: i64) -> Result<Option<String>>;
    fn count_items_with_image(&self, image_name: &str) -> Result<i64>;
}
