use std::sync::Arc;

use tracing::{info, warn};

use super::validation::{
    ImageUpload, validate_category_name, validate_image, validate_item_name, validate_keyword,
};
use crate::error::{Error, Result};
use crate::images::ImageStore;
use crate::store::Store;
use crate::types::{Item, ItemChanges};

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub image: Option<ImageUpload>,
}

/// Requested changes to an item. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Unchanged,
}

/// Item operations spanning the database and the image store.
pub struct ItemService {
    store: Arc<dyn Store>,
    images: Arc<ImageStore>,
    max_image_bytes: usize,
}

impl ItemService {
    pub fn new(store: Arc<dyn Store>, images: Arc<ImageStore>, max_image_bytes: usize) -> Self {
        Self {
            store,
            images,
            max_image_bytes,
        }
    }

    pub async fn add_item(&self, item: NewItem) -> Result<i64> {
        validate_item_name(&item.name)?;
        validate_category_name(&item.category)?;
        let image = item
            .image
            .ok_or_else(|| Error::InvalidArgument("image is required".to_string()))?;
        validate_image(&image, self.max_image_bytes)?;

        let image_name = self.images.put(&image.bytes).await?;
        let category_id = self.store.get_or_create_category(&item.category)?;

        // An unreferenced blob left behind by a failed insert is harmless.
        let id = self.store.create_item(&item.name, category_id, &image_name)?;

        info!(
            "Item added: id={id} name={} category={} image={image_name}",
            item.name, item.category
        );
        Ok(id)
    }

    pub fn get_item(&self, id: i64) -> Result<Item> {
        self.store.get_item(id)?.ok_or(Error::NotFound)
    }

    pub fn list_items(&self) -> Result<Vec<Item>> {
        self.store.list_items()
    }

    pub fn search_items(&self, keyword: &str) -> Result<Vec<Item>> {
        validate_keyword(keyword)?;
        self.store.search_items(keyword)
    }

    pub async fn update_item(&self, id: i64, update: ItemUpdate) -> Result<UpdateOutcome> {
        let item = self.get_item(id)?;

        if let Some(name) = &update.name {
            validate_item_name(name)?;
        }
        if let Some(category) = &update.category {
            validate_category_name(category)?;
        }
        if let Some(image) = &update.image {
            validate_image(image, self.max_image_bytes)?;
        }

        let mut changes = ItemChanges {
            name: update.name,
            ..ItemChanges::default()
        };

        if let Some(category) = update.category {
            changes.category_id = Some(self.store.get_or_create_category(&category)?);
        }

        if let Some(image) = update.image {
            let image_name = ImageStore::file_name_for(&image.bytes);
            if image_name != item.image_name {
                self.images.put(&image.bytes).await?;
                changes.image_name = Some(image_name);
            } else if !self.images.exists(&item.image_name).await? {
                info!("Restoring missing image {image_name} for item {id}");
                self.images.put(&image.bytes).await?;
            }
        }

        let changes = changes.against(&item);
        if changes.is_empty() || !self.store.update_item(id, &changes)? {
            return Ok(UpdateOutcome::Unchanged);
        }

        info!("Item updated: id={id}");

        if changes.image_name.is_some() {
            self.release_image(&item.image_name).await;
        }

        Ok(UpdateOutcome::Updated)
    }

    pub async fn delete_item(&self, id: i64) -> Result<()> {
        let image_name = self.store.delete_item(id)?.ok_or(Error::NotFound)?;

        info!("Item deleted: id={id}");

        self.release_image(&image_name).await;
        Ok(())
    }

    /// Deletes the blob once no item references it. Another request may
    /// reference the same content between the count and the delete; such an
    /// item then shows the default image until its image is uploaded again.
    async fn release_image(&self, image_name: &str) {
        let remaining = match self.store.count_items_with_image(image_name) {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to count references to image {image_name}: {e}");
                return;
            }
        };

        if remaining > 0 {
            return;
        }

        match self.images.delete(image_name).await {
            Ok(true) => info!("Image removed: {image_name}"),
            Ok(false) => {}
            Err(e) => warn!("Failed to remove image {image_name}: {e}"),
        }
    }
}
