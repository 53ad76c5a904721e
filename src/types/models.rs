use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// An item row joined with the name of its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub category_id: i64,
    pub category_name: String,
    pub image_name: String,
}

/// Field changes for an item. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub image_name: Option<String>,
}

impl ItemChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category_id.is_none() && self.image_name.is_none()
    }

    /// Drops every field whose value already matches `item`.
    #[must_use]
    pub fn against(self, item: &Item) -> Self {
        Self {
            name: self.name.filter(|name| *name != item.name),
            category_id: self.category_id.filter(|id| *id != item.category_id),
            image_name: self.image_name.filter(|image| *image != item.image_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item {
            id: 1,
            name: "ball".to_string(),
            category_id: 7,
            category_name: "toys".to_string(),
            image_name: "abc.jpg".to_string(),
        }
    }

    #[test]
    fn test_changes_against_drops_identical_fields() {
        let changes = ItemChanges {
            name: Some("ball".to_string()),
            category_id: Some(8),
            image_name: Some("abc.jpg".to_string()),
        }
        .against(&item());

        assert_eq!(changes.name, None);
        assert_eq!(changes.category_id, Some(8));
        assert_eq!(changes.image_name, None);
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_default_changes_are_empty() {
        assert!(ItemChanges::default().is_empty());
        assert!(ItemChanges::default().against(&item()).is_empty());
    }

    #[test]
    fn test_item_json_shape() {
        let value = serde_json::to_value(item()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1,
                "name": "ball",
                "category_name": "toys",
                "image_name": "abc.jpg",
            })
        );
    }
}
