//! Uncommitted order awaiting submission.
//!
//! The draft is separate from the cart: the cart is what the customer is
//! browsing with, the draft is what they confirmed on the checkout page,
//! together with the table it should be served to.

use std::sync::Arc;

use hotmeal_core::{AreaId, DishId};
use serde::{Deserialize, Serialize};

use crate::storage::{StorageError, StorageGateway, keys, restore_or_default, save_json};

/// One ordered dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub dish_id: DishId,
    pub quantity: u32,
}

/// The order as it will be posted to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub dish_list: Vec<DraftLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<AreaId>,
}

impl DraftOrder {
    /// Whether there is nothing orderable: no lines, or only zero quantities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dish_list.iter().all(|l| l.quantity == 0)
    }
}

/// Holder of the single persisted draft.
pub struct DraftOrderModel {
    draft: DraftOrder,
    storage: Arc<dyn StorageGateway>,
}

impl std::fmt::Debug for DraftOrderModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftOrderModel")
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}

impl DraftOrderModel {
    /// Load the persisted draft, or an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage gateway fails.
    pub fn restore(storage: Arc<dyn StorageGateway>) -> Result<Self, StorageError> {
        let draft = restore_or_default(storage.as_ref(), keys::DRAFT_ORDER)?;
        Ok(Self { draft, storage })
    }

    #[must_use]
    pub const fn draft(&self) -> &DraftOrder {
        &self.draft
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draft.is_empty()
    }

    /// Replace the draft wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft cannot be persisted.
    pub fn set_draft(
        &mut self,
        lines: Vec<DraftLine>,
        area_id: Option<AreaId>,
    ) -> Result<(), StorageError> {
        self.draft = DraftOrder {
            dish_list: lines,
            area_id,
        };
        tracing::debug!(
            lines = self.draft.dish_list.len(),
            area_id = ?area_id,
            "Draft order set"
        );
        save_json(self.storage.as_ref(), keys::DRAFT_ORDER, &self.draft)
    }

    /// Empty the draft and drop its snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be removed.
    pub fn clear_draft(&mut self) -> Result<(), StorageError> {
        self.draft = DraftOrder::default();
        tracing::debug!("Draft order cleared");
        self.storage.remove(keys::DRAFT_ORDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn line(id: i32, quantity: u32) -> DraftLine {
        DraftLine {
            dish_id: DishId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_set_draft_replaces_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let mut model = DraftOrderModel::restore(storage.clone()).expect("restore");
        model
            .set_draft(vec![line(1, 2)], Some(AreaId::new(4)))
            .expect("set");
        model.set_draft(vec![line(3, 1)], None).expect("set");

        let reloaded = DraftOrderModel::restore(storage).expect("restore");
        assert_eq!(reloaded.draft().dish_list, vec![line(3, 1)]);
        assert_eq!(reloaded.draft().area_id, None);
    }

    #[test]
    fn test_clear_draft_removes_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let mut model = DraftOrderModel::restore(storage.clone()).expect("restore");
        model.set_draft(vec![line(1, 1)], None).expect("set");

        model.clear_draft().expect("clear");

        assert!(model.is_empty());
        assert!(!storage.contains(keys::DRAFT_ORDER));
    }

    #[test]
    fn test_zero_quantity_draft_is_empty() {
        let draft = DraftOrder {
            dish_list: vec![line(1, 0), line(2, 0)],
            area_id: None,
        };
        assert!(draft.is_empty());
        assert!(DraftOrder::default().is_empty());
    }

    #[test]
    fn test_serializes_as_backend_create_body() {
        let draft = DraftOrder {
            dish_list: vec![line(1, 2)],
            area_id: Some(AreaId::new(3)),
        };
        let value = serde_json::to_value(&draft).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"dish_list": [{"dish_id": 1, "quantity": 2}], "area_id": 3})
        );
    }
}
