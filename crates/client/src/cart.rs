//! Shopping cart model.
//!
//! An ordered list of lines, unique by dish id, kept in insertion order.
//! Adding a dish that is already present bumps its quantity and keeps the
//! name, price and image captured on the first add. A line never exists
//! with quantity zero.
//!
//! The cart is persisted after every mutation and never talks to the
//! network.

use std::sync::Arc;

use hotmeal_core::{DishId, Price};
use serde::{Deserialize, Serialize};

use crate::draft::DraftLine;
use crate::storage::{StorageError, StorageGateway, keys, restore_or_default, save_json};

/// What the menu hands to the cart when a dish is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub item_id: DishId,
    pub name: String,
    pub unit_price: Price,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// A cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: DishId,
    pub name: String,
    pub unit_price: Price,
    #[serde(default)]
    pub image_ref: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    fn from_item(item: CartItem) -> Self {
        Self {
            item_id: item.item_id,
            name: item.name,
            unit_price: item.unit_price,
            image_ref: item.image_ref,
            quantity: 1,
        }
    }

    /// `quantity x unit_price`, unrounded.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// The cart.
pub struct CartModel {
    lines: Vec<CartLine>,
    storage: Arc<dyn StorageGateway>,
}

impl std::fmt::Debug for CartModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartModel")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartModel {
    /// Load the persisted cart.
    ///
    /// Lines with zero quantity are dropped and duplicate ids are merged into
    /// the first occurrence, so a hand-edited snapshot cannot break the
    /// uniqueness invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage gateway fails. An unreadable snapshot
    /// yields an empty cart.
    pub fn restore(storage: Arc<dyn StorageGateway>) -> Result<Self, StorageError> {
        let stored: Vec<CartLine> = restore_or_default(storage.as_ref(), keys::CART)?;
        let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());
        for line in stored.into_iter().filter(|l| l.quantity > 0) {
            match lines.iter_mut().find(|l| l.item_id == line.item_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }
        tracing::debug!(lines = lines.len(), "Cart restored");
        Ok(Self { lines, storage })
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Quantity of `item_id`, or zero.
    #[must_use]
    pub fn quantity_of(&self, item_id: DishId) -> u32 {
        self.line(item_id).map_or(0, |l| l.quantity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `item`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), StorageError> {
        if let Some(line) = self.line_mut(item.item_id) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.lines.push(CartLine::from_item(item));
        }
        self.persist()
    }

    /// Add one unit of an existing line. Returns `false` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn increase(&mut self, item_id: DishId) -> Result<bool, StorageError> {
        let Some(line) = self.line_mut(item_id) else {
            return Ok(false);
        };
        line.quantity = line.quantity.saturating_add(1);
        self.persist()?;
        Ok(true)
    }

    /// Remove one unit; a line at quantity 1 is removed entirely.
    /// Returns `false` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn decrease(&mut self, item_id: DishId) -> Result<bool, StorageError> {
        let Some(index) = self.position(item_id) else {
            return Ok(false);
        };
        let remove = match self.lines.get_mut(index) {
            Some(line) if line.quantity > 1 => {
                line.quantity -= 1;
                false
            }
            _ => true,
        };
        if remove {
            self.lines.remove(index);
        }
        self.persist()?;
        Ok(true)
    }

    /// Remove a line regardless of quantity. Returns `false` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn remove(&mut self, item_id: DishId) -> Result<bool, StorageError> {
        let Some(index) = self.position(item_id) else {
            return Ok(false);
        };
        self.lines.remove(index);
        self.persist()?;
        Ok(true)
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.lines.clear();
        self.persist()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |total, l| total.saturating_add(l.quantity))
    }

    /// Sum of line subtotals at full precision.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Total price rounded to two decimals, for display.
    #[must_use]
    pub fn display_total(&self) -> String {
        self.total_price().to_string()
    }

    /// Project the cart onto order lines.
    #[must_use]
    pub fn to_draft_lines(&self) -> Vec<DraftLine> {
        self.lines
            .iter()
            .map(|l| DraftLine {
                dish_id: l.item_id,
                quantity: l.quantity,
            })
            .collect()
    }

    fn position(&self, item_id: DishId) -> Option<usize> {
        self.lines.iter().position(|l| l.item_id == item_id)
    }

    fn line(&self, item_id: DishId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    fn line_mut(&mut self, item_id: DishId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.item_id == item_id)
    }

    fn persist(&self) -> Result<(), StorageError> {
        tracing::debug!(lines = self.lines.len(), count = self.total_count(), "Cart updated");
        save_json(self.storage.as_ref(), keys::CART, &self.lines)
    }
}
