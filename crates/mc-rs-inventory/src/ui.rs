//! Player-scoped slices of the UI inventory.
//!
//! Every player has one UI inventory (window id 124) that the client uses for
//! the cursor, crafting grids and screens without a world container. A
//! [`UiComponent`] addresses a contiguous slice of it by offset.

use std::ops::Range;
use std::sync::Arc;

use mc_rs_proto::item_stack::ItemStack;

use crate::error::InventoryError;
use crate::inventory::Inventory;
use crate::kind::WindowType;

/// Slots in the player UI inventory.
pub const PLAYER_UI_SIZE: usize = 51;

/// Cursor slot of the UI inventory.
pub const CURSOR_SLOT: usize = 0;

/// Build a fresh per-player UI inventory.
pub fn player_ui_inventory() -> Result<Arc<Inventory>, InventoryError> {
    Inventory::new("UI", PLAYER_UI_SIZE, WindowType::Inventory)
}

#[derive(Debug, Clone)]
pub struct UiComponent {
    inventory: Arc<Inventory>,
    offset: usize,
    size: usize,
}

impl UiComponent {
    /// A slice of `size` slots starting at `offset`.
    pub fn new(inventory: Arc<Inventory>, offset: usize, size: usize) -> Result<Self, InventoryError> {
        if size == 0 {
            return Err(InventoryError::InvalidConfiguration(
                "UI component must have at least one slot".into(),
            ));
        }
        let end = offset.checked_add(size);
        if end.map_or(true, |end| end > inventory.size()) {
            return Err(InventoryError::InvalidConfiguration(format!(
                "UI slice {offset}+{size} does not fit in '{}' ({} slots)",
                inventory.name(),
                inventory.size()
            )));
        }
        Ok(Self {
            inventory,
            offset,
            size,
        })
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Absolute slot range in the UI inventory.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }

    pub fn get_item(&self, index: usize) -> Option<ItemStack> {
        if index >= self.size {
            return None;
        }
        self.inventory.get_item(self.offset + index)
    }

    pub fn set_item(&self, index: usize, item: ItemStack) -> Result<(), InventoryError> {
        if index >= self.size {
            return Err(InventoryError::SlotOutOfRange {
                slot: index,
                size: self.size,
            });
        }
        self.inventory.set_item(self.offset + index, item)
    }

    pub fn add_item(&self, items: impl IntoIterator<Item = ItemStack>) -> Vec<ItemStack> {
        self.inventory.add_item_in(self.range(), items)
    }

    /// Non-empty slots, indexed relative to the slice.
    pub fn contents(&self) -> Vec<(usize, ItemStack)> {
        self.inventory
            .contents_in(self.range())
            .into_iter()
            .map(|(slot, item)| (slot - self.offset, item))
            .collect()
    }

    /// Every slot of the slice, empty ones included.
    pub fn items(&self) -> Vec<ItemStack> {
        self.inventory.slots_in(self.range())
    }

    pub fn clear_all(&self) {
        self.inventory.clear_range(self.range());
    }

    /// Take the slice's stacks out, leaving its slots empty.
    pub fn drain(&self) -> Vec<ItemStack> {
        self.inventory.drain_range(self.range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_bounds_are_validated() {
        let ui = player_ui_inventory().unwrap();
        assert!(UiComponent::new(ui.clone(), 50, 1).is_ok());
        assert!(matches!(
            UiComponent::new(ui.clone(), 50, 2),
            Err(InventoryError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            UiComponent::new(ui.clone(), 3, 0),
            Err(InventoryError::InvalidConfiguration(_))
        ));
        assert!(UiComponent::new(ui, usize::MAX, 2).is_err());
    }

    #[test]
    fn slice_is_isolated_from_neighbours() {
        let ui = player_ui_inventory().unwrap();
        let left = UiComponent::new(ui.clone(), 14, 2).unwrap();
        let right = UiComponent::new(ui.clone(), 16, 1).unwrap();

        let overflow = left.add_item([ItemStack::new(1, 130)]);
        assert_eq!(overflow, vec![ItemStack::new(1, 2)]);
        assert!(right.contents().is_empty());
        assert_eq!(
            left.contents(),
            vec![(0, ItemStack::new(1, 64)), (1, ItemStack::new(1, 64))]
        );
        assert_eq!(ui.get_item(15), Some(ItemStack::new(1, 64)));

        right.set_item(0, ItemStack::new(2, 1)).unwrap();
        left.clear_all();
        assert!(left.contents().is_empty());
        assert_eq!(right.items(), vec![ItemStack::new(2, 1)]);
    }

    #[test]
    fn out_of_slice_writes_fail() {
        let ui = player_ui_inventory().unwrap();
        let slice = UiComponent::new(ui, 1, 2).unwrap();
        assert_eq!(
            slice.set_item(2, ItemStack::new(1, 1)),
            Err(InventoryError::SlotOutOfRange { slot: 2, size: 2 })
        );
        assert_eq!(slice.get_item(2), None);
    }

    #[test]
    fn drain_empties_only_the_slice() {
        let ui = player_ui_inventory().unwrap();
        ui.set_item(CURSOR_SLOT, ItemStack::new(9, 1)).unwrap();
        let slice = UiComponent::new(ui.clone(), 1, 2).unwrap();
        slice.set_item(1, ItemStack::new(3, 2)).unwrap();
        assert_eq!(slice.drain(), vec![ItemStack::new(3, 2)]);
        assert!(slice.contents().is_empty());
        assert_eq!(ui.get_item(CURSOR_SLOT), Some(ItemStack::new(9, 1)));
    }
}
