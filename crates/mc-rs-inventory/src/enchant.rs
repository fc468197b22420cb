//! Enchanting table window.

use std::sync::Arc;

use tracing::debug;

use crate::container::ContainerInventory;
use crate::error::InventoryError;
use crate::holder::{BlockHolder, Holder, Position};
use crate::inventory::Inventory;
use crate::kind::WindowType;
use crate::player::Player;
use crate::window::{CloseCause, Window, WindowKey, WindowState};

pub const ENCHANT_INVENTORY_SIZE: usize = 2;
pub const INPUT_SLOT: usize = 0;
pub const LAPIS_SLOT: usize = 1;

/// Two-slot enchanting table that hands its items back on close.
#[derive(Debug)]
pub struct EnchantInventory {
    container: ContainerInventory,
}

impl EnchantInventory {
    pub fn new(position: Position) -> Result<Self, InventoryError> {
        let inventory = Inventory::with_holder(
            "Enchantment Table",
            ENCHANT_INVENTORY_SIZE,
            WindowType::Enchantment,
            |weak| BlockHolder::new(weak, position).into(),
        )?;
        Ok(Self {
            container: ContainerInventory::new(inventory),
        })
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        self.container.inventory()
    }

    /// Return leftover items to `player` after the window closed.
    ///
    /// Stacks are drained atomically, offered to the player's inventory and
    /// dropped at the player's feet when they do not fit.
    fn return_items(&self, player: &dyn Player) {
        let items = self.inventory().drain();
        if items.is_empty() {
            return;
        }
        let leftovers = player.inventory().add_item(items);
        for item in leftovers {
            debug!(
                "Dropping {}x item {} for {}: inventory full",
                item.count,
                item.runtime_id,
                player.name()
            );
            player.drop_item(item);
        }
    }
}

impl Window for EnchantInventory {
    fn key(&self) -> WindowKey {
        self.container.key()
    }

    fn title(&self) -> &str {
        self.container.title()
    }

    fn network_type(&self) -> WindowType {
        WindowType::Enchantment
    }

    fn holder(&self) -> Option<&Holder> {
        self.container.holder()
    }

    fn open(&self, player: &Arc<dyn Player>) -> Result<u8, InventoryError> {
        self.container.open(player)
    }

    fn close(&self, player: &Arc<dyn Player>, cause: CloseCause) {
        if self.container.close_for(player, cause) {
            self.return_items(player.as_ref());
        }
    }

    fn state(&self, player: &dyn Player) -> WindowState {
        self.container.state(player)
    }

    fn try_state(&self, player: &dyn Player) -> Option<WindowState> {
        self.container.try_state(player)
    }

    fn send_contents(&self, player: &dyn Player) {
        self.container.send_contents(player);
    }
}
