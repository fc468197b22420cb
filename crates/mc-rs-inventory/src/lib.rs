//! Container windows for Minecraft Bedrock Edition.
//!
//! Server-side inventories, the per-player window-id table, and the
//! open/close handshake that keeps a client's open screens in sync with them.

pub mod container;
pub mod enchant;
pub mod error;
pub mod fake_block;
pub mod holder;
pub mod inventory;
pub mod kind;
pub mod player;
pub mod snapshot;
pub mod ui;
pub mod window;

#[cfg(test)]
mod test_support;

pub use container::ContainerInventory;
pub use enchant::EnchantInventory;
pub use error::InventoryError;
pub use fake_block::FakeBlockUiComponent;
pub use holder::{BlockHolder, FakeBlockMenu, Holder, InventoryHolder, Position};
pub use inventory::Inventory;
pub use kind::{WindowDescriptor, WindowKind, WindowType};
pub use player::{Player, WindowPacket};
pub use ui::UiComponent;
pub use window::{CloseCause, Window, WindowIdAllocator, WindowKey, WindowProtocol, WindowState};
