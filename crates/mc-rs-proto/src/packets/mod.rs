//! Game packets used by container windows.

pub mod add_item_entity;
pub mod container_close;
pub mod container_open;
pub mod inventory_content;
pub mod inventory_slot;

pub use add_item_entity::AddItemEntity;
pub use container_close::ContainerClose;
pub use container_open::ContainerOpen;
pub use inventory_content::InventoryContent;
pub use inventory_slot::InventorySlot;

/// Game packet IDs.
pub mod id {
    pub const ADD_ITEM_ENTITY: u32 = 0x0F;
    pub const CONTAINER_OPEN: u32 = 0x2E;
    pub const CONTAINER_CLOSE: u32 = 0x2F;
    pub const INVENTORY_CONTENT: u32 = 0x31;
    pub const INVENTORY_SLOT: u32 = 0x32;
}
