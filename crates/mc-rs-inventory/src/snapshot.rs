//! Read-only copies of window state for crash reports.

use mc_rs_proto::item_stack::ItemStack;
use serde::Serialize;

use crate::holder::Position;
use crate::kind::WindowType;
use crate::window::WindowKey;

/// A non-empty slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub slot: usize,
    pub runtime_id: i32,
    pub count: u16,
    pub metadata: u16,
}

impl SlotSnapshot {
    pub fn new(slot: usize, item: &ItemStack) -> Self {
        Self {
            slot,
            runtime_id: item.runtime_id,
            count: item.count,
            metadata: item.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySnapshot {
    pub key: WindowKey,
    pub name: String,
    pub network_type: WindowType,
    pub size: usize,
    pub holder: Option<Position>,
    pub items: Vec<SlotSnapshot>,
    /// Runtime ids of the registered viewers.
    pub viewers: Vec<u64>,
}

/// One entry of a player's window-id table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowClaim {
    pub window_id: u8,
    pub key: WindowKey,
    pub fixed: bool,
}
