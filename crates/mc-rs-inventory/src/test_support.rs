//! A `Player` that records everything sent to it.

use std::sync::Arc;

use mc_rs_proto::item_stack::ItemStack;
use mc_rs_proto::types::Vec3;
use parking_lot::Mutex;

use crate::inventory::Inventory;
use crate::kind::WindowType;
use crate::player::{Player, WindowPacket};
use crate::window::{WindowIdAllocator, INVENTORY_WINDOW_ID};

pub const MAIN_INVENTORY_SIZE: usize = 36;

pub struct RecordingPlayer {
    runtime_id: u64,
    name: String,
    inventory: Arc<Inventory>,
    window_ids: WindowIdAllocator,
    packets: Mutex<Vec<WindowPacket>>,
    dropped: Mutex<Vec<ItemStack>>,
}

impl RecordingPlayer {
    pub fn new(runtime_id: u64, name: &str) -> Arc<Self> {
        Self::with_allocator(runtime_id, name, WindowIdAllocator::default())
    }

    pub fn with_allocator(runtime_id: u64, name: &str, window_ids: WindowIdAllocator) -> Arc<Self> {
        Self::build(runtime_id, name, window_ids, MAIN_INVENTORY_SIZE)
    }

    /// A player whose main inventory has only `slots` slots.
    pub fn with_inventory_size(runtime_id: u64, name: &str, slots: usize) -> Arc<Self> {
        Self::build(runtime_id, name, WindowIdAllocator::default(), slots)
    }

    fn build(runtime_id: u64, name: &str, window_ids: WindowIdAllocator, slots: usize) -> Arc<Self> {
        let inventory = Inventory::new("Inventory", slots, WindowType::Inventory).unwrap();
        window_ids
            .assign_fixed(inventory.key(), INVENTORY_WINDOW_ID)
            .unwrap();
        Arc::new(Self {
            runtime_id,
            name: name.to_owned(),
            inventory,
            window_ids,
            packets: Mutex::new(Vec::new()),
            dropped: Mutex::new(Vec::new()),
        })
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn Player> {
        self.clone()
    }

    pub fn take_packets(&self) -> Vec<WindowPacket> {
        std::mem::take(&mut *self.packets.lock())
    }

    pub fn dropped(&self) -> Vec<ItemStack> {
        self.dropped.lock().clone()
    }
}

impl Player for RecordingPlayer {
    fn runtime_id(&self) -> u64 {
        self.runtime_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn inventory(&self) -> Arc<Inventory> {
        self.inventory.clone()
    }

    fn window_ids(&self) -> &WindowIdAllocator {
        &self.window_ids
    }

    fn send_packet(&self, packet: WindowPacket) {
        self.packets.lock().push(packet);
    }

    fn drop_item(&self, item: ItemStack) {
        self.dropped.lock().push(item);
    }
}
