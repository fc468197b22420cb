//! Fixed-capacity slot storage shared between viewers.
//!
//! An [`Inventory`] is shared as `Arc<Inventory>`. Every mutation runs under
//! the slot lock and broadcasts to the registered viewers before the lock is
//! released, so each viewer receives updates in commit order and never sees a
//! slot state that did not exist.

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Weak};

use mc_rs_proto::item_stack::ItemStack;
use mc_rs_proto::packets::{InventoryContent, InventorySlot};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::InventoryError;
use crate::holder::{Holder, InventoryHolder};
use crate::kind::{WindowDescriptor, WindowType};
use crate::player::{Player, WindowPacket};
use crate::snapshot::{InventorySnapshot, SlotSnapshot};
use crate::window::WindowKey;

/// Default maximum number of items per slot.
pub const DEFAULT_MAX_STACK_SIZE: u16 = 64;

#[derive(Debug)]
pub struct Inventory {
    key: WindowKey,
    name: String,
    network_type: WindowType,
    holder: Option<Holder>,
    max_stack_size: AtomicU16,
    /// Length of `slots`; never changes.
    capacity: usize,
    slots: Mutex<Vec<ItemStack>>,
    /// Players observing this inventory, by runtime id.
    viewers: Mutex<HashMap<u64, Weak<dyn Player>>>,
}

impl Inventory {
    /// Create an inventory without a holder.
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        network_type: WindowType,
    ) -> Result<Arc<Self>, InventoryError> {
        Self::build(name.into(), capacity, network_type, |_| None)
    }

    /// Create an inventory that owns its holder.
    ///
    /// `make_holder` receives a weak handle to the inventory being built so
    /// the holder can point back at it.
    pub fn with_holder(
        name: impl Into<String>,
        capacity: usize,
        network_type: WindowType,
        make_holder: impl FnOnce(Weak<Inventory>) -> Holder,
    ) -> Result<Arc<Self>, InventoryError> {
        Self::build(name.into(), capacity, network_type, |weak| {
            Some(make_holder(weak))
        })
    }

    pub fn from_descriptor(descriptor: &WindowDescriptor) -> Result<Arc<Self>, InventoryError> {
        Self::new(
            descriptor.title().to_owned(),
            descriptor.capacity(),
            descriptor.network_type(),
        )
    }

    fn build(
        name: String,
        capacity: usize,
        network_type: WindowType,
        make_holder: impl FnOnce(Weak<Inventory>) -> Option<Holder>,
    ) -> Result<Arc<Self>, InventoryError> {
        if capacity == 0 {
            return Err(InventoryError::InvalidConfiguration(format!(
                "inventory '{name}' must have a positive capacity"
            )));
        }
        Ok(Arc::new_cyclic(|weak| Self {
            key: WindowKey::next(),
            name,
            network_type,
            holder: make_holder(weak.clone()),
            max_stack_size: AtomicU16::new(DEFAULT_MAX_STACK_SIZE),
            capacity,
            slots: Mutex::new(vec![ItemStack::empty(); capacity]),
            viewers: Mutex::new(HashMap::new()),
        }))
    }

    pub fn key(&self) -> WindowKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of slots. Fixed at construction.
    pub fn size(&self) -> usize {
        self.capacity
    }

    /// Protocol window type used when the inventory is shown to a client.
    pub fn network_type(&self) -> WindowType {
        self.network_type
    }

    pub fn holder(&self) -> Option<&Holder> {
        self.holder.as_ref()
    }

    pub fn max_stack_size(&self) -> u16 {
        self.max_stack_size.load(Ordering::Relaxed)
    }

    /// Values below 1 are raised to 1.
    pub fn set_max_stack_size(&self, size: u16) {
        self.max_stack_size.store(size.max(1), Ordering::Relaxed);
    }

    // ----- Slot access -----

    pub fn get_item(&self, slot: usize) -> Option<ItemStack> {
        self.slots.lock().get(slot).cloned()
    }

    /// Replace a single slot and notify viewers.
    pub fn set_item(&self, slot: usize, item: ItemStack) -> Result<(), InventoryError> {
        let mut slots = self.slots.lock();
        let size = slots.len();
        let target = slots
            .get_mut(slot)
            .ok_or(InventoryError::SlotOutOfRange { slot, size })?;
        *target = normalize(item);
        self.notify_slot(slot, &slots[slot]);
        Ok(())
    }

    pub fn clear(&self, slot: usize) -> Result<(), InventoryError> {
        self.set_item(slot, ItemStack::empty())
    }

    /// Add stacks across the whole inventory. See [`Inventory::add_item_in`].
    pub fn add_item(&self, items: impl IntoIterator<Item = ItemStack>) -> Vec<ItemStack> {
        self.add_item_in(0..usize::MAX, items)
    }

    /// Add stacks to the slots in `range` (clamped to the inventory size).
    ///
    /// Each stack is first merged into matching stacks that have room, then
    /// placed into empty slots, both in slot order. Whatever does not fit is
    /// returned; the inventory is never left half-written for a stack.
    pub fn add_item_in(
        &self,
        range: Range<usize>,
        items: impl IntoIterator<Item = ItemStack>,
    ) -> Vec<ItemStack> {
        let max = self.max_stack_size();
        let mut slots = self.slots.lock();
        let range = clamp(range, slots.len());
        let mut changed = BTreeSet::new();
        let mut leftovers = Vec::new();

        for item in items {
            if item.is_empty() {
                continue;
            }
            let mut remaining = item.count;

            for index in range.clone() {
                if remaining == 0 {
                    break;
                }
                let slot = &mut slots[index];
                if slot.can_stack_with(&item) && slot.count < max {
                    let moved = remaining.min(max - slot.count);
                    slot.count += moved;
                    remaining -= moved;
                    changed.insert(index);
                }
            }

            for index in range.clone() {
                if remaining == 0 {
                    break;
                }
                let slot = &mut slots[index];
                if slot.is_empty() {
                    let moved = remaining.min(max);
                    *slot = item.with_count(moved);
                    remaining -= moved;
                    changed.insert(index);
                }
            }

            if remaining > 0 {
                debug!(
                    "Inventory '{}': {} of item {} did not fit",
                    self.name, remaining, item.runtime_id
                );
                leftovers.push(item.with_count(remaining));
            }
        }

        for index in changed {
            self.notify_slot(index, &slots[index]);
        }
        leftovers
    }

    /// Whether all of `item` would fit right now.
    pub fn can_add_item(&self, item: &ItemStack) -> bool {
        if item.is_empty() {
            return true;
        }
        let max = self.max_stack_size();
        let slots = self.slots.lock();
        let mut room: u32 = 0;
        for slot in slots.iter() {
            if slot.is_empty() {
                room += u32::from(max);
            } else if slot.can_stack_with(item) && slot.count < max {
                room += u32::from(max - slot.count);
            }
            if room >= u32::from(item.count) {
                return true;
            }
        }
        false
    }

    /// Remove matching stacks in slot order; returns what could not be removed.
    pub fn remove_item(&self, items: impl IntoIterator<Item = ItemStack>) -> Vec<ItemStack> {
        let mut slots = self.slots.lock();
        let mut changed = BTreeSet::new();
        let mut missing = Vec::new();

        for item in items {
            if item.is_empty() {
                continue;
            }
            let mut remaining = item.count;
            for (index, slot) in slots.iter_mut().enumerate() {
                if remaining == 0 {
                    break;
                }
                if slot.can_stack_with(&item) {
                    let taken = remaining.min(slot.count);
                    slot.count -= taken;
                    remaining -= taken;
                    if slot.count == 0 {
                        *slot = ItemStack::empty();
                    }
                    changed.insert(index);
                }
            }
            if remaining > 0 {
                missing.push(item.with_count(remaining));
            }
        }

        for index in changed {
            self.notify_slot(index, &slots[index]);
        }
        missing
    }

    /// Whether at least `item.count` matching items are present.
    pub fn contains(&self, item: &ItemStack) -> bool {
        let slots = self.slots.lock();
        let total: u32 = slots
            .iter()
            .filter(|slot| slot.can_stack_with(item))
            .map(|slot| u32::from(slot.count))
            .sum();
        total >= u32::from(item.count)
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.lock().iter().position(ItemStack::is_empty)
    }

    /// Non-empty slots, in slot order.
    pub fn contents(&self) -> Vec<(usize, ItemStack)> {
        self.contents_in(0..usize::MAX)
    }

    /// Non-empty slots inside `range`, with absolute slot indices.
    pub fn contents_in(&self, range: Range<usize>) -> Vec<(usize, ItemStack)> {
        let slots = self.slots.lock();
        let range = clamp(range, slots.len());
        range
            .filter(|&i| !slots[i].is_empty())
            .map(|i| (i, slots[i].clone()))
            .collect()
    }

    /// Every slot inside `range`, empty slots included.
    pub fn slots_in(&self, range: Range<usize>) -> Vec<ItemStack> {
        let slots = self.slots.lock();
        let range = clamp(range, slots.len());
        slots[range].to_vec()
    }

    /// Empty every slot; viewers get one full-contents update each.
    pub fn clear_all(&self) {
        let mut slots = self.slots.lock();
        slots.fill(ItemStack::empty());
        self.notify_all(&slots);
    }

    /// Empty the slots in `range`, notifying each slot that changed.
    pub fn clear_range(&self, range: Range<usize>) {
        let mut slots = self.slots.lock();
        let range = clamp(range, slots.len());
        for index in range {
            if !slots[index].is_empty() {
                slots[index] = ItemStack::empty();
                self.notify_slot(index, &slots[index]);
            }
        }
    }

    /// Take every stack out and leave the inventory empty, atomically.
    pub fn drain(&self) -> Vec<ItemStack> {
        let mut slots = self.slots.lock();
        let taken: Vec<ItemStack> = slots
            .iter_mut()
            .filter(|slot| !slot.is_empty())
            .map(std::mem::take)
            .collect();
        if !taken.is_empty() {
            self.notify_all(&slots);
        }
        taken
    }

    /// Take the stacks in `range` out, notifying each slot that changed.
    pub fn drain_range(&self, range: Range<usize>) -> Vec<ItemStack> {
        let mut slots = self.slots.lock();
        let range = clamp(range, slots.len());
        let mut taken = Vec::new();
        for index in range {
            if !slots[index].is_empty() {
                taken.push(std::mem::take(&mut slots[index]));
                self.notify_slot(index, &slots[index]);
            }
        }
        taken
    }

    /// Run several slot writes as one mutation.
    ///
    /// Viewers receive a single full-contents update once `f` returns.
    pub fn batch<R>(&self, f: impl FnOnce(&mut [ItemStack]) -> R) -> R {
        let mut slots = self.slots.lock();
        let result = f(&mut slots);
        for slot in slots.iter_mut() {
            if slot.is_empty() && *slot != ItemStack::empty() {
                *slot = ItemStack::empty();
            }
        }
        self.notify_all(&slots);
        result
    }

    // ----- Viewers -----

    /// Register `player` as a viewer. Re-adding the same player is a no-op.
    pub fn add_viewer(&self, player: &Arc<dyn Player>) {
        let mut viewers = self.viewers.lock();
        viewers.retain(|_, weak| weak.strong_count() > 0);
        viewers.insert(player.runtime_id(), Arc::downgrade(player));
    }

    pub fn remove_viewer(&self, runtime_id: u64) -> bool {
        self.viewers.lock().remove(&runtime_id).is_some()
    }

    pub fn is_viewer(&self, runtime_id: u64) -> bool {
        self.viewers.lock().contains_key(&runtime_id)
    }

    /// Live viewers.
    pub fn viewers(&self) -> Vec<Arc<dyn Player>> {
        self.viewers
            .lock()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    // ----- Sync -----

    /// Send the full contents to `player` under `window_id`.
    pub fn send_contents(&self, player: &dyn Player, window_id: u8) {
        self.send_range(player, window_id, 0..usize::MAX);
    }

    /// Send the slots in `range` to `player` as the full contents of `window_id`.
    pub fn send_range(&self, player: &dyn Player, window_id: u8, range: Range<usize>) {
        let slots = self.slots.lock();
        let range = clamp(range, slots.len());
        player.send_packet(WindowPacket::Content(InventoryContent {
            window_id: u32::from(window_id),
            items: slots[range].to_vec(),
        }));
    }

    pub fn send_slot(&self, player: &dyn Player, window_id: u8, slot: usize) {
        let slots = self.slots.lock();
        if let Some(item) = slots.get(slot) {
            player.send_packet(slot_packet(window_id, slot, item));
        }
    }

    /// Best-effort copy for diagnostics; `None` if a lock is busy.
    pub fn try_snapshot(&self) -> Option<InventorySnapshot> {
        let slots = self.slots.try_lock()?;
        let viewers = self.viewers.try_lock()?;
        Some(InventorySnapshot {
            key: self.key,
            name: self.name.clone(),
            network_type: self.network_type,
            size: slots.len(),
            holder: self.holder.as_ref().map(InventoryHolder::position),
            items: slots
                .iter()
                .enumerate()
                .filter(|(_, item)| !item.is_empty())
                .map(|(slot, item)| SlotSnapshot::new(slot, item))
                .collect(),
            viewers: viewers.keys().copied().collect(),
        })
    }

    // Callers hold the slot lock.
    fn notify_slot(&self, slot: usize, item: &ItemStack) {
        for (player, window_id) in self.live_viewers() {
            player.send_packet(slot_packet(window_id, slot, item));
        }
    }

    // Callers hold the slot lock.
    fn notify_all(&self, slots: &[ItemStack]) {
        for (player, window_id) in self.live_viewers() {
            player.send_packet(WindowPacket::Content(InventoryContent {
                window_id: u32::from(window_id),
                items: slots.to_vec(),
            }));
        }
    }

    /// Viewers that currently hold a window id for this inventory.
    fn live_viewers(&self) -> Vec<(Arc<dyn Player>, u8)> {
        self.viewers
            .lock()
            .values()
            .filter_map(Weak::upgrade)
            .filter_map(|player| {
                let id = player.window_ids().get(self.key)?;
                Some((player, id))
            })
            .collect()
    }
}

fn slot_packet(window_id: u8, slot: usize, item: &ItemStack) -> WindowPacket {
    WindowPacket::Slot(InventorySlot {
        window_id: u32::from(window_id),
        slot: slot as u32,
        item: item.clone(),
    })
}

fn normalize(item: ItemStack) -> ItemStack {
    if item.is_empty() {
        ItemStack::empty()
    } else {
        item
    }
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}
