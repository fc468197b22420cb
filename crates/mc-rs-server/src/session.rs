//! Per-player session: window records and the outbound packet queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use bytes::{Buf, Bytes};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use mc_rs_inventory::inventory::Inventory;
use mc_rs_inventory::snapshot::{InventorySnapshot, WindowClaim};
use mc_rs_inventory::ui::player_ui_inventory;
use mc_rs_inventory::window::{INVENTORY_WINDOW_ID, UI_WINDOW_ID};
use mc_rs_inventory::{
    CloseCause, InventoryError, Player, Window, WindowIdAllocator, WindowPacket, WindowState,
    WindowType,
};
use mc_rs_proto::codec::{encode_packet, ProtoDecode};
use mc_rs_proto::error::ProtoError;
use mc_rs_proto::item_stack::ItemStack;
use mc_rs_proto::packets::{self, AddItemEntity, ContainerClose};
use mc_rs_proto::types::Vec3;

use crate::config::ServerConfig;

/// Slots in the player's main inventory (hotbar included).
pub const MAIN_INVENTORY_SIZE: usize = 36;

/// Shared entity id counter for entities spawned by sessions.
#[derive(Debug, Default)]
pub struct EntityIds(AtomicU64);

impl EntityIds {
    pub fn new(first: u64) -> Self {
        Self(AtomicU64::new(first))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// A connected player.
///
/// Packets are encoded as game sub-packets and queued on an unbounded
/// channel; the transport task owns the receiving end.
pub struct PlayerSession {
    runtime_id: u64,
    name: String,
    position: Mutex<Vec3>,
    inventory: Arc<Inventory>,
    ui_inventory: Arc<Inventory>,
    window_ids: WindowIdAllocator,
    /// Open windows by window id.
    windows: Mutex<HashMap<u8, Arc<dyn Window>>>,
    outbound: mpsc::UnboundedSender<Bytes>,
    entity_ids: Arc<EntityIds>,
    disconnected: AtomicBool,
    this: Weak<PlayerSession>,
}

impl PlayerSession {
    pub fn new(
        runtime_id: u64,
        name: impl Into<String>,
        config: &ServerConfig,
        outbound: mpsc::UnboundedSender<Bytes>,
        entity_ids: Arc<EntityIds>,
    ) -> Result<Arc<Self>, InventoryError> {
        let window_ids = WindowIdAllocator::new(config.windows.range())?;
        let inventory = Inventory::new("Inventory", MAIN_INVENTORY_SIZE, WindowType::Inventory)?;
        inventory.set_max_stack_size(config.inventory.max_stack_size);
        let ui_inventory = player_ui_inventory()?;
        ui_inventory.set_max_stack_size(config.inventory.max_stack_size);
        window_ids.assign_fixed(inventory.key(), INVENTORY_WINDOW_ID)?;
        window_ids.assign_fixed(ui_inventory.key(), UI_WINDOW_ID)?;

        let session = Arc::new_cyclic(|this| Self {
            runtime_id,
            name: name.into(),
            position: Mutex::new(Vec3::ZERO),
            inventory,
            ui_inventory,
            window_ids,
            windows: Mutex::new(HashMap::new()),
            outbound,
            entity_ids,
            disconnected: AtomicBool::new(false),
            this: this.clone(),
        });

        let player: Arc<dyn Player> = session.clone();
        session.inventory.add_viewer(&player);
        session.ui_inventory.add_viewer(&player);
        Ok(session)
    }

    pub fn ui_inventory(&self) -> &Arc<Inventory> {
        &self.ui_inventory
    }

    pub fn set_position(&self, position: Vec3) {
        *self.position.lock() = position;
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    fn as_player(&self) -> Option<Arc<dyn Player>> {
        let this: Arc<dyn Player> = self.this.upgrade()?;
        Some(this)
    }

    /// Show `window` to this player and record it under its id.
    ///
    /// Fails once [`disconnect`](Self::disconnect) has started; the flag is
    /// checked under the window lock so no window is recorded after the
    /// forced close ran.
    pub fn open_window(&self, window: Arc<dyn Window>) -> Result<u8, InventoryError> {
        let mut windows = self.windows.lock();
        let player = match self.as_player() {
            Some(p) if !self.is_disconnected() => p,
            _ => {
                return Err(InventoryError::WindowAllocation(format!(
                    "{} is disconnected",
                    self.name
                )))
            }
        };
        let window_id = window.open(&player)?;
        windows.insert(window_id, window);
        Ok(window_id)
    }

    /// Close the window recorded under `window_id`. Returns `false` if there
    /// is none.
    pub fn close_window(&self, window_id: u8, cause: CloseCause) -> bool {
        let window = self.windows.lock().remove(&window_id);
        match (window, self.as_player()) {
            (Some(window), Some(player)) => {
                window.close(&player, cause);
                true
            }
            _ => {
                debug!(
                    "{}: no open window with id {window_id} ({cause:?})",
                    self.name
                );
                false
            }
        }
    }

    pub fn window(&self, window_id: u8) -> Option<Arc<dyn Window>> {
        self.windows.lock().get(&window_id).cloned()
    }

    pub fn open_window_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.windows.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Handle a `ContainerClose` payload sent by the client.
    pub fn handle_container_close(&self, buf: &mut impl Buf) -> Result<(), ProtoError> {
        let request = ContainerClose::proto_decode(buf)?;
        self.close_window(request.window_id, CloseCause::ClientRequest);
        Ok(())
    }

    /// Close every open window. Safe to call more than once.
    pub fn disconnect(&self) {
        let windows: Vec<(u8, Arc<dyn Window>)> = {
            let mut open = self.windows.lock();
            if self.disconnected.swap(true, Ordering::AcqRel) {
                return;
            }
            open.drain().collect()
        };
        if let Some(player) = self.as_player() {
            for (_, window) in &windows {
                window.close(&player, CloseCause::Disconnect);
            }
        }
        self.inventory.remove_viewer(self.runtime_id);
        self.ui_inventory.remove_viewer(self.runtime_id);
        info!(
            "{} disconnected, closed {} window(s)",
            self.name,
            windows.len()
        );
    }

    /// Best-effort state copy for crash reports. Never blocks.
    pub fn try_snapshot(&self) -> SessionSnapshot {
        let windows = self
            .windows
            .try_lock()
            .map(|windows| {
                let mut open: Vec<OpenWindowSnapshot> = windows
                    .iter()
                    .map(|(id, window)| OpenWindowSnapshot {
                        window_id: *id,
                        title: window.title().to_owned(),
                        network_type: window.network_type(),
                        state: window.try_state(self),
                    })
                    .collect();
                open.sort_by_key(|w| w.window_id);
                open
            })
            .unwrap_or_default();

        SessionSnapshot {
            runtime_id: self.runtime_id,
            name: self.name.clone(),
            windows,
            claims: self.window_ids.try_snapshot(),
            inventories: [&self.inventory, &self.ui_inventory]
                .into_iter()
                .filter_map(|inv| inv.try_snapshot())
                .collect(),
        }
    }

    fn queue(&self, packet_id: u32, bytes: Bytes) {
        if self.outbound.send(bytes).is_err() {
            debug!(
                "{}: dropped packet 0x{packet_id:02X}, connection closed",
                self.name
            );
        }
    }
}

impl Player for PlayerSession {
    fn runtime_id(&self) -> u64 {
        self.runtime_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Vec3 {
        *self.position.lock()
    }

    fn inventory(&self) -> Arc<Inventory> {
        self.inventory.clone()
    }

    fn window_ids(&self) -> &WindowIdAllocator {
        &self.window_ids
    }

    fn send_packet(&self, packet: WindowPacket) {
        let id = packet.id();
        self.queue(id, encode_packet(id, &packet));
    }

    fn drop_item(&self, item: ItemStack) {
        let entity_id = self.entity_ids.next();
        let packet = AddItemEntity {
            entity_unique_id: entity_id as i64,
            entity_runtime_id: entity_id,
            item,
            position: self.position(),
            velocity: Vec3::ZERO,
            is_from_fishing: false,
        };
        self.queue(
            packets::id::ADD_ITEM_ENTITY,
            encode_packet(packets::id::ADD_ITEM_ENTITY, &packet),
        );
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenWindowSnapshot {
    pub window_id: u8,
    pub title: String,
    pub network_type: WindowType,
    /// `None` when the window was mid open/close.
    pub state: Option<WindowState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub runtime_id: u64,
    pub name: String,
    pub windows: Vec<OpenWindowSnapshot>,
    /// `None` when the id table was locked.
    pub claims: Option<Vec<WindowClaim>>,
    pub inventories: Vec<InventorySnapshot>,
}
