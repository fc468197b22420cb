//! An inventory shown to players as a container window.

use std::sync::Arc;

use crate::error::InventoryError;
use crate::holder::{Holder, InventoryHolder};
use crate::inventory::Inventory;
use crate::kind::WindowType;
use crate::player::Player;
use crate::window::{CloseCause, Window, WindowKey, WindowProtocol, WindowState};

/// Container window over a whole [`Inventory`].
///
/// Opening registers the player as a viewer and syncs the contents; closing
/// sends a final sync and unregisters the viewer before the id is released.
#[derive(Debug)]
pub struct ContainerInventory {
    inventory: Arc<Inventory>,
    protocol: WindowProtocol,
}

impl ContainerInventory {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self {
            protocol: WindowProtocol::new(inventory.key()),
            inventory,
        }
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    /// Close for `player`; returns whether a close sequence actually ran.
    pub fn close_for(&self, player: &Arc<dyn Player>, cause: CloseCause) -> bool {
        self.protocol.close(player.as_ref(), cause, |window_id| {
            self.inventory.send_contents(player.as_ref(), window_id);
            self.inventory.remove_viewer(player.runtime_id());
        })
    }
}

impl Window for ContainerInventory {
    fn key(&self) -> WindowKey {
        self.protocol.key()
    }

    fn title(&self) -> &str {
        self.inventory.name()
    }

    fn network_type(&self) -> WindowType {
        self.inventory.network_type()
    }

    fn holder(&self) -> Option<&Holder> {
        self.inventory.holder()
    }

    fn open(&self, player: &Arc<dyn Player>) -> Result<u8, InventoryError> {
        let anchor = self.inventory.holder().map(InventoryHolder::position);
        self.protocol.open(
            player.as_ref(),
            self.inventory.network_type(),
            anchor,
            |window_id| {
                self.inventory.add_viewer(player);
                self.inventory.send_contents(player.as_ref(), window_id);
            },
        )
    }

    fn close(&self, player: &Arc<dyn Player>, cause: CloseCause) {
        self.close_for(player, cause);
    }

    fn state(&self, player: &dyn Player) -> WindowState {
        self.protocol.state(player.runtime_id())
    }

    fn try_state(&self, player: &dyn Player) -> Option<WindowState> {
        self.protocol.try_state(player.runtime_id())
    }

    fn send_contents(&self, player: &dyn Player) {
        if let Some(window_id) = self.protocol.state(player.runtime_id()).window_id() {
            self.inventory.send_contents(player, window_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::{BlockHolder, Position};
    use crate::player::WindowPacket;
    use crate::test_support::RecordingPlayer;
    use mc_rs_proto::item_stack::ItemStack;
    use mc_rs_proto::packets::{ContainerClose, ContainerOpen, InventoryContent, InventorySlot};
    use mc_rs_proto::types::BlockPos;

    fn chest_at(pos: Position) -> ContainerInventory {
        let inv = Inventory::with_holder("Chest", 3, WindowType::Container, |weak| {
            BlockHolder::new(weak, pos).into()
        })
        .unwrap();
        ContainerInventory::new(inv)
    }

    #[test]
    fn open_sends_open_then_contents() {
        let chest = chest_at(Position::overworld(1, 2, 3));
        let player = RecordingPlayer::new(1, "Steve");
        let id = chest.open(&player.as_dyn()).unwrap();

        assert_eq!(
            player.take_packets(),
            vec![
                WindowPacket::Open(ContainerOpen::at_block(id, 0, BlockPos::new(1, 2, 3))),
                WindowPacket::Content(InventoryContent {
                    window_id: u32::from(id),
                    items: vec![ItemStack::empty(); 3],
                }),
            ]
        );
        assert!(chest.inventory().is_viewer(1));
    }

    #[test]
    fn close_sends_close_then_final_sync() {
        let chest = chest_at(Position::ORIGIN);
        let player = RecordingPlayer::new(1, "Steve");
        let dyn_player = player.as_dyn();
        let id = chest.open(&dyn_player).unwrap();
        chest.inventory().add_item([ItemStack::new(5, 1)]);
        player.take_packets();

        assert!(chest.close_for(&dyn_player, CloseCause::ClientRequest));
        assert_eq!(
            player.take_packets(),
            vec![
                WindowPacket::Close(ContainerClose {
                    window_id: id,
                    server_initiated: false,
                }),
                WindowPacket::Content(InventoryContent {
                    window_id: u32::from(id),
                    items: vec![ItemStack::new(5, 1), ItemStack::empty(), ItemStack::empty()],
                }),
            ]
        );
        assert!(!chest.inventory().is_viewer(1));
        assert_eq!(player.window_ids().get(chest.key()), None);
        assert_eq!(chest.state(&*player), WindowState::Closed);
    }

    #[test]
    fn duplicate_close_is_noop() {
        let chest = chest_at(Position::ORIGIN);
        let player = RecordingPlayer::new(1, "Steve");
        let dyn_player = player.as_dyn();
        chest.open(&dyn_player).unwrap();
        player.take_packets();
        assert!(chest.close_for(&dyn_player, CloseCause::Server));
        let after_first = player.take_packets();
        assert_eq!(after_first.len(), 2);

        assert!(!chest.close_for(&dyn_player, CloseCause::Disconnect));
        assert!(player.take_packets().is_empty());
        assert_eq!(chest.state(&*player), WindowState::Closed);
    }

    #[test]
    fn shared_chest_updates_every_viewer() {
        let chest = chest_at(Position::overworld(0, 64, 0));
        let a = RecordingPlayer::new(1, "Steve");
        let b = RecordingPlayer::new(2, "Alex");
        let id_a = chest.open(&a.as_dyn()).unwrap();
        let id_b = chest.open(&b.as_dyn()).unwrap();
        a.take_packets();
        b.take_packets();

        chest.inventory().set_item(2, ItemStack::new(9, 4)).unwrap();
        let slot = |id: u8| {
            vec![WindowPacket::Slot(InventorySlot {
                window_id: u32::from(id),
                slot: 2,
                item: ItemStack::new(9, 4),
            })]
        };
        assert_eq!(a.take_packets(), slot(id_a));
        assert_eq!(b.take_packets(), slot(id_b));
    }

    #[test]
    fn windows_without_holder_anchor_at_origin() {
        let inv = Inventory::new("Loose", 1, WindowType::Hopper).unwrap();
        let window = ContainerInventory::new(inv);
        let player = RecordingPlayer::new(1, "Steve");
        let id = window.open(&player.as_dyn()).unwrap();
        assert_eq!(
            player.take_packets()[0],
            WindowPacket::Open(ContainerOpen::at_block(id, 8, BlockPos::ORIGIN))
        );
    }

    #[test]
    fn open_close_races_leave_consistent_state() {
        let chest = chest_at(Position::ORIGIN);
        let player = RecordingPlayer::new(1, "Steve");
        let dyn_player = player.as_dyn();
        chest.open(&dyn_player).unwrap();
        player.take_packets();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| chest.close(&dyn_player, CloseCause::ClientRequest));
            }
        });
        let closes = player
            .take_packets()
            .into_iter()
            .filter(|p| matches!(p, WindowPacket::Close(_)))
            .count();
        assert_eq!(closes, 1);
        assert_eq!(player.window_ids().open_count(), 0);
    }
}
