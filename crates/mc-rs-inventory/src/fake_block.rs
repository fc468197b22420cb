//! UI windows anchored to a block that may not exist.
//!
//! A [`FakeBlockUiComponent`] shows a slice of the player UI inventory as a
//! block screen (enchanting table, generic UI). The client needs a block
//! position to open such a screen; the component carries a virtual holder
//! whose position is sent verbatim, loaded or not.

use std::sync::Arc;

use tracing::debug;

use crate::error::InventoryError;
use crate::holder::{FakeBlockMenu, Holder, InventoryHolder, Position};
use crate::inventory::Inventory;
use crate::kind::{WindowKind, WindowType};
use crate::player::Player;
use crate::ui::UiComponent;
use crate::window::{CloseCause, Window, WindowKey, WindowProtocol, WindowState};

#[derive(Debug)]
pub struct FakeBlockUiComponent {
    kind: WindowKind,
    component: UiComponent,
    holder: Option<Holder>,
    protocol: WindowProtocol,
}

impl FakeBlockUiComponent {
    /// Slice of `ui_inventory` at `offset`, sized by `kind`, anchored at
    /// `position`.
    pub fn new(
        ui_inventory: Arc<Inventory>,
        kind: WindowKind,
        offset: usize,
        position: Position,
    ) -> Result<Self, InventoryError> {
        let holder = FakeBlockMenu::new(&ui_inventory, position).into();
        Self::build(ui_inventory, kind, offset, Some(holder))
    }

    /// Same as [`FakeBlockUiComponent::new`] without an anchor; the window
    /// opens at the world origin.
    pub fn detached(
        ui_inventory: Arc<Inventory>,
        kind: WindowKind,
        offset: usize,
    ) -> Result<Self, InventoryError> {
        Self::build(ui_inventory, kind, offset, None)
    }

    fn build(
        ui_inventory: Arc<Inventory>,
        kind: WindowKind,
        offset: usize,
        holder: Option<Holder>,
    ) -> Result<Self, InventoryError> {
        let component = UiComponent::new(ui_inventory, offset, kind.capacity())?;
        Ok(Self {
            kind,
            component,
            holder,
            protocol: WindowProtocol::new(WindowKey::next()),
        })
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn component(&self) -> &UiComponent {
        &self.component
    }

    fn sync(&self, player: &dyn Player, window_id: u8) {
        self.component
            .inventory()
            .send_range(player, window_id, self.component.range());
    }

    /// Hand the slice's items back once the screen is gone.
    fn return_items(&self, player: &dyn Player) {
        let items = self.component.drain();
        if items.is_empty() {
            return;
        }
        for item in player.inventory().add_item(items) {
            debug!(
                "Dropping {}x item {} from {} window of {}",
                item.count,
                item.runtime_id,
                self.kind.title(),
                player.name()
            );
            player.drop_item(item);
        }
    }
}

impl Window for FakeBlockUiComponent {
    fn key(&self) -> WindowKey {
        self.protocol.key()
    }

    fn title(&self) -> &str {
        self.kind.title()
    }

    fn network_type(&self) -> WindowType {
        self.kind.network_type()
    }

    fn holder(&self) -> Option<&Holder> {
        self.holder.as_ref()
    }

    fn open(&self, player: &Arc<dyn Player>) -> Result<u8, InventoryError> {
        let anchor = self.holder.as_ref().map(InventoryHolder::position);
        self.protocol.open(
            player.as_ref(),
            self.kind.network_type(),
            anchor,
            |window_id| self.sync(player.as_ref(), window_id),
        )
    }

    fn close(&self, player: &Arc<dyn Player>, cause: CloseCause) {
        let closed = self.protocol.close(player.as_ref(), cause, |window_id| {
            self.sync(player.as_ref(), window_id)
        });
        if closed {
            self.return_items(player.as_ref());
        }
    }

    fn state(&self, player: &dyn Player) -> WindowState {
        self.protocol.state(player.runtime_id())
    }

    fn try_state(&self, player: &dyn Player) -> Option<WindowState> {
        self.protocol.try_state(player.runtime_id())
    }

    fn send_contents(&self, player: &dyn Player) {
        if let Some(window_id) = self.protocol.state(player.runtime_id()).window_id() {
            self.sync(player, window_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::dimension;
    use crate::player::WindowPacket;
    use crate::test_support::RecordingPlayer;
    use crate::ui::player_ui_inventory;
    use mc_rs_proto::item_stack::ItemStack;
    use mc_rs_proto::packets::{ContainerClose, ContainerOpen, InventoryContent};
    use mc_rs_proto::types::BlockPos;

    #[test]
    fn unloaded_position_is_sent_verbatim() {
        let ui = player_ui_inventory().unwrap();
        let far = Position::new(29_999_999, 400, -29_999_999, dimension::NETHER);
        let window = FakeBlockUiComponent::new(ui, WindowKind::EnchantTable, 14, far).unwrap();
        let player = RecordingPlayer::new(1, "Steve");

        let id = window.open(&player.as_dyn()).unwrap();
        assert_eq!(
            player.take_packets(),
            vec![
                WindowPacket::Open(ContainerOpen::at_block(
                    id,
                    3,
                    BlockPos::new(29_999_999, 400, -29_999_999)
                )),
                WindowPacket::Content(InventoryContent {
                    window_id: u32::from(id),
                    items: vec![ItemStack::empty(); 2],
                }),
            ]
        );
        assert!(window.holder().unwrap().is_virtual());
    }

    #[test]
    fn detached_window_opens_at_origin() {
        let ui = player_ui_inventory().unwrap();
        let window = FakeBlockUiComponent::detached(ui, WindowKind::Ui, 50).unwrap();
        let player = RecordingPlayer::new(1, "Steve");

        let id = window.open(&player.as_dyn()).unwrap();
        assert_eq!(
            player.take_packets()[0],
            WindowPacket::Open(ContainerOpen::at_block(id, 0xFF, BlockPos::ORIGIN))
        );
        assert!(window.holder().is_none());
        assert_eq!(window.title(), "UI");
    }

    #[test]
    fn slice_must_fit_in_ui_inventory() {
        let ui = player_ui_inventory().unwrap();
        assert!(matches!(
            FakeBlockUiComponent::new(ui, WindowKind::EnchantTable, 50, Position::ORIGIN),
            Err(InventoryError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn close_syncs_slice_and_returns_items() {
        let ui = player_ui_inventory().unwrap();
        let window =
            FakeBlockUiComponent::new(ui.clone(), WindowKind::EnchantTable, 14, Position::ORIGIN)
                .unwrap();
        let player = RecordingPlayer::new(1, "Steve");
        let dyn_player = player.as_dyn();
        let id = window.open(&dyn_player).unwrap();
        window.component().set_item(1, ItemStack::new(414, 5)).unwrap();
        player.take_packets();

        window.close(&dyn_player, CloseCause::Server);
        assert_eq!(
            player.take_packets(),
            vec![
                WindowPacket::Close(ContainerClose {
                    window_id: id,
                    server_initiated: true,
                }),
                WindowPacket::Content(InventoryContent {
                    window_id: u32::from(id),
                    items: vec![ItemStack::empty(), ItemStack::new(414, 5)],
                }),
            ]
        );
        assert!(window.component().contents().is_empty());
        assert!(player.inventory().contains(&ItemStack::new(414, 5)));
        assert_eq!(window.state(&*player), WindowState::Closed);

        window.close(&dyn_player, CloseCause::Disconnect);
        assert!(player.take_packets().is_empty());
    }

    #[test]
    fn two_fake_windows_get_distinct_ids() {
        let ui = player_ui_inventory().unwrap();
        let a = FakeBlockUiComponent::new(ui.clone(), WindowKind::EnchantTable, 14, Position::ORIGIN)
            .unwrap();
        let b = FakeBlockUiComponent::new(ui, WindowKind::Ui, 16, Position::overworld(1, 1, 1))
            .unwrap();
        let player = RecordingPlayer::new(1, "Steve");
        let dyn_player = player.as_dyn();

        let (id_a, id_b) = std::thread::scope(|s| {
            let ha = s.spawn(|| a.open(&dyn_player));
            let hb = s.spawn(|| b.open(&dyn_player));
            (ha.join().unwrap().unwrap(), hb.join().unwrap().unwrap())
        });
        assert_ne!(id_a, id_b);
        assert_eq!(player.window_ids().open_count(), 2);
    }
}
