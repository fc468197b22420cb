//! The player collaborator and the packets the window layer sends to it.

use std::sync::Arc;

use bytes::BufMut;
use mc_rs_proto::codec::ProtoEncode;
use mc_rs_proto::item_stack::ItemStack;
use mc_rs_proto::packets::{self, ContainerClose, ContainerOpen, InventoryContent, InventorySlot};
use mc_rs_proto::types::Vec3;

use crate::inventory::Inventory;
use crate::window::WindowIdAllocator;

/// A packet produced by the window layer for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowPacket {
    Open(ContainerOpen),
    Close(ContainerClose),
    Content(InventoryContent),
    Slot(InventorySlot),
}

impl WindowPacket {
    /// Game packet id.
    pub fn id(&self) -> u32 {
        match self {
            WindowPacket::Open(_) => packets::id::CONTAINER_OPEN,
            WindowPacket::Close(_) => packets::id::CONTAINER_CLOSE,
            WindowPacket::Content(_) => packets::id::INVENTORY_CONTENT,
            WindowPacket::Slot(_) => packets::id::INVENTORY_SLOT,
        }
    }

    /// Window id the packet addresses.
    pub fn window_id(&self) -> u32 {
        match self {
            WindowPacket::Open(p) => u32::from(p.window_id),
            WindowPacket::Close(p) => u32::from(p.window_id),
            WindowPacket::Content(p) => p.window_id,
            WindowPacket::Slot(p) => p.window_id,
        }
    }
}

impl ProtoEncode for WindowPacket {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        match self {
            WindowPacket::Open(p) => p.proto_encode(buf),
            WindowPacket::Close(p) => p.proto_encode(buf),
            WindowPacket::Content(p) => p.proto_encode(buf),
            WindowPacket::Slot(p) => p.proto_encode(buf),
        }
    }
}

/// A connected player, as seen by the window layer.
///
/// Implementations must make `send_packet` non-blocking and must not call
/// back into an inventory from it: inventories send while holding their slot
/// lock so every viewer observes mutations in commit order.
pub trait Player: Send + Sync {
    /// Unique runtime id; identifies the player in viewer sets.
    fn runtime_id(&self) -> u64;

    fn name(&self) -> &str;

    /// Current position, where dropped items spawn.
    fn position(&self) -> Vec3;

    /// The player's personal inventory.
    fn inventory(&self) -> Arc<Inventory>;

    /// The per-session window-id table.
    fn window_ids(&self) -> &WindowIdAllocator;

    /// Queue a packet for this player's connection.
    fn send_packet(&self, packet: WindowPacket);

    /// Spawn `item` as a dropped item entity at the player's position.
    fn drop_item(&self, item: ItemStack);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use mc_rs_proto::codec::encode_packet;

    #[test]
    fn packet_ids_and_window_ids() {
        let close = WindowPacket::Close(ContainerClose {
            window_id: 7,
            server_initiated: true,
        });
        assert_eq!(close.id(), 0x2F);
        assert_eq!(close.window_id(), 7);

        let content = WindowPacket::Content(InventoryContent {
            window_id: 124,
            items: Vec::new(),
        });
        assert_eq!(content.id(), 0x31);
        assert_eq!(content.window_id(), 124);
    }

    #[test]
    fn encodes_like_inner_packet() {
        let inner = ContainerClose {
            window_id: 2,
            server_initiated: false,
        };
        let mut direct = BytesMut::new();
        inner.proto_encode(&mut direct);

        let wrapped = WindowPacket::Close(inner);
        let bytes = encode_packet(wrapped.id(), &wrapped);
        assert_eq!(bytes[0], 0x2F);
        assert_eq!(&bytes[1..], &direct[..]);
    }
}
