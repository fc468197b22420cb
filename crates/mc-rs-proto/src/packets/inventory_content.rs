//! InventoryContent (0x31): Server → Client.
//!
//! Sends the full contents of a window to the client.

use bytes::BufMut;

use crate::codec::ProtoEncode;
use crate::item_stack::ItemStack;
use crate::types::VarUInt32;

/// Full contents of a container window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryContent {
    /// Window id the contents belong to.
    pub window_id: u32,
    /// Every slot of the window, empty slots included.
    pub items: Vec<ItemStack>,
}

impl ProtoEncode for InventoryContent {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.window_id).proto_encode(buf);
        VarUInt32(self.items.len() as u32).proto_encode(buf);
        for item in &self.items {
            item.proto_encode(buf);
        }
        // FullContainerName: container_id (u8) + dynamic_container_id (VarUInt32 = 0)
        buf.put_u8(0);
        VarUInt32(0).proto_encode(buf);
    }
}
