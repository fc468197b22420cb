//! InventorySlot (0x32): Server → Client.
//!
//! Updates a single slot in a window.

use bytes::BufMut;

use crate::codec::ProtoEncode;
use crate::item_stack::ItemStack;
use crate::types::VarUInt32;

/// Update a single container slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySlot {
    /// Window id.
    pub window_id: u32,
    /// Slot index within the window.
    pub slot: u32,
    /// The item now in the slot.
    pub item: ItemStack,
}

impl ProtoEncode for InventorySlot {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.window_id).proto_encode(buf);
        VarUInt32(self.slot).proto_encode(buf);
        // FullContainerName
        buf.put_u8(0);
        VarUInt32(0).proto_encode(buf);
        self.item.proto_encode(buf);
    }
}
