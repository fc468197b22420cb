//! ItemStack type and NetworkItemStackDescriptor serialization.
//!
//! The wire format matches Bedrock's `NetworkItemStackDescriptor`.

use bytes::BufMut;

use crate::codec::{write_string, ProtoEncode};
use crate::types::{VarInt, VarUInt32};

/// A single item stack in the Bedrock protocol.
///
/// `runtime_id == 0` means the slot is empty (air).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemStack {
    /// Item runtime ID from the StartGame item table. 0 = air/empty.
    pub runtime_id: i32,
    /// Number of items in this stack.
    pub count: u16,
    /// Item damage/variant metadata.
    pub metadata: u16,
    /// Block runtime ID if this item represents a placeable block.
    pub block_runtime_id: i32,
    /// Raw NBT data in network format (enchantments, custom names).
    pub nbt_data: Vec<u8>,
    /// Blocks this item can be placed on (adventure mode).
    pub can_place_on: Vec<String>,
    /// Blocks this item can destroy (adventure mode).
    pub can_destroy: Vec<String>,
    /// Server-assigned unique ID for inventory tracking. 0 = no ID.
    pub stack_network_id: i32,
}

impl ItemStack {
    /// An empty slot (air).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a simple item stack with no NBT or special data.
    pub fn new(runtime_id: i32, count: u16) -> Self {
        Self {
            runtime_id,
            count,
            ..Self::default()
        }
    }

    /// Create an item stack with metadata (damage or variant).
    pub fn with_meta(runtime_id: i32, count: u16, metadata: u16) -> Self {
        Self {
            runtime_id,
            count,
            metadata,
            ..Self::default()
        }
    }

    /// Whether this slot is empty.
    pub fn is_empty(&self) -> bool {
        self.runtime_id == 0 || self.count == 0
    }

    /// A copy of this stack carrying `count` items.
    pub fn with_count(&self, count: u16) -> Self {
        Self {
            count,
            ..self.clone()
        }
    }

    /// Whether `other` may be merged into this stack.
    ///
    /// Counts and stack network ids are ignored; everything that describes
    /// the item itself must match.
    pub fn can_stack_with(&self, other: &ItemStack) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.runtime_id == other.runtime_id
            && self.metadata == other.metadata
            && self.block_runtime_id == other.block_runtime_id
            && self.nbt_data == other.nbt_data
            && self.can_place_on == other.can_place_on
            && self.can_destroy == other.can_destroy
    }
}

/// Encode as `NetworkItemStackDescriptor`.
///
/// Wire format:
/// ```text
/// VarInt(runtime_id)  0 = empty, return early
/// u16_le(count)
/// VarUInt32(metadata)
/// u8(has_stack_id) + optional VarInt(stack_network_id)
/// VarInt(block_runtime_id)
/// VarUInt32(user_data_marker) + optional NBT
/// VarInt(can_place_on_count) + strings
/// VarInt(can_destroy_count) + strings
/// ```
impl ProtoEncode for ItemStack {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        if self.is_empty() {
            VarInt(0).proto_encode(buf);
            return;
        }
        VarInt(self.runtime_id).proto_encode(buf);
        buf.put_u16_le(self.count);
        VarUInt32(u32::from(self.metadata)).proto_encode(buf);

        if self.stack_network_id != 0 {
            buf.put_u8(1);
            VarInt(self.stack_network_id).proto_encode(buf);
        } else {
            buf.put_u8(0);
        }

        VarInt(self.block_runtime_id).proto_encode(buf);

        if self.nbt_data.is_empty() {
            VarUInt32(0).proto_encode(buf);
        } else {
            // 0xFFFFFFFF marker, then NBT version 1 (network format)
            VarUInt32(0xFFFF_FFFF).proto_encode(buf);
            buf.put_u8(1);
            buf.put_slice(&self.nbt_data);
        }

        VarInt(self.can_place_on.len() as i32).proto_encode(buf);
        for s in &self.can_place_on {
            write_string(buf, s);
        }
        VarInt(self.can_destroy.len() as i32).proto_encode(buf);
        for s in &self.can_destroy {
            write_string(buf, s);
        }
    }
}
