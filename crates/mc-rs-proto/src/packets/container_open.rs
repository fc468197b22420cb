//! ContainerOpen (0x2E): Server → Client.
//!
//! Opens a container window on the client. Block-anchored windows carry the
//! anchor position; the client uses it to place the UI even when no real
//! block exists there.

use bytes::BufMut;

use crate::codec::ProtoEncode;
use crate::types::{BlockPos, VarLong};

/// Entity unique id sent for windows that are not attached to an entity.
pub const NO_ENTITY: i64 = -1;

/// Opens a container window for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOpen {
    /// Window id allocated for this container session.
    pub window_id: u8,
    /// Window type code (two's complement of the signed protocol value).
    pub window_type: u8,
    /// Anchor position of the window.
    pub position: BlockPos,
    /// Entity unique ID, [`NO_ENTITY`] for block containers.
    pub entity_unique_id: i64,
}

impl ContainerOpen {
    /// A block-anchored window.
    pub fn at_block(window_id: u8, window_type: u8, position: BlockPos) -> Self {
        Self {
            window_id,
            window_type,
            position,
            entity_unique_id: NO_ENTITY,
        }
    }
}

impl ProtoEncode for ContainerOpen {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.window_id);
        buf.put_u8(self.window_type);
        self.position.proto_encode(buf);
        VarLong(self.entity_unique_id).proto_encode(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_enchant_table_window() {
        let pkt = ContainerOpen::at_block(3, 3, BlockPos::new(10, 64, 10));
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        // id, type, VarInt(10)=20, VarUInt32(64), VarInt(10)=20, VarLong(-1)=1
        assert_eq!(&buf[..], &[3, 3, 20, 64, 20, 1]);
    }

    #[test]
    fn encode_negative_type_code() {
        let pkt = ContainerOpen::at_block(1, -1i8 as u8, BlockPos::ORIGIN);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf[1], 0xFF);
    }
}
