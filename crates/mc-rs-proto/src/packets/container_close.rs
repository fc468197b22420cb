//! ContainerClose (0x2F): Bidirectional.
//!
//! Sent by the client when the player closes a window, and by the server to
//! close one (or to acknowledge a client close).

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Closes a container window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerClose {
    /// The window ID of the container to close.
    pub window_id: u8,
    /// Whether the server initiated this close.
    pub server_initiated: bool,
}

impl ProtoEncode for ContainerClose {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.window_id);
        buf.put_u8(u8::from(self.server_initiated));
    }
}

impl ProtoDecode for ContainerClose {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 2)?;
        let window_id = buf.get_u8();
        let server_initiated = buf.get_u8() != 0;
        Ok(Self {
            window_id,
            server_initiated,
        })
    }
}
