//! Protocol encoding/decoding traits and helpers.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtoError;
use crate::types::VarUInt32;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Encode a game sub-packet: `VarUInt32(packet_id)` followed by the payload.
///
/// Batching, compression and encryption belong to the transport.
pub fn encode_packet(packet_id: u32, packet: &impl ProtoEncode) -> Bytes {
    let mut buf = BytesMut::new();
    VarUInt32(packet_id).proto_encode(&mut buf);
    packet.proto_encode(&mut buf);
    buf.freeze()
}

/// Fail with `BufferTooShort` unless `needed` bytes remain.
pub fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Write a Bedrock protocol string (VarUInt32 length + UTF-8).
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    VarUInt32(s.len() as u32).proto_encode(buf);
    buf.put_slice(s.as_bytes());
}

/// Read a Bedrock protocol string (VarUInt32 length + UTF-8).
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    let len = VarUInt32::proto_decode(buf)?.0 as usize;
    ensure_remaining(buf, len)?;
    let data = buf.copy_to_bytes(len);
    String::from_utf8(data.to_vec()).map_err(|_| ProtoError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_roundtrip_unicode() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Table d'enchantement");
        write_string(&mut buf, "日本語");
        let mut bytes = buf.freeze();
        assert_eq!(read_string(&mut bytes).unwrap(), "Table d'enchantement");
        assert_eq!(read_string(&mut bytes).unwrap(), "日本語");
    }

    #[test]
    fn string_buffer_too_short() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Hello");
        let truncated = buf.freeze().slice(..3);
        assert!(matches!(
            read_string(&mut truncated.clone()),
            Err(ProtoError::BufferTooShort { needed: 5, .. })
        ));
    }

    #[test]
    fn encode_packet_prefixes_id() {
        struct Raw(&'static [u8]);
        impl ProtoEncode for Raw {
            fn proto_encode(&self, buf: &mut impl BufMut) {
                buf.put_slice(self.0);
            }
        }
        let bytes = encode_packet(0x2F, &Raw(&[3, 1]));
        assert_eq!(&bytes[..], &[0x2F, 3, 1]);
    }
}
