//! Base data types used by the container packets.

use std::fmt;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

#[derive(Debug, Error)]
pub enum VarIntError {
    #[error("buffer too short")]
    BufferTooShort,
    #[error("VarInt is too long (more than {max_bytes} bytes)")]
    TooManyBytes { max_bytes: usize },
}

// ---------------------------------------------------------------------------
// LEB128 core
// ---------------------------------------------------------------------------

fn write_leb128(buf: &mut impl BufMut, mut value: u64) {
    while value & !0x7F != 0 {
        buf.put_u8((value & 0x7F | 0x80) as u8);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

fn read_leb128(buf: &mut impl Buf, max_bytes: usize) -> Result<u64, VarIntError> {
    let mut result: u64 = 0;
    for i in 0..max_bytes {
        if !buf.has_remaining() {
            return Err(VarIntError::BufferTooShort);
        }
        let byte = buf.get_u8();
        result |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(VarIntError::TooManyBytes { max_bytes })
}

#[inline]
fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

#[inline]
fn zigzag_decode(v: u64) -> i64 {
    (v >> 1) as i64 ^ -((v & 1) as i64)
}

macro_rules! var_number {
    ($(#[$doc:meta])* $name:ident($inner:ty), $max:expr, signed) => {
        var_number!(@def $(#[$doc])* $name($inner), $max);

        impl ProtoEncode for $name {
            fn proto_encode(&self, buf: &mut impl BufMut) {
                write_leb128(buf, zigzag_encode(self.0 as i64));
            }
        }

        impl ProtoDecode for $name {
            fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
                let raw = read_leb128(buf, Self::MAX_BYTES)?;
                Ok($name(zigzag_decode(raw) as $inner))
            }
        }
    };
    ($(#[$doc:meta])* $name:ident($inner:ty), $max:expr, unsigned) => {
        var_number!(@def $(#[$doc])* $name($inner), $max);

        impl ProtoEncode for $name {
            fn proto_encode(&self, buf: &mut impl BufMut) {
                write_leb128(buf, self.0 as u64);
            }
        }

        impl ProtoDecode for $name {
            fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
                Ok($name(read_leb128(buf, Self::MAX_BYTES)? as $inner))
            }
        }
    };
    (@def $(#[$doc:meta])* $name:ident($inner:ty), $max:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub $inner);

        impl $name {
            /// Maximum bytes this value can occupy on the wire.
            pub const MAX_BYTES: usize = $max;
        }

        impl From<$inner> for $name {
            fn from(v: $inner) -> Self {
                $name(v)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

var_number!(
    /// Signed 32-bit varint (ZigZag + LEB128).
    VarInt(i32), 5, signed
);
var_number!(
    /// Signed 64-bit varint (ZigZag + LEB128).
    VarLong(i64), 10, signed
);
var_number!(
    /// Unsigned 32-bit varint (plain LEB128). Packet ids, lengths, window ids.
    VarUInt32(u32), 5, unsigned
);
var_number!(
    /// Unsigned 64-bit varint (plain LEB128). Entity runtime ids.
    VarUInt64(u64), 10, unsigned
);

// ---------------------------------------------------------------------------
// Vec3 (f32 x, y, z)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl ProtoEncode for Vec3 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.z);
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// BlockPos (i32 x, y, z)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Floor a floating-point position to the block that contains it.
    pub fn from_vec3(v: &Vec3) -> Self {
        Self {
            x: v.x.floor() as i32,
            y: v.y.floor() as i32,
            z: v.z.floor() as i32,
        }
    }
}

/// Wire format: VarInt32(x, zigzag) + VarUInt32(y) + VarInt32(z, zigzag).
impl ProtoEncode for BlockPos {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.x).proto_encode(buf);
        VarUInt32(self.y as u32).proto_encode(buf);
        VarInt(self.z).proto_encode(buf);
    }
}

impl ProtoDecode for BlockPos {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let x = VarInt::proto_decode(buf)?.0;
        let y = VarUInt32::proto_decode(buf)?.0 as i32;
        let z = VarInt::proto_decode(buf)?.0;
        Ok(Self { x, y, z })
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
