//! Minecraft Bedrock Edition wire types for container windows.

pub mod codec;
pub mod error;
pub mod item_stack;
pub mod packets;
pub mod types;
