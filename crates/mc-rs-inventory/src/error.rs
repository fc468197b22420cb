//! Errors raised by the window layer.
//!
//! Items that do not fit are not an error: `add_item` hands them back.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Bad capacity, offset or window descriptor at construction time.
    #[error("invalid inventory configuration: {0}")]
    InvalidConfiguration(String),

    /// The player's session could not grant a window id.
    #[error("window id allocation failed: {0}")]
    WindowAllocation(String),

    /// `open` was called on a window that is not closed for this player.
    #[error("window is already open (window id {window_id:?})")]
    AlreadyOpen { window_id: Option<u8> },

    #[error("slot {slot} out of range for inventory of size {size}")]
    SlotOutOfRange { slot: usize, size: usize },
}
