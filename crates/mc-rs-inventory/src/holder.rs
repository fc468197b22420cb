//! Inventory holders: the thing a window is anchored to.
//!
//! A [`Holder`] is either a real block that exists in the world, or a
//! virtual [`FakeBlockMenu`] that only borrows a coordinate for the
//! `ContainerOpen` packet. Holders refer back to their inventory weakly: the
//! inventory (or the UI component) owns the holder.

use std::fmt;
use std::sync::{Arc, Weak};

use mc_rs_proto::types::BlockPos;
use serde::Serialize;

use crate::inventory::Inventory;

/// Dimension ids.
pub mod dimension {
    pub const OVERWORLD: i32 = 0;
    pub const NETHER: i32 = 1;
    pub const END: i32 = 2;
}

/// A block coordinate in a specific world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub block: BlockPos,
    pub dimension: i32,
}

impl Position {
    /// The world origin, used as anchor for windows without a holder.
    pub const ORIGIN: Self = Self {
        block: BlockPos::ORIGIN,
        dimension: dimension::OVERWORLD,
    };

    pub fn new(x: i32, y: i32, z: i32, dimension: i32) -> Self {
        Self {
            block: BlockPos::new(x, y, z),
            dimension,
        }
    }

    pub fn overworld(x: i32, y: i32, z: i32) -> Self {
        Self::new(x, y, z, dimension::OVERWORLD)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in dimension {}", self.block, self.dimension)
    }
}

/// Capability shared by every holder variant.
pub trait InventoryHolder {
    /// Where the window is anchored.
    fn position(&self) -> Position;

    /// The inventory this holder backs, while it is alive.
    fn inventory(&self) -> Option<Arc<Inventory>>;
}

/// A container backed by a persisted block (chest, enchanting table).
#[derive(Debug, Clone)]
pub struct BlockHolder {
    position: Position,
    inventory: Weak<Inventory>,
}

impl BlockHolder {
    pub fn new(inventory: Weak<Inventory>, position: Position) -> Self {
        Self {
            position,
            inventory,
        }
    }
}

impl InventoryHolder for BlockHolder {
    fn position(&self) -> Position {
        self.position
    }

    fn inventory(&self) -> Option<Arc<Inventory>> {
        self.inventory.upgrade()
    }
}

/// A position that pretends to be a container block.
///
/// Nothing checks that the coordinate is loaded or occupied; the client only
/// needs x/y/z to anchor the window.
#[derive(Debug, Clone)]
pub struct FakeBlockMenu {
    position: Position,
    inventory: Weak<Inventory>,
}

impl FakeBlockMenu {
    pub fn new(inventory: &Arc<Inventory>, position: Position) -> Self {
        Self {
            position,
            inventory: Arc::downgrade(inventory),
        }
    }
}

impl InventoryHolder for FakeBlockMenu {
    fn position(&self) -> Position {
        self.position
    }

    fn inventory(&self) -> Option<Arc<Inventory>> {
        self.inventory.upgrade()
    }
}

/// Real or virtual holder.
#[derive(Debug, Clone)]
pub enum Holder {
    Block(BlockHolder),
    Virtual(FakeBlockMenu),
}

impl Holder {
    pub fn is_virtual(&self) -> bool {
        matches!(self, Holder::Virtual(_))
    }
}

impl InventoryHolder for Holder {
    fn position(&self) -> Position {
        match self {
            Holder::Block(h) => h.position(),
            Holder::Virtual(h) => h.position(),
        }
    }

    fn inventory(&self) -> Option<Arc<Inventory>> {
        match self {
            Holder::Block(h) => h.inventory(),
            Holder::Virtual(h) => h.inventory(),
        }
    }
}

impl From<BlockHolder> for Holder {
    fn from(h: BlockHolder) -> Self {
        Holder::Block(h)
    }
}

impl From<FakeBlockMenu> for Holder {
    fn from(h: FakeBlockMenu) -> Self {
        Holder::Virtual(h)
    }
}
