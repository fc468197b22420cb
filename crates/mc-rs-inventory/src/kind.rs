//! Window type codes and the fixed window-kind table.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::error::InventoryError;

/// Bedrock window type codes, as sent in `ContainerOpen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i8)]
pub enum WindowType {
    /// Player inventory / generic UI. Also used for windows with no
    /// dedicated client screen.
    Inventory = -1,
    Container = 0,
    Workbench = 1,
    Furnace = 2,
    Enchantment = 3,
    BrewingStand = 4,
    Anvil = 5,
    Hopper = 8,
    Beacon = 13,
}

impl WindowType {
    /// Signed protocol code.
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Code as it appears on the wire (two's complement byte).
    pub const fn wire_code(self) -> u8 {
        self as i8 as u8
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Self::Inventory),
            0 => Some(Self::Container),
            1 => Some(Self::Workbench),
            2 => Some(Self::Furnace),
            3 => Some(Self::Enchantment),
            4 => Some(Self::BrewingStand),
            5 => Some(Self::Anvil),
            8 => Some(Self::Hopper),
            13 => Some(Self::Beacon),
            _ => None,
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Capacity, title and protocol code of a window. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    capacity: usize,
    title: Cow<'static, str>,
    network_type: WindowType,
}

impl WindowDescriptor {
    /// Build a custom descriptor.
    ///
    /// Fails with `InvalidConfiguration` for a zero capacity or a blank title.
    pub fn new(
        capacity: usize,
        title: impl Into<Cow<'static, str>>,
        network_type: WindowType,
    ) -> Result<Self, InventoryError> {
        let title = title.into();
        if capacity == 0 {
            return Err(InventoryError::InvalidConfiguration(format!(
                "window '{title}' must have a positive capacity"
            )));
        }
        if title.trim().is_empty() {
            return Err(InventoryError::InvalidConfiguration(
                "window title must not be empty".into(),
            ));
        }
        Ok(Self {
            capacity,
            title,
            network_type,
        })
    }

    const fn fixed(capacity: usize, title: &'static str, network_type: WindowType) -> Self {
        Self {
            capacity,
            title: Cow::Borrowed(title),
            network_type,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn network_type(&self) -> WindowType {
        self.network_type
    }
}

/// Named fake-block window variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WindowKind {
    /// Generic one-slot UI window with no dedicated client screen.
    Ui,
    /// Enchanting table: input slot + lapis slot.
    EnchantTable,
}

static UI: WindowDescriptor = WindowDescriptor::fixed(1, "UI", WindowType::Inventory);
static ENCHANT_TABLE: WindowDescriptor =
    WindowDescriptor::fixed(2, "Enchant", WindowType::Enchantment);

impl WindowKind {
    pub const ALL: [WindowKind; 2] = [WindowKind::Ui, WindowKind::EnchantTable];

    /// Fixed descriptor for this kind.
    pub fn descriptor(self) -> &'static WindowDescriptor {
        match self {
            WindowKind::Ui => &UI,
            WindowKind::EnchantTable => &ENCHANT_TABLE,
        }
    }

    pub fn capacity(self) -> usize {
        self.descriptor().capacity()
    }

    pub fn title(self) -> &'static str {
        self.descriptor().title()
    }

    pub fn network_type(self) -> WindowType {
        self.descriptor().network_type()
    }
}
