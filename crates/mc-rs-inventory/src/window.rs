//! Window ids and the open/close handshake.
//!
//! Each player session owns a [`WindowIdAllocator`] that maps window targets
//! to the small integer ids used on the wire. [`WindowProtocol`] drives the
//! `Closed -> Opening -> Open -> Closing -> Closed` state machine for one
//! window and is shared by every window implementation.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mc_rs_proto::packets::{ContainerClose, ContainerOpen};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::InventoryError;
use crate::holder::{Holder, Position};
use crate::kind::WindowType;
use crate::player::{Player, WindowPacket};
use crate::snapshot::WindowClaim;

/// Player main inventory.
pub const INVENTORY_WINDOW_ID: u8 = 0;
pub const OFFHAND_WINDOW_ID: u8 = 119;
pub const ARMOR_WINDOW_ID: u8 = 120;
/// Player UI inventory (cursor, crafting grid, fake-block slices).
pub const UI_WINDOW_ID: u8 = 124;

/// First dynamically allocated window id.
pub const FIRST_DYNAMIC_ID: u8 = 1;
/// Exclusive upper bound of dynamic window ids.
pub const LAST_DYNAMIC_ID: u8 = 100;

/// Process-unique identity of a window target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WindowKey(u64);

impl WindowKey {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    id: u8,
    fixed: bool,
}

#[derive(Debug)]
struct AllocatorState {
    cursor: u8,
    claims: HashMap<WindowKey, Claim>,
}

/// Per-session table of window ids.
///
/// Dynamic ids are handed out from a cycling cursor over `range`, so an id
/// that was just released is not immediately given to a different window.
#[derive(Debug)]
pub struct WindowIdAllocator {
    range: Range<u8>,
    state: Mutex<AllocatorState>,
}

impl Default for WindowIdAllocator {
    fn default() -> Self {
        Self {
            range: FIRST_DYNAMIC_ID..LAST_DYNAMIC_ID,
            state: Mutex::new(AllocatorState {
                cursor: FIRST_DYNAMIC_ID - 1,
                claims: HashMap::new(),
            }),
        }
    }
}

impl WindowIdAllocator {
    /// Allocator over `range`. An empty range or one starting at the main
    /// inventory id is rejected.
    pub fn new(range: Range<u8>) -> Result<Self, InventoryError> {
        if range.is_empty() || range.start == INVENTORY_WINDOW_ID {
            return Err(InventoryError::InvalidConfiguration(format!(
                "window id range {}..{} is not usable",
                range.start, range.end
            )));
        }
        Ok(Self {
            state: Mutex::new(AllocatorState {
                cursor: range.start - 1,
                claims: HashMap::new(),
            }),
            range,
        })
    }

    /// Id for `key`, allocating one if it has none yet.
    pub fn allocate(&self, key: WindowKey) -> Result<u8, InventoryError> {
        let mut state = self.state.lock();
        if let Some(claim) = state.claims.get(&key) {
            return Ok(claim.id);
        }

        let span = self.range.end - self.range.start;
        for _ in 0..span {
            state.cursor = if state.cursor + 1 >= self.range.end || state.cursor < self.range.start {
                self.range.start
            } else {
                state.cursor + 1
            };
            let candidate = state.cursor;
            if state.claims.values().all(|c| c.id != candidate) {
                state.claims.insert(
                    key,
                    Claim {
                        id: candidate,
                        fixed: false,
                    },
                );
                return Ok(candidate);
            }
        }

        warn!(
            "No free window id for {key}: all {} ids in {}..{} are open",
            span, self.range.start, self.range.end
        );
        Err(InventoryError::WindowAllocation(format!(
            "all {span} window ids are in use"
        )))
    }

    /// Bind `key` to a fixed id that ordinary releases never free.
    pub fn assign_fixed(&self, key: WindowKey, id: u8) -> Result<(), InventoryError> {
        let mut state = self.state.lock();
        if let Some((other, _)) = state
            .claims
            .iter()
            .find(|(other, claim)| claim.id == id && **other != key)
        {
            warn!("Window id {id} is already bound to {other}");
            return Err(InventoryError::WindowAllocation(format!(
                "window id {id} is already in use"
            )));
        }
        state.claims.insert(key, Claim { id, fixed: true });
        Ok(())
    }

    pub fn get(&self, key: WindowKey) -> Option<u8> {
        self.state.lock().claims.get(&key).map(|c| c.id)
    }

    /// Key currently holding `id`.
    pub fn key_of(&self, id: u8) -> Option<WindowKey> {
        self.state
            .lock()
            .claims
            .iter()
            .find(|(_, claim)| claim.id == id)
            .map(|(key, _)| *key)
    }

    /// Free the dynamic id held by `key`. Fixed ids stay bound.
    pub fn release(&self, key: WindowKey) -> Option<u8> {
        let mut state = self.state.lock();
        match state.claims.get(&key) {
            Some(claim) if !claim.fixed => state.claims.remove(&key).map(|c| c.id),
            _ => None,
        }
    }

    /// Free whatever id `key` holds, fixed or not.
    pub fn force_release(&self, key: WindowKey) -> Option<u8> {
        self.state.lock().claims.remove(&key).map(|c| c.id)
    }

    /// Number of dynamic ids currently claimed.
    pub fn open_count(&self) -> usize {
        self.state.lock().claims.values().filter(|c| !c.fixed).count()
    }

    pub fn try_snapshot(&self) -> Option<Vec<WindowClaim>> {
        let state = self.state.try_lock()?;
        let mut claims: Vec<WindowClaim> = state
            .claims
            .iter()
            .map(|(key, claim)| WindowClaim {
                window_id: claim.id,
                key: *key,
                fixed: claim.fixed,
            })
            .collect();
        claims.sort_by_key(|c| c.window_id);
        Some(claims)
    }
}

/// Handshake state of one window for one player.
///
/// `Opening` and `Closing` only exist while a sequence holds the state lock,
/// so callers normally observe `Closed` or `Open`. A sequence that unwinds
/// part way leaves its transitional state behind; `close` recovers from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WindowState {
    #[default]
    Closed,
    Opening,
    Open {
        window_id: u8,
    },
    Closing {
        window_id: u8,
    },
}

impl WindowState {
    pub fn window_id(self) -> Option<u8> {
        match self {
            WindowState::Open { window_id } | WindowState::Closing { window_id } => {
                Some(window_id)
            }
            WindowState::Closed | WindowState::Opening => None,
        }
    }
}

/// Who asked for a window to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCause {
    /// The client sent `ContainerClose`.
    ClientRequest,
    /// Server code closed the window.
    Server,
    /// The player's connection went away.
    Disconnect,
}

impl CloseCause {
    pub fn server_initiated(self) -> bool {
        self != CloseCause::ClientRequest
    }
}

/// Open/close state machine of a single window, tracked per player.
///
/// The state lock is held for a whole open or close sequence, so two racing
/// calls for the same player run one after the other: a duplicate close finds
/// the window already `Closed`, and a second open hits the already-open guard.
#[derive(Debug)]
pub struct WindowProtocol {
    key: WindowKey,
    states: Mutex<HashMap<u64, WindowState>>,
}

impl WindowProtocol {
    pub fn new(key: WindowKey) -> Self {
        Self {
            key,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn key(&self) -> WindowKey {
        self.key
    }

    pub fn state(&self, runtime_id: u64) -> WindowState {
        self.states
            .lock()
            .get(&runtime_id)
            .copied()
            .unwrap_or_default()
    }

    /// Like [`state`](Self::state), but `None` instead of waiting when an
    /// open or close sequence holds the lock (possibly on this thread).
    pub fn try_state(&self, runtime_id: u64) -> Option<WindowState> {
        let states = self.states.try_lock()?;
        Some(states.get(&runtime_id).copied().unwrap_or_default())
    }

    /// Players this window is currently open for.
    pub fn open_for(&self) -> Vec<u64> {
        self.states.lock().keys().copied().collect()
    }

    /// Run the open sequence for `player`.
    ///
    /// Sends `ContainerOpen` anchored at `anchor` (the origin when `None`),
    /// then calls `after_open` with the allocated id, which must send the
    /// initial contents.
    pub fn open(
        &self,
        player: &dyn Player,
        network_type: WindowType,
        anchor: Option<Position>,
        after_open: impl FnOnce(u8),
    ) -> Result<u8, InventoryError> {
        let runtime_id = player.runtime_id();
        let mut states = self.states.lock();
        let current = states.get(&runtime_id).copied().unwrap_or_default();
        if current != WindowState::Closed {
            debug!(
                "Window {} already open for {}, ignoring open",
                self.key,
                player.name()
            );
            return Err(InventoryError::AlreadyOpen {
                window_id: current.window_id(),
            });
        }

        states.insert(runtime_id, WindowState::Opening);
        let window_id = match player.window_ids().allocate(self.key) {
            Ok(id) => id,
            Err(e) => {
                states.remove(&runtime_id);
                debug!("Could not open window {} for {}: {e}", self.key, player.name());
                return Err(e);
            }
        };

        let anchor = anchor.unwrap_or(Position::ORIGIN);
        player.send_packet(WindowPacket::Open(ContainerOpen::at_block(
            window_id,
            network_type.wire_code(),
            anchor.block,
        )));
        after_open(window_id);
        states.insert(runtime_id, WindowState::Open { window_id });
        debug!(
            "Opened window {} ({network_type}) as id {window_id} for {} at {anchor}",
            self.key,
            player.name()
        );
        Ok(window_id)
    }

    /// Run the close sequence for `player`.
    ///
    /// Returns `false` without sending anything when the window is not open
    /// for the player. Otherwise sends `ContainerClose`, calls
    /// `before_release` (final contents sync) and frees the id.
    pub fn close(
        &self,
        player: &dyn Player,
        cause: CloseCause,
        before_release: impl FnOnce(u8),
    ) -> bool {
        let runtime_id = player.runtime_id();
        let mut states = self.states.lock();
        let window_id = match states.get(&runtime_id).copied().unwrap_or_default() {
            WindowState::Open { window_id } | WindowState::Closing { window_id } => window_id,
            // left behind by an open that unwound after allocating
            WindowState::Opening => match player.window_ids().get(self.key) {
                Some(id) => id,
                None => {
                    states.remove(&runtime_id);
                    return false;
                }
            },
            WindowState::Closed => {
                debug!(
                    "Window {} already closed for {} ({cause:?})",
                    self.key,
                    player.name()
                );
                return false;
            }
        };

        states.insert(runtime_id, WindowState::Closing { window_id });
        player.send_packet(WindowPacket::Close(ContainerClose {
            window_id,
            server_initiated: cause.server_initiated(),
        }));
        before_release(window_id);
        player.window_ids().release(self.key);
        states.remove(&runtime_id);
        debug!(
            "Closed window {} (id {window_id}) for {} ({cause:?})",
            self.key,
            player.name()
        );
        true
    }
}

/// A window that can be shown to players.
pub trait Window: Send + Sync {
    /// Key the session's allocator tracks this window under.
    fn key(&self) -> WindowKey;

    fn title(&self) -> &str;

    fn network_type(&self) -> WindowType;

    /// Anchor of the window, if it has one.
    fn holder(&self) -> Option<&Holder>;

    /// Show the window to `player`; returns the allocated window id.
    fn open(&self, player: &Arc<dyn Player>) -> Result<u8, InventoryError>;

    /// Close the window for `player`. Closing a closed window does nothing.
    fn close(&self, player: &Arc<dyn Player>, cause: CloseCause);

    fn state(&self, player: &dyn Player) -> WindowState;

    /// Non-blocking [`state`](Self::state); `None` while the window is busy.
    fn try_state(&self, player: &dyn Player) -> Option<WindowState>;

    /// Send the window's full contents under its current id.
    fn send_contents(&self, player: &dyn Player);
}
