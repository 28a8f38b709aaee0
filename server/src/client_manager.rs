//! Connected-player registry for the authoritative server
//!
//! This module owns the server's session state:
//! - The mapping from peer address to that peer's avatar
//! - The identity pool the avatars draw their ids from
//!
//! An address maps to at most one avatar and every live avatar's id is
//! marked used in the pool. Only the dispatch handlers and the simulation
//! step mutate this state, and both run on the single tick thread.

use crate::game::Boxman;
use log::info;
use shared::{Color, EntityState, IdentAlloc, IdentityExhausted, IntentFlags};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Manages all connected clients and their avatars
///
/// The ClientManager is the sole owner of every server-side [`Boxman`].
/// Ids are allocated when a client joins and released when it leaves, so the
/// pool capacity is also the server's player limit.
pub struct ClientManager {
    /// Avatars indexed by the peer that controls them
    clients: HashMap<SocketAddr, Boxman>,
    /// Pool the avatar ids come from
    ids: IdentAlloc,
}

impl ClientManager {
    /// Creates an empty registry able to hold `capacity` clients
    ///
    /// The capacity is clamped to the number of ids a single byte can carry.
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: HashMap::new(),
            ids: IdentAlloc::new(capacity),
        }
    }

    /// Registers a new client and creates its avatar
    ///
    /// Returns the avatar's id. Adding an address that is already registered
    /// returns the existing id without touching the pool. Fails with
    /// [`IdentityExhausted`] when the server is full.
    pub fn add_client(&mut self, addr: SocketAddr, color: Color) -> Result<u8, IdentityExhausted> {
        if let Some(existing) = self.clients.get(&addr) {
            return Ok(existing.id);
        }

        let id = self.ids.fetch()?;
        info!("Client {} connected from {}", id, addr);
        self.clients.insert(addr, Boxman::new(id, color));
        Ok(id)
    }

    /// Removes a client and releases its id
    ///
    /// Returns the removed avatar, or None if the address was not registered.
    pub fn remove_client(&mut self, addr: &SocketAddr) -> Option<Boxman> {
        let boxman = self.clients.remove(addr)?;
        self.ids.free(boxman.id);
        info!("Client {} disconnected from {}", boxman.id, addr);
        Some(boxman)
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.clients.contains_key(addr)
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&Boxman> {
        self.clients.get(addr)
    }

    /// Replaces a client's movement intent
    ///
    /// Returns false if the address is not registered.
    pub fn set_intent(&mut self, addr: &SocketAddr, intent: IntentFlags) -> bool {
        match self.clients.get_mut(addr) {
            Some(boxman) => {
                boxman.set_intent(intent);
                true
            }
            None => false,
        }
    }

    /// Advances every avatar by `dt` seconds
    pub fn update_all(&mut self, dt: f32) {
        for boxman in self.clients.values_mut() {
            boxman.update(dt);
        }
    }

    /// Current state of every avatar, ordered by id
    pub fn snapshot(&self) -> Vec<EntityState> {
        let mut states: Vec<EntityState> = self.clients.values().map(Boxman::state).collect();
        states.sort_by_key(|state| state.id);
        states
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SocketAddr, &Boxman)> {
        self.clients.iter()
    }

    /// Addresses of all connected clients
    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.clients.keys().copied().collect()
    }

    pub fn ids(&self) -> &IdentAlloc {
        &self.ids
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
