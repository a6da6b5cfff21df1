//! Callback registry
//!
//! Fixed-capacity table of `(rpc_id, callback)` pairs, searched linearly.
//! Entries are never removed.

use heapless::Vec;

use super::Call;

/// Handler for one RPC id
///
/// Reads its input from the [`Call`], writes a result into the call's
/// buffer and returns the result length.
pub type Callback = fn(&mut Call<'_>) -> usize;

/// Default registry capacity
#[cfg(not(feature = "compact"))]
pub const MAX_CALLBACKS: usize = 32;

/// Default registry capacity
#[cfg(feature = "compact")]
pub const MAX_CALLBACKS: usize = 16;

/// Registration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Every slot is taken
    Full,
    /// The id already has a callback
    Duplicate(u32),
}

impl core::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RegistryError::Full => write!(f, "callback registry full"),
            RegistryError::Duplicate(id) => write!(f, "rpc id {} already registered", id),
        }
    }
}

#[derive(Clone, Copy)]
struct Entry {
    rpc_id: u32,
    callback: Callback,
}

/// Table of registered callbacks
pub struct Registry<const N: usize> {
    entries: Vec<Entry, N>,
}

impl<const N: usize> Default for Registry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Registry<N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a callback for `rpc_id`
    ///
    /// The first registration of an id wins.
    pub fn register(&mut self, rpc_id: u32, callback: Callback) -> Result<(), RegistryError> {
        if self.find(rpc_id).is_some() {
            return Err(RegistryError::Duplicate(rpc_id));
        }
        self.entries
            .push(Entry { rpc_id, callback })
            .map_err(|_| RegistryError::Full)
    }

    /// Look up the callback for `rpc_id`
    pub fn find(&self, rpc_id: u32) -> Option<Callback> {
        self.entries
            .iter()
            .find(|entry| entry.rpc_id == rpc_id)
            .map(|entry| entry.callback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}
