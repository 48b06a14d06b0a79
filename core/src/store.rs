// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Persistent key / index store.
//!
//! The only place secret material and the leaf index live across power
//! cycles. All mutation goes through this trait; each write maps to a
//! single atomic field update at the storage layer, and multi-field
//! transitions are sequenced so a crash mid-sequence leaves the device at
//! least as restrictive as before.
//!
//! The index is the central security invariant of the device: once a
//! signature for index `i` has been committed, no future signature may use
//! an index `<= i`. [`NvStore::write_index`] re-checks strict monotonicity
//! at the storage boundary even though the engine never issues a
//! non-increasing write.

use zeroize::Zeroize;

use crate::{
    apdu::state::Mode,
    xmss::params::{NUM_LEAVES, WOTS_N},
};

/// Store errors
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum StoreError {
    /// Index write not strictly increasing
    #[cfg_attr(feature = "thiserror", error("index write not strictly increasing"))]
    NotMonotonic,

    /// Leaf or progress index out of range
    #[cfg_attr(feature = "thiserror", error("field index out of range"))]
    OutOfRange,
}

/// Key material held by the store: secret seed, public seed, and the tree
/// root once key generation has completed.
#[derive(Clone, PartialEq, Debug)]
pub struct KeyMaterial {
    /// Root of all secret key derivation, never leaves the store boundary
    /// except through derived signatures
    pub sk_seed: [u8; WOTS_N],
    /// Non-secret seed randomizing hash-chain inputs
    pub pub_seed: [u8; WOTS_N],
    /// XMSS tree root, zero until key generation completes
    pub root: [u8; WOTS_N],
}

impl KeyMaterial {
    /// Empty (unprovisioned) key material
    pub const fn empty() -> Self {
        Self {
            sk_seed: [0u8; WOTS_N],
            pub_seed: [0u8; WOTS_N],
            root: [0u8; WOTS_N],
        }
    }
}

impl Zeroize for KeyMaterial {
    fn zeroize(&mut self) {
        self.sk_seed.zeroize();
        self.pub_seed.zeroize();
        self.root.zeroize();
    }
}

/// Persistent store interface.
///
/// Mode, leaf index, keygen progress and key material are single-field
/// atomic reads / writes; the leaf cache is addressed one node at a time.
pub trait NvStore {
    /// Fetch the persisted application mode
    fn read_mode(&self) -> Mode;

    /// Persist the application mode
    fn write_mode(&mut self, mode: Mode) -> Result<(), StoreError>;

    /// Fetch the next unused leaf index
    fn read_index(&self) -> u16;

    /// Persist the leaf index.
    ///
    /// Rejected unless strictly greater than the stored value; unreachable
    /// in correct operation but always checked.
    fn write_index(&mut self, index: u16) -> Result<(), StoreError>;

    /// Fetch the key generation progress counter (leaves generated)
    fn read_progress(&self) -> u16;

    /// Persist the key generation progress counter
    fn write_progress(&mut self, progress: u16) -> Result<(), StoreError>;

    /// Fetch a cached leaf node
    fn read_leaf(&self, index: u16) -> Result<[u8; WOTS_N], StoreError>;

    /// Persist a leaf node (key generation only)
    fn write_leaf(&mut self, index: u16, node: &[u8; WOTS_N]) -> Result<(), StoreError>;

    /// Fetch the key material. Callers must zeroize their copy after use.
    fn read_keys(&self) -> KeyMaterial;

    /// Persist the key material
    fn write_keys(&mut self, keys: &KeyMaterial) -> Result<(), StoreError>;

    /// Invalidate the keypair: mode is dropped to `NotInitialized` first,
    /// then index, progress and key material are cleared, so a crash
    /// mid-wipe can only leave the device unprovisioned.
    fn wipe(&mut self) -> Result<(), StoreError>;
}

/// Blanket impl for mutable references
impl<T: NvStore> NvStore for &mut T {
    fn read_mode(&self) -> Mode {
        T::read_mode(self)
    }
    fn write_mode(&mut self, mode: Mode) -> Result<(), StoreError> {
        T::write_mode(self, mode)
    }
    fn read_index(&self) -> u16 {
        T::read_index(self)
    }
    fn write_index(&mut self, index: u16) -> Result<(), StoreError> {
        T::write_index(self, index)
    }
    fn read_progress(&self) -> u16 {
        T::read_progress(self)
    }
    fn write_progress(&mut self, progress: u16) -> Result<(), StoreError> {
        T::write_progress(self, progress)
    }
    fn read_leaf(&self, index: u16) -> Result<[u8; WOTS_N], StoreError> {
        T::read_leaf(self, index)
    }
    fn write_leaf(&mut self, index: u16, node: &[u8; WOTS_N]) -> Result<(), StoreError> {
        T::write_leaf(self, index, node)
    }
    fn read_keys(&self) -> KeyMaterial {
        T::read_keys(self)
    }
    fn write_keys(&mut self, keys: &KeyMaterial) -> Result<(), StoreError> {
        T::write_keys(self, keys)
    }
    fn wipe(&mut self) -> Result<(), StoreError> {
        T::wipe(self)
    }
}

/// RAM-backed store for tests and simulation
#[derive(Clone)]
pub struct MemStore {
    mode: Mode,
    index: u16,
    progress: u16,
    keys: KeyMaterial,
    leaves: [[u8; WOTS_N]; NUM_LEAVES],
}

impl MemStore {
    /// Create a new, unprovisioned store
    pub const fn new() -> Self {
        Self {
            mode: Mode::NotInitialized,
            index: 0,
            progress: 0,
            keys: KeyMaterial::empty(),
            leaves: [[0u8; WOTS_N]; NUM_LEAVES],
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemStore {
    fn drop(&mut self) {
        self.keys.zeroize();
    }
}

impl NvStore for MemStore {
    fn read_mode(&self) -> Mode {
        self.mode
    }

    fn write_mode(&mut self, mode: Mode) -> Result<(), StoreError> {
        self.mode = mode;
        Ok(())
    }

    fn read_index(&self) -> u16 {
        self.index
    }

    fn write_index(&mut self, index: u16) -> Result<(), StoreError> {
        if index <= self.index {
            return Err(StoreError::NotMonotonic);
        }
        self.index = index;
        Ok(())
    }

    fn read_progress(&self) -> u16 {
        self.progress
    }

    fn write_progress(&mut self, progress: u16) -> Result<(), StoreError> {
        if progress as usize > NUM_LEAVES {
            return Err(StoreError::OutOfRange);
        }
        self.progress = progress;
        Ok(())
    }

    fn read_leaf(&self, index: u16) -> Result<[u8; WOTS_N], StoreError> {
        match self.leaves.get(index as usize) {
            Some(n) => Ok(*n),
            None => Err(StoreError::OutOfRange),
        }
    }

    fn write_leaf(&mut self, index: u16, node: &[u8; WOTS_N]) -> Result<(), StoreError> {
        match self.leaves.get_mut(index as usize) {
            Some(n) => {
                *n = *node;
                Ok(())
            }
            None => Err(StoreError::OutOfRange),
        }
    }

    fn read_keys(&self) -> KeyMaterial {
        self.keys.clone()
    }

    fn write_keys(&mut self, keys: &KeyMaterial) -> Result<(), StoreError> {
        self.keys = keys.clone();
        Ok(())
    }

    fn wipe(&mut self) -> Result<(), StoreError> {
        // Restrictive-first ordering
        self.mode = Mode::NotInitialized;
        self.index = 0;
        self.progress = 0;
        self.keys.zeroize();
        self.leaves = [[0u8; WOTS_N]; NUM_LEAVES];
        Ok(())
    }
}
