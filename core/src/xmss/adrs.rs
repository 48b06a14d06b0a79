// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Hash addresses for domain separation.
//!
//! Every keyed-hash invocation is bound to its position in the scheme via a
//! 32-byte address block mixed into the PRF inputs, so no two hash calls in
//! the same keypair ever share an input domain.
//!
//! ## Layout
//!
//! ```text
//! Bytes 0-3:   Layer (always zero, single tree)
//! Bytes 4-11:  Tree (always zero, single tree)
//! Bytes 12-15: Type
//! Bytes 16-19: OTS / L-tree / padding (type specific)
//! Bytes 20-23: Chain / tree height (type specific)
//! Bytes 24-27: Hash position / tree index (type specific)
//! Bytes 28-31: Key-and-mask selector
//! ```

/// Hash address types
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum AdrsType {
    /// WOTS+ chain hashing
    Ots = 0,
    /// WOTS+ public key compression
    Ltree = 1,
    /// Merkle tree node hashing
    HashTree = 2,
}

/// 32-byte hash address block
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Adrs {
    data: [u8; 32],
}

impl Adrs {
    /// Create a new zeroed address of the given type
    pub fn new(t: AdrsType) -> Self {
        let mut a = Adrs { data: [0u8; 32] };
        a.set_type(t);
        a
    }

    /// Set the address type, clearing all type-specific words
    #[inline]
    pub fn set_type(&mut self, t: AdrsType) {
        self.data[12..16].copy_from_slice(&(t as u32).to_be_bytes());
        self.data[16..32].fill(0);
    }

    /// Set the one-time keypair (leaf) index
    #[inline]
    pub fn set_ots(&mut self, ots: u32) {
        self.data[16..20].copy_from_slice(&ots.to_be_bytes());
    }

    /// Set the L-tree (leaf) index
    #[inline]
    pub fn set_ltree(&mut self, ltree: u32) {
        self.data[16..20].copy_from_slice(&ltree.to_be_bytes());
    }

    /// Set the chain index within a one-time keypair
    #[inline]
    pub fn set_chain(&mut self, chain: u32) {
        self.data[20..24].copy_from_slice(&chain.to_be_bytes());
    }

    /// Set the hash position within a chain
    #[inline]
    pub fn set_hash(&mut self, hash: u32) {
        self.data[24..28].copy_from_slice(&hash.to_be_bytes());
    }

    /// Set the tree height (L-tree and Merkle node hashing)
    #[inline]
    pub fn set_tree_height(&mut self, height: u32) {
        self.data[20..24].copy_from_slice(&height.to_be_bytes());
    }

    /// Set the node index within a tree level
    #[inline]
    pub fn set_tree_index(&mut self, index: u32) {
        self.data[24..28].copy_from_slice(&index.to_be_bytes());
    }

    /// Select between hash key (0) and bitmask words (1, 2)
    #[inline]
    pub fn set_key_and_mask(&mut self, v: u32) {
        self.data[28..32].copy_from_slice(&v.to_be_bytes());
    }

    /// Address bytes for use as PRF input
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.data
    }
}
