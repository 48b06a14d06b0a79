// Copyright (c) 2022-2023 The MobileCoin Foundation

//! XMSS Merkle tree engine.
//!
//! Leaf nodes (hashed WOTS+ public keys) are persisted in the store's leaf
//! cache during key generation; internal nodes are recomputed from the cache
//! on demand when extracting an authentication path, bounding persistent
//! storage to one node per leaf.

use zeroize::Zeroize;

use super::{
    adrs::{Adrs, AdrsType},
    hash,
    params::{NUM_LEAVES, TREE_HEIGHT, WOTS_LEN, WOTS_N},
    wotsp,
};
use crate::store::{NvStore, StoreError};

/// Compress a WOTS+ public key into a single leaf node.
///
/// Pairwise folds the 67 chain ends, carrying the odd element up unchanged,
/// with the fold level and position bound into each hash address.
pub fn ltree(
    pk: &mut [[u8; WOTS_N]; WOTS_LEN],
    pub_seed: &[u8; WOTS_N],
    leaf_index: u32,
) -> [u8; WOTS_N] {
    let mut adrs = Adrs::new(AdrsType::Ltree);
    adrs.set_ltree(leaf_index);

    let mut l = WOTS_LEN;
    let mut height = 0u32;

    while l > 1 {
        adrs.set_tree_height(height);
        for i in 0..l / 2 {
            adrs.set_tree_index(i as u32);
            pk[i] = hash::hash_h(pub_seed, &mut adrs, &pk[2 * i], &pk[2 * i + 1]);
        }
        if l % 2 == 1 {
            pk[l / 2] = pk[l - 1];
        }
        l = (l + 1) / 2;
        height += 1;
    }

    pk[0]
}

/// Compute the leaf node for a given index: derive the WOTS+ keypair,
/// compute its public key and compress it.
///
/// This is the dominant key generation cost (67 full chains per leaf) and
/// is invoked once per leaf by the incremental keygen driver.
pub fn leaf_node(sk_seed: &[u8; WOTS_N], pub_seed: &[u8; WOTS_N], index: u32) -> [u8; WOTS_N] {
    let mut seed = wotsp::leaf_seed(sk_seed, index);

    let mut pk = [[0u8; WOTS_N]; WOTS_LEN];
    wotsp::gen_pk(&mut pk, &seed, pub_seed, index);
    seed.zeroize();

    ltree(&mut pk, pub_seed, index)
}

/// Recompute the tree node at `height` / `index` from the leaf cache.
pub fn node<S: NvStore>(
    store: &S,
    pub_seed: &[u8; WOTS_N],
    height: u32,
    index: u32,
) -> Result<[u8; WOTS_N], StoreError> {
    if height == 0 {
        return store.read_leaf(index as u16);
    }

    let left = node(store, pub_seed, height - 1, 2 * index)?;
    let right = node(store, pub_seed, height - 1, 2 * index + 1)?;

    let mut adrs = Adrs::new(AdrsType::HashTree);
    adrs.set_tree_height(height);
    adrs.set_tree_index(index);

    Ok(hash::hash_h(pub_seed, &mut adrs, &left, &right))
}

/// Fold the full leaf cache up to the root node (the public key)
pub fn root<S: NvStore>(store: &S, pub_seed: &[u8; WOTS_N]) -> Result<[u8; WOTS_N], StoreError> {
    node(store, pub_seed, TREE_HEIGHT as u32, 0)
}

/// Extract the authentication path for a leaf: the sibling node at every
/// level from leaf to root, recomputed from the leaf cache.
pub fn auth_path<S: NvStore>(
    store: &S,
    pub_seed: &[u8; WOTS_N],
    index: u16,
) -> Result<[[u8; WOTS_N]; TREE_HEIGHT], StoreError> {
    debug_assert!((index as usize) < NUM_LEAVES);

    let mut path = [[0u8; WOTS_N]; TREE_HEIGHT];
    for (z, out) in path.iter_mut().enumerate() {
        let sibling = ((index as u32) >> z) ^ 1;
        *out = node(store, pub_seed, z as u32, sibling)?;
    }

    Ok(path)
}
