// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signature verification.
//!
//! Not used on the signing path; provided for hosts and for conformance
//! testing. A signature is valid for a message and leaf index iff the root
//! recovered by completing the WOTS+ chains and climbing the authentication
//! path equals the known public root.

use super::{
    adrs::{Adrs, AdrsType},
    hash,
    params::{MSG_BYTES, SIG_BYTES, TREE_HEIGHT, WOTS_LEN, WOTS_N, WOTS_SIG_BYTES, WOTS_W},
    tree, wotsp,
};

/// Recover the leaf node implied by a WOTS+ signature over `msg`
pub fn leaf_from_sig(
    pub_seed: &[u8; WOTS_N],
    index: u32,
    msg: &[u8; MSG_BYTES],
    wots_sig: &[u8; WOTS_SIG_BYTES],
) -> [u8; WOTS_N] {
    let digits = wotsp::digits(msg);

    let mut adrs = Adrs::new(AdrsType::Ots);
    adrs.set_ots(index);

    let mut pk = [[0u8; WOTS_N]; WOTS_LEN];
    for (i, out) in pk.iter_mut().enumerate() {
        out.copy_from_slice(&wots_sig[i * WOTS_N..][..WOTS_N]);

        // Complete the chain from the signed digit position to its end
        let d = digits[i] as u32;
        adrs.set_chain(i as u32);
        wotsp::gen_chain(out, pub_seed, &mut adrs, d, WOTS_W - 1 - d);
    }

    tree::ltree(&mut pk, pub_seed, index)
}

/// Recover the tree root implied by a full signature over `msg`.
///
/// The signature is valid iff the result equals the public root.
pub fn root_from_sig(
    pub_seed: &[u8; WOTS_N],
    index: u32,
    msg: &[u8; MSG_BYTES],
    sig: &[u8; SIG_BYTES],
) -> [u8; WOTS_N] {
    let mut wots_sig = [0u8; WOTS_SIG_BYTES];
    wots_sig.copy_from_slice(&sig[..WOTS_SIG_BYTES]);

    let mut node = leaf_from_sig(pub_seed, index, msg, &wots_sig);

    // Climb the authentication path from leaf to root
    for z in 0..TREE_HEIGHT {
        let mut sibling = [0u8; WOTS_N];
        sibling.copy_from_slice(&sig[WOTS_SIG_BYTES + z * WOTS_N..][..WOTS_N]);

        let idx_z = index >> z;
        let mut adrs = Adrs::new(AdrsType::HashTree);
        adrs.set_tree_height(z as u32 + 1);
        adrs.set_tree_index(idx_z >> 1);

        node = match idx_z & 1 {
            0 => hash::hash_h(pub_seed, &mut adrs, &node, &sibling),
            _ => hash::hash_h(pub_seed, &mut adrs, &sibling, &node),
        };
    }

    node
}
