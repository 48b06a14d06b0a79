// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Keyed hash / PRF primitive adapter.
//!
//! Wraps the external SHA-256 primitive into the domain-separated
//! constructions used by the chain and tree engines: a 32-byte domain pad
//! selects the function, the key is PRF-derived from the public seed and the
//! hash address, and chain / node inputs are masked with PRF-derived
//! bitmasks before hashing.

use sha2::{Digest as _, Sha256};

use super::{
    adrs::Adrs,
    params::{SEED_BYTES, WOTS_N},
};

const PAD_F: u8 = 0;
const PAD_H: u8 = 1;
const PAD_MSG: u8 = 2;
const PAD_PRF: u8 = 3;

/// 32-byte domain separation pad
fn domain_pad(tag: u8) -> [u8; 32] {
    let mut pad = [0u8; 32];
    pad[31] = tag;
    pad
}

/// 32-byte PRF input block carrying a counter in the trailing word
pub(crate) fn counter_input(ctr: u32) -> [u8; 32] {
    let mut input = [0u8; 32];
    input[28..32].copy_from_slice(&ctr.to_be_bytes());
    input
}

/// Keyed PRF: `SHA-256(pad(3) || key || input)`
pub fn prf(key: &[u8; WOTS_N], input: &[u8; 32]) -> [u8; WOTS_N] {
    let mut h = Sha256::new();
    h.update(domain_pad(PAD_PRF));
    h.update(key);
    h.update(input);
    h.finalize().into()
}

/// Chain hash function F, applied in place.
///
/// The hash key and input bitmask are PRF-derived from the public seed and
/// the address, binding the result to its chain position.
pub fn hash_f(pub_seed: &[u8; WOTS_N], adrs: &mut Adrs, value: &mut [u8; WOTS_N]) {
    adrs.set_key_and_mask(0);
    let key = prf(pub_seed, adrs.as_bytes());

    adrs.set_key_and_mask(1);
    let mask = prf(pub_seed, adrs.as_bytes());

    for (v, m) in value.iter_mut().zip(mask.iter()) {
        *v ^= m;
    }

    let mut h = Sha256::new();
    h.update(domain_pad(PAD_F));
    h.update(key);
    h.update(&value[..]);
    value.copy_from_slice(h.finalize().as_slice());
}

/// Node hash function H over two children, each masked independently.
pub fn hash_h(
    pub_seed: &[u8; WOTS_N],
    adrs: &mut Adrs,
    left: &[u8; WOTS_N],
    right: &[u8; WOTS_N],
) -> [u8; WOTS_N] {
    adrs.set_key_and_mask(0);
    let key = prf(pub_seed, adrs.as_bytes());

    adrs.set_key_and_mask(1);
    let mask_l = prf(pub_seed, adrs.as_bytes());

    adrs.set_key_and_mask(2);
    let mask_r = prf(pub_seed, adrs.as_bytes());

    let mut masked = [0u8; WOTS_N * 2];
    for i in 0..WOTS_N {
        masked[i] = left[i] ^ mask_l[i];
        masked[WOTS_N + i] = right[i] ^ mask_r[i];
    }

    let mut h = Sha256::new();
    h.update(domain_pad(PAD_H));
    h.update(key);
    h.update(masked);
    h.finalize().into()
}

/// Message digest bound to the tree root and the signing leaf index.
///
/// This is the value the WOTS+ chains actually sign.
pub fn msg_digest(root: &[u8; WOTS_N], index: u32, msg: &[u8; 32]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(domain_pad(PAD_MSG));
    h.update(root);
    h.update(counter_input(index));
    h.update(msg);
    h.finalize().into()
}

/// Expand 48 bytes of master seed material into the secret and public seeds.
pub fn expand_seed(material: &[u8; SEED_BYTES]) -> ([u8; WOTS_N], [u8; WOTS_N]) {
    let mut h = Sha256::new();
    h.update(domain_pad(PAD_PRF));
    h.update(material);
    h.update([0u8]);
    let sk_seed = h.finalize().into();

    let mut h = Sha256::new();
    h.update(domain_pad(PAD_PRF));
    h.update(material);
    h.update([1u8]);
    let pub_seed = h.finalize().into();

    (sk_seed, pub_seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmss::adrs::AdrsType;

    #[test]
    fn prf_deterministic() {
        let key = [1u8; 32];
        let input = counter_input(42);

        assert_eq!(prf(&key, &input), prf(&key, &input));
        assert_ne!(prf(&key, &input), prf(&key, &counter_input(43)));
    }

    #[test]
    fn hash_f_depends_on_address() {
        let pub_seed = [2u8; 32];

        let mut a = Adrs::new(AdrsType::Ots);
        a.set_chain(0);
        let mut b = Adrs::new(AdrsType::Ots);
        b.set_chain(1);

        let mut va = [3u8; 32];
        let mut vb = [3u8; 32];
        hash_f(&pub_seed, &mut a, &mut va);
        hash_f(&pub_seed, &mut b, &mut vb);

        assert_ne!(va, vb);
    }

    #[test]
    fn hash_h_orders_children() {
        let pub_seed = [2u8; 32];
        let l = [4u8; 32];
        let r = [5u8; 32];

        let mut a = Adrs::new(AdrsType::HashTree);
        let h1 = hash_h(&pub_seed, &mut a, &l, &r);

        let mut b = Adrs::new(AdrsType::HashTree);
        let h2 = hash_h(&pub_seed, &mut b, &r, &l);

        assert_ne!(h1, h2);
    }

    #[test]
    fn seed_expansion_splits_domains() {
        let material = [0u8; SEED_BYTES];
        let (sk, pb) = expand_seed(&material);

        assert_ne!(sk, pb);
        assert_eq!(expand_seed(&material), (sk, pb));
    }

    #[test]
    fn msg_digest_binds_index() {
        let root = [6u8; 32];
        let msg = [0u8; 32];

        assert_ne!(msg_digest(&root, 0, &msg), msg_digest(&root, 1, &msg));
    }
}
