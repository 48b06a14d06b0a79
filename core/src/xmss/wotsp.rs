// Copyright (c) 2022-2023 The MobileCoin Foundation

//! WOTS+ one-time signature engine.
//!
//! One-time public keys and signatures are built from 67 hash chains: 64
//! chains carry the base-16 digits of the 32-byte message digest, 3 chains
//! carry a checksum of `sum(15 - digit)` over the message digits. Shortening
//! any message chain forces a longer checksum chain, so no chain can be
//! extended by an attacker without breaking another.
//!
//! Signing is incremental: [`WotsSignCtx::step`] emits exactly one chain
//! element per call (O(chain length) hash operations) so the caller can
//! interleave signing with other bounded-time work.

use super::{
    adrs::{Adrs, AdrsType},
    hash,
    params::{MSG_BYTES, WOTS_LEN, WOTS_LEN1, WOTS_N, WOTS_W},
};

/// Derive the per-leaf WOTS+ secret seed from the master secret seed
pub fn leaf_seed(sk_seed: &[u8; WOTS_N], index: u32) -> [u8; WOTS_N] {
    hash::prf(sk_seed, &hash::counter_input(index))
}

/// Derive the secret start value for one chain of a leaf keypair
fn chain_seed(seed: &[u8; WOTS_N], chain: u32) -> [u8; WOTS_N] {
    hash::prf(seed, &hash::counter_input(chain))
}

/// Apply the chain function `steps` times in place, starting at position
/// `start`.
///
/// Resumable: `gen_chain(x, i, s1 + s2)` equals `gen_chain(x, i, s1)`
/// followed by `gen_chain(.., i + s1, s2)`. The chain position never
/// exceeds `W - 1`.
pub fn gen_chain(
    value: &mut [u8; WOTS_N],
    pub_seed: &[u8; WOTS_N],
    adrs: &mut Adrs,
    start: u32,
    steps: u32,
) {
    let end = core::cmp::min(start.saturating_add(steps), WOTS_W);
    for i in start..end {
        adrs.set_hash(i);
        hash::hash_f(pub_seed, adrs, value);
    }
}

/// Generate a WOTS+ public key: every chain run to its maximum length.
///
/// Used only during key generation; signing reveals intermediate chain
/// values instead.
pub fn gen_pk(
    pk: &mut [[u8; WOTS_N]; WOTS_LEN],
    seed: &[u8; WOTS_N],
    pub_seed: &[u8; WOTS_N],
    index: u32,
) {
    let mut adrs = Adrs::new(AdrsType::Ots);
    adrs.set_ots(index);

    for (i, out) in pk.iter_mut().enumerate() {
        *out = chain_seed(seed, i as u32);
        adrs.set_chain(i as u32);
        gen_chain(out, pub_seed, &mut adrs, 0, WOTS_W - 1);
    }
}

/// All 67 base-16 signature digits for a message digest: 64 message digits
/// (high nibble first) followed by 3 checksum digits.
pub(crate) fn digits(msg: &[u8; MSG_BYTES]) -> [u8; WOTS_LEN] {
    let mut out = [0u8; WOTS_LEN];

    for (i, b) in msg.iter().enumerate() {
        out[2 * i] = b >> 4;
        out[2 * i + 1] = b & 0x0f;
    }

    let mut csum = 0u32;
    for d in &out[..WOTS_LEN1] {
        csum += 0x0f - *d as u32;
    }

    out[WOTS_LEN1] = ((csum >> 8) & 0x0f) as u8;
    out[WOTS_LEN1 + 1] = ((csum >> 4) & 0x0f) as u8;
    out[WOTS_LEN1 + 2] = (csum & 0x0f) as u8;

    out
}

/// Incremental WOTS+ signing context.
///
/// Tracks the current chain, the running checksum and the partially consumed
/// message digest. Transient scratch state only, never persisted.
#[derive(Clone, Debug)]
pub struct WotsSignCtx {
    index: u32,
    chain: u32,
    csum: u32,
    bits: u8,
    total: u32,
    msg_in: usize,
}

impl WotsSignCtx {
    /// Create a signing context for the keypair at `index`
    pub fn new(index: u32) -> Self {
        Self {
            index,
            chain: 0,
            csum: 0,
            bits: 0,
            total: 0,
            msg_in: 0,
        }
    }

    /// Produce the next signature element into `out`.
    ///
    /// Consumes one base-16 digit of the message digest, or of the latched
    /// checksum once the digest is exhausted, and runs the corresponding
    /// chain to the digit value. No-op once [`Self::is_ready`].
    pub fn step(
        &mut self,
        seed: &[u8; WOTS_N],
        pub_seed: &[u8; WOTS_N],
        msg: &[u8; MSG_BYTES],
        out: &mut [u8; WOTS_N],
    ) {
        if self.is_ready() {
            return;
        }

        *out = chain_seed(seed, self.chain);

        if self.bits == 0 {
            self.bits += 8;
            if (self.chain as usize) < WOTS_LEN1 {
                self.total = msg[self.msg_in] as u32;
                self.msg_in += 1;
            } else {
                // Message digits exhausted: latch the checksum counter into
                // a 12-bit window covering the three checksum digits
                self.total = self.csum;
                self.bits += 4;
            }
        }

        self.bits -= 4;
        let digit = (self.total >> self.bits) & 0x0f;

        let mut adrs = Adrs::new(AdrsType::Ots);
        adrs.set_ots(self.index);
        adrs.set_chain(self.chain);
        gen_chain(out, pub_seed, &mut adrs, 0, digit);

        self.csum += 0x0f - digit;
        self.chain += 1;
    }

    /// All chain elements produced
    pub fn is_ready(&self) -> bool {
        self.chain as usize >= WOTS_LEN
    }

    /// Number of chain elements produced so far
    pub fn chains_done(&self) -> usize {
        self.chain as usize
    }
}

/// One-shot WOTS+ signature, defined as the loop over [`WotsSignCtx::step`].
///
/// Step-driven and one-shot signing are byte-identical by construction.
pub fn sign(
    sig: &mut [[u8; WOTS_N]; WOTS_LEN],
    seed: &[u8; WOTS_N],
    pub_seed: &[u8; WOTS_N],
    index: u32,
    msg: &[u8; MSG_BYTES],
) {
    let mut ctx = WotsSignCtx::new(index);
    for out in sig.iter_mut() {
        ctx.step(seed, pub_seed, msg, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adrs_for(index: u32, chain: u32) -> Adrs {
        let mut a = Adrs::new(AdrsType::Ots);
        a.set_ots(index);
        a.set_chain(chain);
        a
    }

    #[test]
    fn chain_zero_steps_identity() {
        let pub_seed = [1u8; 32];
        let mut v = [9u8; 32];
        let x = v;

        gen_chain(&mut v, &pub_seed, &mut adrs_for(0, 0), 0, 0);
        assert_eq!(v, x);
    }

    #[test]
    fn chain_resumable_from_any_position() {
        let pub_seed = [1u8; 32];

        // chain(x, 0, a + b) == chain(chain(x, 0, a), a, b)
        for (a, b) in [(1u32, 2u32), (5, 10), (0, 15), (7, 8)] {
            let mut whole = [3u8; 32];
            gen_chain(&mut whole, &pub_seed, &mut adrs_for(0, 0), 0, a + b);

            let mut split = [3u8; 32];
            gen_chain(&mut split, &pub_seed, &mut adrs_for(0, 0), 0, a);
            gen_chain(&mut split, &pub_seed, &mut adrs_for(0, 0), a, b);

            assert_eq!(whole, split, "split at {a}+{b}");
        }
    }

    #[test]
    fn chain_position_capped() {
        let pub_seed = [1u8; 32];

        let mut full = [3u8; 32];
        gen_chain(&mut full, &pub_seed, &mut adrs_for(0, 0), 0, WOTS_W - 1);

        // Requesting more steps than remain in the chain stops at the cap
        let mut over = [3u8; 32];
        gen_chain(&mut over, &pub_seed, &mut adrs_for(0, 0), 0, u32::MAX);

        assert_eq!(full, over);
    }

    #[test]
    fn digits_all_zero_message() {
        let msg = [0u8; MSG_BYTES];
        let d = digits(&msg);

        assert!(d[..WOTS_LEN1].iter().all(|v| *v == 0));
        // checksum = 64 * 15 = 960 = 0x3c0
        assert_eq!(&d[WOTS_LEN1..], &[0x3, 0xc, 0x0]);
    }

    #[test]
    fn digits_all_max_message() {
        let msg = [0xffu8; MSG_BYTES];
        let d = digits(&msg);

        assert!(d[..WOTS_LEN1].iter().all(|v| *v == 0x0f));
        assert_eq!(&d[WOTS_LEN1..], &[0, 0, 0]);
    }

    #[test]
    fn step_matches_digits() {
        let seed = [7u8; 32];
        let pub_seed = [8u8; 32];
        let msg = [0xa5u8; MSG_BYTES];

        let d = digits(&msg);

        // Each step element must equal the chain run to the digit value
        let mut ctx = WotsSignCtx::new(3);
        for (i, digit) in d.iter().enumerate() {
            let mut elem = [0u8; 32];
            ctx.step(&seed, &pub_seed, &msg, &mut elem);

            let mut expected = chain_seed(&seed, i as u32);
            gen_chain(
                &mut expected,
                &pub_seed,
                &mut adrs_for(3, i as u32),
                0,
                *digit as u32,
            );

            assert_eq!(elem, expected, "chain {i}");
        }
        assert!(ctx.is_ready());
    }

    #[test]
    fn one_shot_equals_stepped() {
        let seed = [1u8; 32];
        let pub_seed = [2u8; 32];
        let msg = [0x5au8; MSG_BYTES];

        let mut one_shot = [[0u8; WOTS_N]; WOTS_LEN];
        sign(&mut one_shot, &seed, &pub_seed, 5, &msg);

        let mut ctx = WotsSignCtx::new(5);
        let mut stepped = [[0u8; WOTS_N]; WOTS_LEN];
        let mut i = 0;
        while !ctx.is_ready() {
            ctx.step(&seed, &pub_seed, &msg, &mut stepped[i]);
            i += 1;
        }

        assert_eq!(i, WOTS_LEN);
        assert_eq!(one_shot, stepped);
    }

    #[test]
    fn pk_deterministic_per_index() {
        let seed = [1u8; 32];
        let pub_seed = [2u8; 32];

        let mut pk0 = [[0u8; WOTS_N]; WOTS_LEN];
        gen_pk(&mut pk0, &seed, &pub_seed, 0);

        let mut pk0b = [[0u8; WOTS_N]; WOTS_LEN];
        gen_pk(&mut pk0b, &seed, &pub_seed, 0);
        assert_eq!(pk0, pk0b);

        let mut pk1 = [[0u8; WOTS_N]; WOTS_LEN];
        gen_pk(&mut pk1, &seed, &pub_seed, 1);
        assert_ne!(pk0, pk1);
    }

    #[test]
    fn signature_element_completes_to_pk() {
        let seed = [6u8; 32];
        let pub_seed = [2u8; 32];
        let msg = [0x30u8; MSG_BYTES];

        let mut pk = [[0u8; WOTS_N]; WOTS_LEN];
        gen_pk(&mut pk, &seed, &pub_seed, 0);

        let mut sig = [[0u8; WOTS_N]; WOTS_LEN];
        sign(&mut sig, &seed, &pub_seed, 0, &msg);

        let d = digits(&msg);
        for i in 0..WOTS_LEN {
            let mut elem = sig[i];
            gen_chain(
                &mut elem,
                &pub_seed,
                &mut adrs_for(0, i as u32),
                d[i] as u32,
                WOTS_W - 1 - d[i] as u32,
            );
            assert_eq!(elem, pk[i], "chain {i}");
        }
    }
}
