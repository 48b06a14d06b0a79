// Copyright (c) 2022-2023 The MobileCoin Foundation

use heapless::Vec;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroize;

use ledger_xmss_apdu::sign::CHUNK_LEN;

use super::{Error, Output};
use crate::{
    store::{KeyMaterial, NvStore},
    xmss::{
        hash,
        params::{MSG_BYTES, SIG_BYTES, WOTS_LEN, WOTS_N},
        tree,
        wotsp::{self, WotsSignCtx},
    },
};

/// Chains computed per bounded signing step
const CHAINS_PER_STEP: usize = 16;

/// Signature chunks per delivery
const NUM_CHUNKS: usize = (SIG_BYTES + CHUNK_LEN - 1) / CHUNK_LEN;

/// Signing states
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum SignState {
    /// Waiting for user confirmation
    Pending,
    /// Computing the signature into the assembly buffer
    Stepping,
    /// Signature assembled and index committed, streaming chunks
    Deliver,
}

impl Default for SignState {
    fn default() -> Self {
        Self::Pending
    }
}

/// Signing state machine.
///
/// Assembles the complete signature (WOTS+ part, then authentication path)
/// into an owned buffer across bounded [`Self::update`] calls. The leaf
/// index is committed to the store only once the buffer holds the full
/// signature and immediately before the first byte of it is released, so a
/// crash can never leave a disclosed signature with an uncommitted index.
pub struct SignerCtx {
    state: SignState,

    /// Leaf index latched at init
    index: u16,

    /// Whether completion commits the index and mode (false for raw
    /// diagnostic contexts)
    commit: bool,

    /// Message digest being signed
    digest: [u8; MSG_BYTES],

    /// Key material copy, zeroized on drop
    keys: KeyMaterial,

    /// Per-leaf WOTS+ secret seed, zeroized on drop
    leaf_seed: [u8; WOTS_N],

    /// Incremental WOTS+ context
    wots: WotsSignCtx,

    /// Signature assembly buffer
    sig: Vec<u8, SIG_BYTES>,

    /// Delivery offset
    sent: usize,

    /// Delivery sequence counter
    seq: u8,
}

impl SignerCtx {
    /// Create a signing context for the provided index and raw message.
    ///
    /// Reads nothing from the store; the caller passes the key material and
    /// the index read at init time.
    pub fn new(keys: KeyMaterial, index: u16, msg: &[u8; MSG_BYTES], commit: bool) -> Self {
        let digest = hash::msg_digest(&keys.root, index as u32, msg);
        let leaf_seed = wotsp::leaf_seed(&keys.sk_seed, index as u32);

        Self {
            state: match commit {
                true => SignState::Pending,
                false => SignState::Stepping,
            },
            index,
            commit,
            digest,
            keys,
            leaf_seed,
            wots: WotsSignCtx::new(index as u32),
            sig: Vec::new(),
            sent: 0,
            seq: 0,
        }
    }

    /// Signing state
    pub fn state(&self) -> SignState {
        self.state
    }

    /// Leaf index this context signs with
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Whether completion commits the index
    pub fn commits(&self) -> bool {
        self.commit
    }

    /// Message digest being signed, for display / confirmation
    pub fn digest(&self) -> &[u8; MSG_BYTES] {
        &self.digest
    }

    /// Mark the pending signature as user-approved
    pub fn approve(&mut self) {
        if self.state == SignState::Pending {
            self.state = SignState::Stepping;
        }
    }

    /// Fetch signing progress (n / 100)
    pub fn progress(&self) -> usize {
        let total = WOTS_LEN + 1 + NUM_CHUNKS;

        let index = match self.state {
            SignState::Pending => 0,
            SignState::Stepping => self.wots.chains_done(),
            SignState::Deliver => WOTS_LEN + 1 + self.seq as usize,
        };

        index * 100 / total
    }

    /// Execute one bounded unit of signing work.
    ///
    /// Returns the new state plus an [`Output::SigChunk`] while delivering,
    /// [`Output::None`] otherwise.
    pub fn update<S: NvStore>(&mut self, store: &mut S) -> Result<(SignState, Output), Error> {
        match self.state {
            SignState::Pending => Err(Error::ApprovalPending),
            SignState::Stepping => self.step(store),
            SignState::Deliver => self.next_chunk(),
        }
    }

    /// Compute a bounded batch of chain elements, finishing with the
    /// authentication path and the index commit
    fn step<S: NvStore>(&mut self, store: &mut S) -> Result<(SignState, Output), Error> {
        let mut elem = [0u8; WOTS_N];

        for _ in 0..CHAINS_PER_STEP {
            if self.wots.is_ready() {
                break;
            }

            self.wots
                .step(&self.leaf_seed, &self.keys.pub_seed, &self.digest, &mut elem);

            self.sig
                .extend_from_slice(&elem)
                .map_err(|_| Error::Unknown)?;
        }

        if self.wots.is_ready() {
            // Append the authentication path for this leaf
            let path = tree::auth_path(store, &self.keys.pub_seed, self.index)?;
            for node in &path {
                self.sig.extend_from_slice(node).map_err(|_| Error::Unknown)?;
            }

            debug_assert_eq!(self.sig.len(), SIG_BYTES);

            // Signature fully assembled: advance the persistent index
            // before any byte of it is released
            if self.commit {
                store.write_index(self.index + 1)?;
            }

            self.state = SignState::Deliver;
        }

        Ok((self.state, Output::None))
    }

    /// Hand out the next signature chunk
    fn next_chunk(&mut self) -> Result<(SignState, Output), Error> {
        let remaining = &self.sig[self.sent..];
        if remaining.is_empty() {
            return Err(Error::InvalidState);
        }

        let n = core::cmp::min(CHUNK_LEN, remaining.len());
        let data = Vec::from_slice(&remaining[..n]).map_err(|_| Error::Unknown)?;

        let seq = self.seq;
        self.sent += n;
        self.seq += 1;

        let last = self.sent == self.sig.len();

        Ok((self.state, Output::SigChunk { seq, last, data }))
    }
}

impl Drop for SignerCtx {
    fn drop(&mut self) {
        self.keys.zeroize();
        self.leaf_seed.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::MemStore,
        xmss::{params::NUM_LEAVES, verify},
    };

    fn provisioned_store() -> (MemStore, KeyMaterial) {
        let (sk_seed, pub_seed) = hash::expand_seed(&[0u8; 48]);
        let mut keys = KeyMaterial {
            sk_seed,
            pub_seed,
            root: [0u8; 32],
        };

        let mut store = MemStore::new();
        for i in 0..NUM_LEAVES as u16 {
            let leaf = tree::leaf_node(&keys.sk_seed, &keys.pub_seed, i as u32);
            store.write_leaf(i, &leaf).unwrap();
        }
        keys.root = tree::root(&store, &keys.pub_seed).unwrap();
        store.write_keys(&keys).unwrap();

        (store, keys)
    }

    fn run_to_completion(ctx: &mut SignerCtx, store: &mut MemStore) -> std::vec::Vec<u8> {
        let mut sig = std::vec::Vec::new();

        loop {
            let (state, output) = ctx.update(store).expect("signing step failed");

            if let Output::SigChunk { last, data, .. } = output {
                sig.extend_from_slice(&data);
                if last {
                    break;
                }
            } else {
                assert_eq!(state, ctx.state());
            }
        }

        sig
    }

    #[test]
    fn pending_blocks_stepping() {
        let (mut store, keys) = provisioned_store();
        let mut ctx = SignerCtx::new(keys, 0, &[0u8; 32], true);

        assert_eq!(ctx.update(&mut store), Err(Error::ApprovalPending));
        assert_eq!(ctx.update(&mut store), Err(Error::ApprovalPending));
        assert_eq!(store.read_index(), 0);

        ctx.approve();
        assert_eq!(ctx.state(), SignState::Stepping);
    }

    #[test]
    fn index_commits_before_first_chunk() {
        let (mut store, keys) = provisioned_store();
        let mut ctx = SignerCtx::new(keys, 0, &[0u8; 32], true);
        ctx.approve();

        // Drive computation until the machine reaches delivery; the index
        // must not move while the signature is incomplete
        loop {
            assert_eq!(store.read_index(), 0);
            let (state, _) = ctx.update(&mut store).unwrap();
            if state == SignState::Deliver {
                break;
            }
        }

        // Committed before any chunk is released
        assert_eq!(store.read_index(), 1);
        assert_eq!(ctx.progress(), (WOTS_LEN + 1) * 100 / (WOTS_LEN + 1 + 10));
    }

    #[test]
    fn signature_verifies_to_root() {
        let (mut store, keys) = provisioned_store();
        let msg = [0x5au8; 32];

        let mut ctx = SignerCtx::new(keys.clone(), 3, &msg, true);
        ctx.approve();
        let sig = run_to_completion(&mut ctx, &mut store);

        assert_eq!(sig.len(), SIG_BYTES);

        let digest = hash::msg_digest(&keys.root, 3, &msg);
        let sig: &[u8; SIG_BYTES] = sig.as_slice().try_into().unwrap();
        let recovered = verify::root_from_sig(&keys.pub_seed, 3, &digest, sig);

        assert_eq!(recovered, keys.root);
    }

    #[test]
    fn raw_context_never_commits() {
        let (mut store, keys) = provisioned_store();

        let mut ctx = SignerCtx::new(keys, 7, &[1u8; 32], false);
        assert_eq!(ctx.state(), SignState::Stepping);

        let _ = run_to_completion(&mut ctx, &mut store);
        assert_eq!(store.read_index(), 0);
    }
}
