// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] drives the XMSS signing core against a persistent store.
//!
//! It handles [Event] inputs and returns [Output] responses to the caller,
//! see [apdu][crate::apdu] for the APDU protocol / encoding specifications
//! and [dispatcher][crate::dispatcher] for the framed request loop.
//!
//! Long-running operations (key generation, signing) perform one bounded
//! unit of work per event and rely on the caller re-issuing the relevant
//! event until completion is reported; persistent state is only mutated at
//! phase completion points so abandoning an operation between steps is
//! always safe.

use rand_core::{CryptoRngCore, OsRng};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroize;

use ledger_xmss_apdu::{app_info::AppFlags, state::Mode};

use crate::{
    store::{KeyMaterial, NvStore},
    xmss::{hash, params::NUM_LEAVES, tree},
    APP_VERSION_MAJOR, APP_VERSION_MINOR, APP_VERSION_PATCH,
};

mod event;
pub use event::Event;

mod output;
pub use output::Output;

mod error;
pub use error::Error;

mod sign;
pub use sign::{SignState, SignerCtx};

/// Key generation phases
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum KeygenPhase {
    /// Generating leaf nodes into the leaf cache
    Leaves,
    /// Folding the leaf cache up to the root
    Fold,
}

impl Default for KeygenPhase {
    fn default() -> Self {
        Self::Leaves
    }
}

/// Engine internal state enumeration
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum State {
    /// No keypair provisioned
    Init,

    /// Key generation in progress
    Keygen(KeygenPhase),

    /// Keypair provisioned, ready to sign
    Ready,

    /// Signature in flight
    Sign(SignState),
}

impl State {
    /// Map engine states to the persisted / wire [Mode]
    pub fn mode(&self) -> Mode {
        match self {
            State::Init => Mode::NotInitialized,
            State::Keygen(_) => Mode::KeygenRunning,
            State::Ready => Mode::Ready,
            State::Sign(_) => Mode::Signing,
        }
    }
}

/// [`Engine`] provides hardware-independent support for XMSS wallet
/// operations over a persistent [`NvStore`].
pub struct Engine<S: NvStore, RNG: CryptoRngCore = OsRng> {
    store: S,
    rng: RNG,

    state: State,

    signer: Option<SignerCtx>,
}

impl<S: NvStore> Engine<S> {
    /// Create a new engine instance over the provided store, using the
    /// default [OsRng]
    pub fn new(store: S) -> Self {
        Self::new_with_rng(store, OsRng {})
    }
}

impl<S: NvStore, RNG: CryptoRngCore> Engine<S, RNG> {
    /// Create a new engine instance with the provided store and rng.
    ///
    /// The initial state is recovered from the persisted mode. A persisted
    /// `Signing` mode means power was lost between index commit and
    /// signature delivery; the signature is unrecoverable (and the old
    /// index must not be re-signed) so the mode is normalized to `Ready`.
    pub fn new_with_rng(mut store: S, rng: RNG) -> Self {
        let state = match store.read_mode() {
            Mode::NotInitialized => State::Init,
            Mode::KeygenRunning => match (store.read_progress() as usize) < NUM_LEAVES {
                true => State::Keygen(KeygenPhase::Leaves),
                false => State::Keygen(KeygenPhase::Fold),
            },
            Mode::Ready => State::Ready,
            Mode::Signing => match store.write_mode(Mode::Ready) {
                Ok(_) => State::Ready,
                // Store unwritable, stay restrictive
                Err(_) => State::Init,
            },
        };

        Self {
            store,
            rng,
            state,
            signer: None,
        }
    }

    /// Handle an incoming event
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::debug!("event (state {:?}): {:02x?}", self.state, evt);

        match (self.state, evt) {
            // Empty event, do nothing
            (_, Event::None) => (),

            // Fetch version and feature flags
            (_, Event::GetVersion) => {
                let mut flags = AppFlags::empty();
                flags.set(AppFlags::KEY_READY, self.state == State::Ready);
                #[cfg(feature = "diag")]
                flags.insert(AppFlags::DIAGNOSTICS);

                return Ok(Output::Version {
                    flags,
                    major: APP_VERSION_MAJOR,
                    minor: APP_VERSION_MINOR,
                    patch: APP_VERSION_PATCH,
                });
            }

            // Fetch mode and index / progress
            (_, Event::GetState) => (),

            // Fetch public key, only once key generation has completed
            (State::Ready, Event::GetPublicKey) => {
                let mut keys = self.store.read_keys();
                let out = Output::PublicKey {
                    root: keys.root,
                    pub_seed: keys.pub_seed,
                };
                keys.zeroize();

                return Ok(out);
            }
            (_, Event::GetPublicKey) => return Err(Error::InvalidState),

            // Start key generation, destroying any prior keypair or
            // partial generation
            (State::Init | State::Ready | State::Keygen(_), Event::KeygenInit { seed }) => {
                return self.keygen_init(seed)
            }

            // One bounded unit of key generation
            (State::Keygen(phase), Event::KeygenStep) => return self.keygen_step(phase),

            // Start signing at the current leaf index
            (State::Ready, Event::SignInit { digest }) => return self.sign_init(digest),

            // One bounded signing step / signature chunk fetch
            (State::Sign(_), Event::SignNext) => return self.sign_next(),

            // Diagnostics, any state
            #[cfg(feature = "diag")]
            (_, Event::ReadLeaf { index }) => {
                let node = self.store.read_leaf(*index)?;
                return Ok(Output::Leaf { node });
            }
            #[cfg(feature = "diag")]
            (_, Event::WriteLeaf { index, node }) => {
                self.store.write_leaf(*index, node)?;
            }
            #[cfg(feature = "diag")]
            (_, Event::Digest { index, msg }) => {
                let mut keys = self.store.read_keys();
                let digest = hash::msg_digest(&keys.root, *index as u32, msg);
                keys.zeroize();

                return Ok(Output::Digest { digest });
            }
            #[cfg(feature = "diag")]
            (_, Event::SignInitRaw { index, digest }) => {
                if *index as usize >= NUM_LEAVES {
                    return Err(Error::Exhausted);
                }

                let keys = self.store.read_keys();
                self.signer = Some(SignerCtx::new(keys, *index, digest, false));
                self.state = State::Sign(SignState::Stepping);
            }
            #[cfg(feature = "diag")]
            (State::Sign(_), Event::SignStepRaw) => return self.sign_next(),

            // Handle unexpected events
            _e => {
                #[cfg(feature = "log")]
                log::error!("unexpected event in state {:?}: {:02x?}", self.state, _e);

                return Err(Error::UnexpectedEvent);
            }
        }

        // Default to returning updated state
        Ok(self.state_output())
    }

    /// Fetch current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Release the underlying store (power-cycle simulation, platform wipe)
    pub fn into_store(self) -> S {
        self.store
    }

    /// Fetch progress for non-interactive states (keygen, signing)
    pub fn progress(&self) -> Option<usize> {
        match self.state {
            State::Keygen(_) => Some(self.store.read_progress() as usize * 100 / NUM_LEAVES),
            State::Sign(_) => self.signer.as_ref().map(|s| s.progress()),
            _ => None,
        }
    }

    /// Fetch the digest awaiting confirmation, for the display collaborator
    pub fn pending_digest(&self) -> Option<&[u8; 32]> {
        match self.state {
            State::Sign(SignState::Pending) => self.signer.as_ref().map(|s| s.digest()),
            _ => None,
        }
    }

    /// Approve the pending signature (advances to `SignState::Stepping`).
    ///
    /// Called by the display collaborator after user confirmation; signing
    /// never proceeds past `Pending` without it.
    pub fn approve(&mut self) {
        if self.state != State::Sign(SignState::Pending) {
            return;
        }

        if self.store.write_mode(Mode::Signing).is_err() {
            self.abort_sign();
            return;
        }

        if let Some(s) = self.signer.as_mut() {
            s.approve();
            self.state = State::Sign(SignState::Stepping);
        }
    }

    /// Deny a pending or in-progress signature, discarding the context
    /// without mutating the leaf index
    pub fn deny(&mut self) {
        if let State::Sign(_) = self.state {
            self.abort_sign();
        }
    }

    /// Build a state output from the current mode and counter
    fn state_output(&self) -> Output {
        let value = match self.state {
            State::Keygen(_) => self.store.read_progress(),
            _ => self.store.read_index(),
        };

        Output::State {
            mode: self.state.mode(),
            value,
        }
    }

    /// Wipe the store and derive fresh seeds, entering `KeygenRunning`.
    ///
    /// Sequenced restrictive-first: the wipe lands `NotInitialized` before
    /// seeds are written, and the mode is only raised once they are.
    fn keygen_init(&mut self, seed: &Option<[u8; 48]>) -> Result<Output, Error> {
        self.signer = None;
        self.store.wipe()?;

        let mut material = match seed {
            Some(s) => *s,
            None => {
                let mut m = [0u8; 48];
                self.rng.fill_bytes(&mut m);
                m
            }
        };

        let (sk_seed, pub_seed) = hash::expand_seed(&material);
        material.zeroize();

        let mut keys = KeyMaterial {
            sk_seed,
            pub_seed,
            root: [0u8; 32],
        };
        self.store.write_keys(&keys)?;
        keys.zeroize();

        self.store.write_mode(Mode::KeygenRunning)?;
        self.state = State::Keygen(KeygenPhase::Leaves);

        Ok(self.state_output())
    }

    /// One bounded unit of key generation: a single leaf, or the final fold
    fn keygen_step(&mut self, phase: KeygenPhase) -> Result<Output, Error> {
        let mut keys = self.store.read_keys();

        let r = match phase {
            KeygenPhase::Leaves => self.keygen_leaf(&keys),
            KeygenPhase::Fold => self.keygen_fold(&mut keys),
        };

        keys.zeroize();
        r?;

        Ok(self.state_output())
    }

    /// Derive and persist the next leaf node
    fn keygen_leaf(&mut self, keys: &KeyMaterial) -> Result<(), Error> {
        let p = self.store.read_progress();

        let leaf = tree::leaf_node(&keys.sk_seed, &keys.pub_seed, p as u32);
        self.store.write_leaf(p, &leaf)?;
        self.store.write_progress(p + 1)?;

        if (p + 1) as usize == NUM_LEAVES {
            self.state = State::Keygen(KeygenPhase::Fold);
        }

        Ok(())
    }

    /// Fold the leaf cache to the root and complete key generation
    fn keygen_fold(&mut self, keys: &mut KeyMaterial) -> Result<(), Error> {
        keys.root = tree::root(&self.store, &keys.pub_seed)?;
        self.store.write_keys(keys)?;

        self.store.write_mode(Mode::Ready)?;
        self.state = State::Ready;

        #[cfg(feature = "log")]
        log::info!("key generation complete");

        Ok(())
    }

    /// Latch the current index and set up a signing context pending user
    /// approval.
    ///
    /// The index is read here, not at commit time, so a concurrent
    /// re-initialization cannot race the commit.
    fn sign_init(&mut self, digest: &[u8; 32]) -> Result<Output, Error> {
        let index = self.store.read_index();
        if index as usize >= NUM_LEAVES {
            return Err(Error::Exhausted);
        }

        let keys = self.store.read_keys();
        self.signer = Some(SignerCtx::new(keys, index, digest, true));
        self.state = State::Sign(SignState::Pending);

        Ok(self.state_output())
    }

    /// Drive the signing context by one bounded step
    fn sign_next(&mut self) -> Result<Output, Error> {
        let signer = match self.signer.as_mut() {
            Some(s) => s,
            None => return Err(Error::InvalidState),
        };
        let commits = signer.commits();

        let r = signer.update(&mut self.store);

        match r {
            Ok((state, output)) => {
                self.state = State::Sign(state);

                // Final chunk released: the operation is complete
                if let Output::SigChunk { last: true, .. } = &output {
                    self.signer = None;
                    self.state = State::Ready;
                    if commits {
                        self.store.write_mode(Mode::Ready)?;
                    }
                }

                match output {
                    Output::None => Ok(self.state_output()),
                    _ => Ok(output),
                }
            }
            // Awaiting confirmation, context stays intact
            Err(Error::ApprovalPending) => Err(Error::ApprovalPending),
            Err(e) => {
                #[cfg(feature = "log")]
                log::warn!("sign step failed: {:?}", e);

                self.abort_sign();
                Err(e)
            }
        }
    }

    /// Discard the signing context without touching the leaf index
    fn abort_sign(&mut self) {
        let commits = self.signer.as_ref().map(|s| s.commits()).unwrap_or(false);
        self.signer = None;

        if commits {
            // Mode write failure leaves a persisted `Signing` mode which
            // normalizes to `Ready` on next boot
            let _ = self.store.write_mode(Mode::Ready);
        }

        self.state = State::Ready;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::MemStore;

    const SEED: [u8; 48] = [0u8; 48];

    pub(crate) fn keygen(engine: &mut Engine<MemStore>) {
        engine
            .update(&Event::KeygenInit { seed: Some(SEED) })
            .expect("keygen init failed");

        loop {
            let r = engine.update(&Event::KeygenStep).expect("keygen step failed");
            if r.state().map(|(m, _)| m) == Some(Mode::Ready) {
                break;
            }
        }
    }

    #[test]
    fn keygen_runs_to_ready() {
        let mut engine = Engine::new(MemStore::new());
        assert_eq!(engine.state(), State::Init);

        keygen(&mut engine);

        assert_eq!(engine.state(), State::Ready);

        // Root is populated and retrievable
        let r = engine.update(&Event::GetPublicKey).unwrap();
        match r {
            Output::PublicKey { root, .. } => assert_ne!(root, [0u8; 32]),
            _ => panic!("unexpected output {r:?}"),
        }
    }

    #[test]
    fn keygen_progress_observable() {
        let mut engine = Engine::new(MemStore::new());

        engine
            .update(&Event::KeygenInit { seed: Some(SEED) })
            .unwrap();
        assert_eq!(engine.state(), State::Keygen(KeygenPhase::Leaves));
        assert_eq!(engine.progress(), Some(0));

        let r = engine.update(&Event::KeygenStep).unwrap();
        assert_eq!(r.state(), Some((Mode::KeygenRunning, 1)));

        let r = engine.update(&Event::KeygenStep).unwrap();
        assert_eq!(r.state(), Some((Mode::KeygenRunning, 2)));
    }

    #[test]
    fn precondition_rejections_mutate_nothing() {
        let mut engine = Engine::new(MemStore::new());

        // Signing and key retrieval rejected while not initialized,
        // any number of times
        for _ in 0..3 {
            assert_eq!(
                engine.update(&Event::SignInit { digest: [0u8; 32] }),
                Err(Error::UnexpectedEvent)
            );
            assert_eq!(
                engine.update(&Event::GetPublicKey),
                Err(Error::InvalidState)
            );
            assert_eq!(
                engine.update(&Event::SignNext),
                Err(Error::UnexpectedEvent)
            );
            assert_eq!(
                engine.update(&Event::KeygenStep),
                Err(Error::UnexpectedEvent)
            );

            let r = engine.update(&Event::GetState).unwrap();
            assert_eq!(r.state(), Some((Mode::NotInitialized, 0)));
        }
    }

    #[test]
    fn keygen_rejected_while_signing() {
        let mut engine = Engine::new(MemStore::new());
        keygen(&mut engine);

        engine
            .update(&Event::SignInit { digest: [1u8; 32] })
            .unwrap();
        assert_eq!(engine.state(), State::Sign(SignState::Pending));

        assert_eq!(
            engine.update(&Event::KeygenInit { seed: Some(SEED) }),
            Err(Error::UnexpectedEvent)
        );
    }

    #[test]
    fn signing_mode_normalized_on_boot() {
        let mut store = MemStore::new();
        store.write_mode(Mode::Signing).unwrap();

        let engine = Engine::new(store);
        assert_eq!(engine.state(), State::Ready);
    }

    #[test]
    fn keygen_resumes_from_persisted_progress() {
        let mut engine = Engine::new(MemStore::new());
        engine
            .update(&Event::KeygenInit { seed: Some(SEED) })
            .unwrap();
        for _ in 0..10 {
            engine.update(&Event::KeygenStep).unwrap();
        }

        // Simulate power cycle: rebuild the engine over the same store
        let Engine { store, .. } = engine;
        let mut engine = Engine::new(store);
        assert_eq!(engine.state(), State::Keygen(KeygenPhase::Leaves));

        let r = engine.update(&Event::KeygenStep).unwrap();
        assert_eq!(r.state(), Some((Mode::KeygenRunning, 11)));
    }

    #[test]
    fn version_reports_flags() {
        let mut engine = Engine::new(MemStore::new());

        let r = engine.update(&Event::GetVersion).unwrap();
        match r {
            Output::Version { flags, .. } => assert!(!flags.contains(AppFlags::KEY_READY)),
            _ => panic!("unexpected output {r:?}"),
        }

        keygen(&mut engine);

        let r = engine.update(&Event::GetVersion).unwrap();
        match r {
            Output::Version { flags, .. } => assert!(flags.contains(AppFlags::KEY_READY)),
            _ => panic!("unexpected output {r:?}"),
        }
    }
}
