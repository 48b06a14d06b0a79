// Copyright (c) 2022-2023 The MobileCoin Foundation

//! XMSS hardware wallet core
//!
//! This provides a common [Engine][engine] implementing stateful hash-based
//! signing (XMSS with WOTS+ one-time signatures) for execution on hardware
//! wallets, together with the [Dispatcher][dispatcher::Dispatcher] mapping
//! framed requests onto it.
//!
//! Interactions with the [Engine][engine] are performed via
//! [Event][engine::Event]s and [Output][engine::Output]s, see
//! [ledger_xmss_apdu] for APDU objects and wire encodings.
//!
//! ## Operations
//!
//! Every request returns a status trailer; multi-step operations return a
//! [`StateResp`][ledger_xmss_apdu::state::StateResp] carrying the mode and
//! a progress counter until complete.
//!
//! ### Key generation
//!
//! 1. Issue [`KeygenInitReq`][ledger_xmss_apdu::keygen::KeygenInitReq],
//!    optionally carrying a 48-byte master seed (key restore); this wipes
//!    any prior keypair and resets the leaf index to zero
//! 2. Issue [`KeygenStepReq`][ledger_xmss_apdu::keygen::KeygenStepReq]
//!    repeatedly; each call derives one leaf keypair (or performs the final
//!    tree fold) and is bounded in time, with progress persisted so an
//!    interrupted generation resumes where it stopped
//!
//! ### Fetching the public key
//!
//! Issue [`PublicKeyReq`][ledger_xmss_apdu::public_key::PublicKeyReq] once
//! the mode reports `Ready`, returning the tree root and public seed.
//!
//! ### Signing
//!
//! 1. Issue [`SignInitReq`][ledger_xmss_apdu::sign::SignInitReq] with the
//!    32-byte transaction digest; the current leaf index is latched and the
//!    request is held pending user confirmation on the device
//! 2. Issue [`SignNextReq`][ledger_xmss_apdu::sign::SignNextReq] repeatedly;
//!    each call performs one bounded batch of chain computations, and once
//!    the signature is assembled (and the leaf index irrevocably advanced)
//!    returns one [`SigChunk`][ledger_xmss_apdu::sign::SigChunk] until the
//!    chunk flagged `LAST`
//!
//! A leaf index is never reused: the index is committed with the signature
//! fully assembled and immediately before its first byte is released, so
//! power loss either leaves the index unspent (nothing disclosed, retry is
//! safe) or spent (the device refuses to re-sign it).

#![cfg_attr(not(feature = "std"), no_std)]

pub use ledger_xmss_apdu as apdu;

pub mod dispatcher;

pub mod engine;

pub mod store;

pub mod xmss;

/// Application version reported via `GetVersion`
pub const APP_VERSION_MAJOR: u8 = 0;
pub const APP_VERSION_MINOR: u8 = 3;
pub const APP_VERSION_PATCH: u8 = 0;
