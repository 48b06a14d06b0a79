// Copyright (c) 2022-2023 The MobileCoin Foundation

//! XMSS stateful signature engine.
//!
//! [`wotsp`] builds one-time keys and signatures from hash chains, [`tree`]
//! maintains the Merkle authentication structure over them, [`hash`] adapts
//! the external SHA-256 primitive into the domain-separated constructions
//! both consume. See [`engine`][crate::engine] for the state machines
//! driving these against the persistent store.

pub mod adrs;
pub mod hash;
pub mod params;
pub mod tree;
pub mod verify;
pub mod wotsp;
