// Copyright (c) 2022-2023 The MobileCoin Foundation

//! XMSS / WOTS+ parameter set.
//!
//! A single fixed parameter set: SHA-256 based hashing, Winternitz
//! parameter 16, one 256-leaf tree of height 8.

use static_assertions::{const_assert, const_assert_eq};

/// Hash / chain value size in bytes
pub const WOTS_N: usize = 32;

/// Winternitz parameter
pub const WOTS_W: u32 = 16;

/// Bits per signature digit
pub const WOTS_LOG_W: u32 = 4;

/// Number of message digits
pub const WOTS_LEN1: usize = 64;

/// Number of checksum digits
pub const WOTS_LEN2: usize = 3;

/// Total number of hash chains per one-time keypair
pub const WOTS_LEN: usize = WOTS_LEN1 + WOTS_LEN2;

/// Merkle tree height
pub const TREE_HEIGHT: usize = 8;

/// Number of one-time keypairs under one root
pub const NUM_LEAVES: usize = 1 << TREE_HEIGHT;

/// Master seed material length
pub const SEED_BYTES: usize = 48;

/// Transaction digest length
pub const MSG_BYTES: usize = 32;

/// WOTS+ signature length in bytes
pub const WOTS_SIG_BYTES: usize = WOTS_LEN * WOTS_N;

/// Authentication path length in bytes
pub const AUTH_BYTES: usize = TREE_HEIGHT * WOTS_N;

/// Complete signature length (WOTS+ part followed by authentication path)
pub const SIG_BYTES: usize = WOTS_SIG_BYTES + AUTH_BYTES;

// Two base-16 digits per message byte
const_assert_eq!(WOTS_LEN1, MSG_BYTES * 2);

// Checksum counter (at most 15 * WOTS_LEN1 = 960) fits the checksum digits,
// overflow cannot occur for any message
const_assert!(WOTS_LEN1 * 15 < 1 << (WOTS_LOG_W as usize * WOTS_LEN2));

const_assert_eq!(SIG_BYTES, 2400);
