// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Diagnostic APDUs, gated behind the `diag` feature.
//!
//! These expose raw leaf cache access, message-digest computation, and
//! un-gated incremental signing for conformance testing. They are excluded
//! from the production trust boundary and MUST NOT be compiled into release
//! firmware.

use encdec::{Decode, Encode};

use super::{ApduError, ApduStatic, Instruction, XMSS_APDU_CLA};
use crate::helpers::arr;

/// Read a cached leaf node.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           LEAF_INDEX          |            RESERVED           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct ReadLeafReq {
    /// Leaf index to read
    pub index: u16,
}

impl ReadLeafReq {
    /// Create a new [`ReadLeafReq`] APDU
    pub fn new(index: u16) -> Self {
        Self { index }
    }
}

impl ApduStatic for ReadLeafReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::ReadLeaf as u8;
}

/// Leaf node response
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct LeafResp {
    /// Leaf node value
    #[encdec(with = "arr")]
    pub node: [u8; 32],
}

impl LeafResp {
    /// Create a new [`LeafResp`] APDU
    pub fn new(node: [u8; 32]) -> Self {
        Self { node }
    }
}

/// Overwrite a cached leaf node.
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct WriteLeafReq {
    /// Leaf index to write
    pub index: u16,
    /// Leaf node value
    #[encdec(with = "arr")]
    pub node: [u8; 32],
}

impl WriteLeafReq {
    /// Create a new [`WriteLeafReq`] APDU
    pub fn new(index: u16, node: [u8; 32]) -> Self {
        Self { index, node }
    }
}

impl ApduStatic for WriteLeafReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::WriteLeaf as u8;
}

/// Compute the message digest signed for a given index.
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct DigestReq {
    /// Leaf index bound into the digest
    pub index: u16,
    /// Raw 32-byte message
    #[encdec(with = "arr")]
    pub msg: [u8; 32],
}

impl DigestReq {
    /// Create a new [`DigestReq`] APDU
    pub fn new(index: u16, msg: [u8; 32]) -> Self {
        Self { index, msg }
    }
}

impl ApduStatic for DigestReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::Digest as u8;
}

/// Message digest response
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct DigestResp {
    /// Computed message digest
    #[encdec(with = "arr")]
    pub digest: [u8; 32],
}

impl DigestResp {
    /// Create a new [`DigestResp`] APDU
    pub fn new(digest: [u8; 32]) -> Self {
        Self { digest }
    }
}

/// Start a raw signing context for an arbitrary index.
///
/// Bypasses mode checks and user approval, and never commits the index.
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SignInitRawReq {
    /// Leaf index to sign with
    pub index: u16,
    /// Transaction digest to sign
    #[encdec(with = "arr")]
    pub digest: [u8; 32],
}

impl SignInitRawReq {
    /// Create a new [`SignInitRawReq`] APDU
    pub fn new(index: u16, digest: [u8; 32]) -> Self {
        Self { index, digest }
    }
}

impl ApduStatic for SignInitRawReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::SignInitRaw as u8;
}

/// Step a raw signing context (no payload).
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SignStepRawReq;

impl ApduStatic for SignStepRawReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::SignStepRaw as u8;
}
