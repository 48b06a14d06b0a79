// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signing APDUs.
//!
//! A signature is produced across many bounded exchanges: a [`SignInitReq`]
//! carries the 32-byte transaction digest and latches the current leaf
//! index, then repeated [`SignNextReq`]s drive the computation (returning
//! [`StateResp`][crate::state::StateResp] progress) and, once the signature
//! is assembled and the index committed, fetch it chunk by chunk as
//! [`SigChunk`]s.

use encdec::{Decode, DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, XMSS_APDU_CLA};
use crate::{encdec_bitflags, helpers::arr};

/// Signature bytes carried per [`SigChunk`]
pub const CHUNK_LEN: usize = 240;

/// Sign init request APDU.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                            DIGEST                             /
/// /                 (32-byte transaction digest)                  /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SignInitReq {
    /// Transaction digest to be signed
    #[encdec(with = "arr")]
    pub digest: [u8; 32],
}

impl SignInitReq {
    /// Create a new [`SignInitReq`] APDU
    pub fn new(digest: [u8; 32]) -> Self {
        Self { digest }
    }
}

impl ApduStatic for SignInitReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::SignInit as u8;
}

/// Sign next request APDU (no payload).
///
/// Advances the signing operation by one bounded step, or fetches the next
/// signature chunk once computation has completed.
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SignNextReq;

impl ApduStatic for SignNextReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::SignNext as u8;
}

bitflags::bitflags! {
    /// Signature chunk flags
    pub struct SigFlags: u8 {
        /// Final chunk of the signature
        const LAST = 1 << 0;
    }
}

encdec_bitflags!(SigFlags);

/// Signature chunk response APDU.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      SEQ      |     FLAGS     |      LEN      |    RESERVED   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                             DATA                              /
/// /                       (LEN bytes, <= 240)                     /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SigChunk<'a> {
    /// Chunk sequence number
    pub seq: u8,
    /// Chunk flags
    pub flags: SigFlags,
    /// Signature bytes
    pub data: &'a [u8],
}

impl<'a> SigChunk<'a> {
    /// Create a new [`SigChunk`] APDU
    pub fn new(seq: u8, flags: SigFlags, data: &'a [u8]) -> Self {
        Self { seq, flags, data }
    }
}

impl<'a> Encode for SigChunk<'a> {
    type Error = ApduError;

    #[inline]
    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if self.data.len() > CHUNK_LEN || buff.len() < 4 + self.data.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.seq;
        self.flags.encode(&mut buff[1..])?;
        buff[2] = self.data.len() as u8;
        buff[3] = 0;

        buff[4..][..self.data.len()].copy_from_slice(self.data);

        Ok(4 + self.data.len())
    }

    #[inline]
    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(4 + self.data.len())
    }
}

impl<'a> Decode<'a> for SigChunk<'a> {
    type Output = Self;
    type Error = ApduError;

    #[inline]
    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        let seq = buff[0];
        let (flags, _) = SigFlags::decode_owned(&buff[1..])?;
        let len = buff[2] as usize;

        if len > CHUNK_LEN || buff.len() < 4 + len {
            return Err(ApduError::InvalidLength);
        }

        let data = &buff[4..][..len];

        Ok((Self { seq, flags, data }, 4 + len))
    }
}
