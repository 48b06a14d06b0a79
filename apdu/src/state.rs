// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Application state APDUs
//!

use encdec::{Decode, DecodeOwned, Encode};
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use super::{ApduError, ApduStatic, Instruction, XMSS_APDU_CLA};

/// Persistent application mode.
///
/// `NotInitialized` and `KeygenRunning` reject all signing requests,
/// `Signing` is only observable while a signature is in flight.
#[derive(
    Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[repr(u8)]
pub enum Mode {
    NotInitialized = 0x00,
    KeygenRunning = 0x01,
    Ready = 0x02,
    Signing = 0x03,
}

impl Encode for Mode {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }
        buff[0] = *self as u8;
        Ok(1)
    }
}

impl DecodeOwned for Mode {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        match Self::try_from(buff[0]) {
            Ok(v) => Ok((v, 1)),
            Err(_) => Err(ApduError::InvalidEncoding),
        }
    }
}

/// Application state request APDU (no payload)
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct StateReq;

impl ApduStatic for StateReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::GetState as u8;
}

/// Application state response APDU.
///
/// `value` carries the keygen progress counter while key generation is
/// running and the current leaf index otherwise.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      MODE     |             VALUE             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct StateResp {
    /// Current application mode
    pub mode: Mode,
    /// Keygen progress or leaf index, depending on mode
    pub value: u16,
}

impl StateResp {
    /// Create a new [`StateResp`] APDU
    pub fn new(mode: Mode, value: u16) -> Self {
        Self { mode, value }
    }
}
