// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for XMSS hardware wallet communication
//!
//! This module provides a protocol specification and reference implementation
//! for communication with XMSS signing devices.
//!
//! APDUs use a primitive binary encoding to simplify implementation with
//! other languages and platforms. Encodings are intended to be _roughly_
//! equivalent to packed c structures while maintaining 32-bit field alignment
//! to reduce the need for unaligned access on constrained platforms.
//! All integer field encodings are little-endian.

#![no_std]

use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

pub mod app_info;
#[cfg(feature = "diag")]
pub mod diag;
pub mod keygen;
pub mod prelude;
pub mod public_key;
pub mod sign;
pub mod state;

mod helpers;

/// XMSS APDU Class
pub const XMSS_APDU_CLA: u8 = 0x77;

pub const XMSS_PROTO_VERSION: u8 = 0x01;

/// Request APDU header length (class, instruction, two parameter bytes)
pub const APDU_HEADER_LEN: usize = 4;

/// XMSS APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    // General instructions
    /// Fetch application version and flags
    GetVersion = 0x00,

    /// Fetch application mode and index / progress
    GetState = 0x01,

    /// Fetch the XMSS public key (root and public seed)
    GetPublicKey = 0x02,

    /// Start key generation, wiping any prior key material
    KeygenInit = 0x10,

    /// Execute one bounded unit of key generation
    KeygenStep = 0x11,

    /// Start signing a transaction digest
    SignInit = 0x20,

    /// Execute one bounded signing step / fetch the next signature chunk
    SignNext = 0x21,

    /// Read a cached leaf node (diagnostic)
    #[cfg(feature = "diag")]
    ReadLeaf = 0x80,

    /// Overwrite a cached leaf node (diagnostic)
    #[cfg(feature = "diag")]
    WriteLeaf = 0x81,

    /// Compute the message digest for an index (diagnostic)
    #[cfg(feature = "diag")]
    Digest = 0x82,

    /// Start a raw signing context, bypassing approval (diagnostic)
    #[cfg(feature = "diag")]
    SignInitRaw = 0x83,

    /// Step a raw signing context (diagnostic)
    #[cfg(feature = "diag")]
    SignStepRaw = 0x84,
}

/// APDU encode / decode errors
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ApduError {
    /// Buffer or payload length invalid
    InvalidLength,
    /// Field encoding invalid
    InvalidEncoding,
    /// Invalid UTF8 string
    Utf8,
}

impl From<encdec::Error> for ApduError {
    fn from(e: encdec::Error) -> Self {
        match e {
            encdec::Error::Length => ApduError::InvalidLength,
            _ => ApduError::InvalidEncoding,
        }
    }
}

/// Trait for APDUs with fixed class and instruction codes
pub trait ApduStatic {
    /// APDU command class
    const CLA: u8;

    /// APDU command instruction
    const INS: u8;
}

/// Response status words, appended to every response payload
#[derive(
    Copy, Clone, Debug, PartialEq, EnumString, Display, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[repr(u16)]
pub enum Status {
    /// Command executed, payload valid
    Ok = 0x9000,
    /// Malformed or mis-sized payload
    ExecutionError = 0x6400,
    /// All one-time leaf indices consumed, no further signatures possible
    KeyExhausted = 0x6983,
    /// User confirmation pending
    ConditionsNotSatisfied = 0x6985,
    /// Command not allowed in the current mode
    CommandNotAllowed = 0x6986,
    /// Instruction not supported
    InsNotSupported = 0x6d00,
    /// Command class not supported
    ClaNotSupported = 0x6e00,
    /// Unmapped internal failure
    Unknown = 0x6f00,
}

impl Status {
    /// Split a status word into `[status_hi, status_lo]` trailer bytes
    pub fn to_bytes(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }
}

/// Helper macro for encoding `bitflags` types
#[macro_export]
macro_rules! encdec_bitflags {
    ($b:ty) => {
        impl encdec::Encode for $b {
            type Error = $crate::ApduError;

            fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
                let bits: u8 = self.bits();
                encdec::Encode::encode(&bits, buff).map_err(|e| e.into())
            }

            fn encode_len(&self) -> Result<usize, Self::Error> {
                let bits: u8 = self.bits();
                encdec::Encode::encode_len(&bits).map_err(|e| e.into())
            }
        }

        impl encdec::DecodeOwned for $b {
            type Output = $b;
            type Error = $crate::ApduError;

            fn decode_owned(buff: &[u8]) -> Result<(Self, usize), Self::Error> {
                if buff.is_empty() {
                    return Err($crate::ApduError::InvalidLength);
                }
                let v = <$b>::from_bits_truncate(buff[0]);
                Ok((v, 1))
            }
        }
    };
}

#[cfg(test)]
pub(crate) mod test {
    use encdec::EncDec;

    use super::*;

    /// Helper for APDU encode / decode tests
    pub fn encode_decode_apdu<'a, A: EncDec<'a, ApduError> + PartialEq>(
        buff: &'a mut [u8],
        apdu: &A,
    ) -> usize {
        // Encode APDU
        let n = apdu.encode(buff).expect("encode failed");

        // Ensure encoded data fits maximum APDU payload
        let m = 249;
        assert!(n < m, "encoded length {n} exceeds maximum APDU payload {m}");

        // Check encoded length matches expected length
        let expected_n = apdu.encode_len().expect("get length failed");
        assert_eq!(n, expected_n, "encode length mismatch");

        // Decode APDU
        let (decoded, decoded_n) = A::decode(&buff[..n]).expect("decode failed");

        // Check decoded object and length match
        assert_eq!(apdu, &decoded);
        assert_eq!(expected_n, decoded_n);

        n
    }

    #[test]
    fn status_word_trailer() {
        assert_eq!(Status::Ok.to_bytes(), [0x90, 0x00]);
        assert_eq!(Status::ClaNotSupported.to_bytes(), [0x6e, 0x00]);
        assert_eq!(Status::KeyExhausted.to_bytes(), [0x69, 0x83]);
    }

    #[test]
    fn status_word_from_primitive() {
        use strum::IntoEnumIterator;

        for s in Status::iter() {
            assert_eq!(Status::try_from(s as u16), Ok(s));
        }
        assert!(Status::try_from(0x1234u16).is_err());
    }
}
