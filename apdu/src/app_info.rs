// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Application information APDUs

use encdec::{Decode, Encode};

use super::{ApduError, ApduStatic, Instruction, XMSS_APDU_CLA};
use crate::encdec_bitflags;

/// Fetch application version APDU (no payload)
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct VersionReq;

impl ApduStatic for VersionReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::GetVersion as u8;
}

bitflags::bitflags! {
    /// Application info flags
    pub struct AppFlags: u8 {
        /// Diagnostic instructions compiled in
        const DIAGNOSTICS = 1 << 0;

        /// Key material provisioned and ready for signing
        const KEY_READY = 1 << 1;
    }
}

encdec_bitflags!(AppFlags);

/// Application version response APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     FLAGS     |     MAJOR     |     MINOR     |     PATCH     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct VersionResp {
    /// Application flags
    pub flags: AppFlags,
    /// Semantic version, major
    pub major: u8,
    /// Semantic version, minor
    pub minor: u8,
    /// Semantic version, patch
    pub patch: u8,
}

impl VersionResp {
    /// Create a new [`VersionResp`] APDU
    pub fn new(flags: AppFlags, major: u8, minor: u8, patch: u8) -> Self {
        Self {
            flags,
            major,
            minor,
            patch,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn version_req_apdu() {
        let apdu = VersionReq::default();

        let mut buff = [0u8; 16];
        encode_decode_apdu(&mut buff, &apdu);
    }

    #[test]
    fn version_resp_apdu() {
        let apdu = VersionResp::new(AppFlags::DIAGNOSTICS | AppFlags::KEY_READY, 0, 3, 1);

        let mut buff = [0u8; 16];
        let n = encode_decode_apdu(&mut buff, &apdu);
        assert_eq!(n, 4);
    }
}
