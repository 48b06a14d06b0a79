// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Public key APDUs, for fetching the XMSS root and public seed

use encdec::{Decode, Encode};

use super::{ApduError, ApduStatic, Instruction, XMSS_APDU_CLA};
use crate::helpers::arr;

/// Public key request APDU (no payload).
///
/// Only valid once key generation has completed (`Ready` mode).
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct PublicKeyReq;

impl ApduStatic for PublicKeyReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::GetPublicKey as u8;
}

/// Public key response APDU.
///
/// Contains the XMSS tree root and the public seed, together forming the
/// 64-byte verification key.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                             ROOT                              /
/// /                       (32-byte tree root)                     /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          PUBLIC_SEED                          /
/// /                      (32-byte public seed)                    /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct PublicKeyResp {
    /// XMSS tree root
    #[encdec(with = "arr")]
    pub root: [u8; 32],
    /// Public seed used to randomize hash-chain inputs
    #[encdec(with = "arr")]
    pub pub_seed: [u8; 32],
}

impl PublicKeyResp {
    /// Create a new [`PublicKeyResp`] APDU
    pub fn new(root: [u8; 32], pub_seed: [u8; 32]) -> Self {
        Self { root, pub_seed }
    }
}

#[cfg(test)]
mod test {
    use rand::random;

    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn public_key_req_apdu() {
        let apdu = PublicKeyReq::default();

        let mut buff = [0u8; 16];
        encode_decode_apdu(&mut buff, &apdu);
    }

    #[test]
    fn public_key_resp_apdu() {
        let apdu = PublicKeyResp::new(random(), random());

        let mut buff = [0u8; 128];
        let n = encode_decode_apdu(&mut buff, &apdu);
        assert_eq!(n, 64);
    }
}
