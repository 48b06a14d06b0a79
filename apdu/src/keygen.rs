// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key generation APDUs.
//!
//! Key generation is driven incrementally: a [`KeygenInitReq`] wipes any
//! prior key material and derives fresh seeds, then repeated
//! [`KeygenStepReq`]s each perform one bounded unit of work (one leaf, or
//! the final tree fold) until the reported mode reaches `Ready`.
//! Both return a [`StateResp`][crate::state::StateResp] carrying the
//! progress counter.

use encdec::{Decode, DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, XMSS_APDU_CLA};
use crate::encdec_bitflags;

/// Master seed import length
pub const SEED_IMPORT_LEN: usize = 48;

bitflags::bitflags! {
    /// Key generation request flags
    pub struct KeygenFlags: u8 {
        /// Payload carries a 48-byte master seed (key restore),
        /// otherwise seeds are drawn from the device RNG
        const SEED_PROVIDED = 1 << 0;
    }
}

encdec_bitflags!(KeygenFlags);

/// Key generation init request APDU.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     FLAGS     |                   RESERVED                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          MASTER_SEED                          /
/// /              (48 bytes, present if SEED_PROVIDED)             /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct KeygenInitReq<'a> {
    /// Imported master seed, `None` to generate from the device RNG
    pub seed: Option<&'a [u8; SEED_IMPORT_LEN]>,
}

impl<'a> KeygenInitReq<'a> {
    /// Create a new [`KeygenInitReq`] APDU
    pub fn new(seed: Option<&'a [u8; SEED_IMPORT_LEN]>) -> Self {
        Self { seed }
    }
}

impl<'a> ApduStatic for KeygenInitReq<'a> {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::KeygenInit as u8;
}

impl<'a> Encode for KeygenInitReq<'a> {
    type Error = ApduError;

    #[inline]
    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut flags = KeygenFlags::empty();
        flags.set(KeygenFlags::SEED_PROVIDED, self.seed.is_some());

        // Write flags and reserved padding
        let mut index = flags.encode(buff)?;
        buff[index..4].fill(0);
        index = 4;

        // Write seed where provided
        if let Some(seed) = self.seed {
            buff[index..][..SEED_IMPORT_LEN].copy_from_slice(seed);
            index += SEED_IMPORT_LEN;
        }

        Ok(index)
    }

    #[inline]
    fn encode_len(&self) -> Result<usize, ApduError> {
        match self.seed {
            Some(_) => Ok(4 + SEED_IMPORT_LEN),
            None => Ok(4),
        }
    }
}

impl<'a> Decode<'a> for KeygenInitReq<'a> {
    type Output = Self;
    type Error = ApduError;

    #[inline]
    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        let (flags, _) = KeygenFlags::decode_owned(buff)?;
        let mut index = 4;

        let seed = match flags.contains(KeygenFlags::SEED_PROVIDED) {
            false => None,
            true => {
                if buff.len() < 4 + SEED_IMPORT_LEN {
                    return Err(ApduError::InvalidLength);
                }

                let s: &[u8; SEED_IMPORT_LEN] = buff[index..][..SEED_IMPORT_LEN]
                    .try_into()
                    .map_err(|_| ApduError::InvalidLength)?;
                index += SEED_IMPORT_LEN;

                Some(s)
            }
        };

        Ok((Self { seed }, index))
    }
}

/// Key generation step request APDU (no payload).
///
/// Performs one bounded unit of key generation work.
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct KeygenStepReq;

impl ApduStatic for KeygenStepReq {
    const CLA: u8 = XMSS_APDU_CLA;
    const INS: u8 = Instruction::KeygenStep as u8;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn keygen_init_apdu() {
        let apdu = KeygenInitReq::new(None);

        let mut buff = [0u8; 64];
        let n = encode_decode_apdu(&mut buff, &apdu);
        assert_eq!(n, 4);
    }

    #[test]
    fn keygen_init_seed_apdu() {
        let seed = [0xa5u8; SEED_IMPORT_LEN];
        let apdu = KeygenInitReq::new(Some(&seed));

        let mut buff = [0u8; 64];
        let n = encode_decode_apdu(&mut buff, &apdu);
        assert_eq!(n, 4 + SEED_IMPORT_LEN);
    }

    #[test]
    fn keygen_init_short_seed_rejected() {
        let seed = [0xa5u8; SEED_IMPORT_LEN];
        let apdu = KeygenInitReq::new(Some(&seed));

        let mut buff = [0u8; 64];
        let n = apdu.encode(&mut buff).unwrap();

        // Truncated seed payload must not decode
        let r = KeygenInitReq::decode(&buff[..n - 1]);
        assert_eq!(r, Err(ApduError::InvalidLength));
    }

    #[test]
    fn keygen_step_apdu() {
        let apdu = KeygenStepReq::default();

        let mut buff = [0u8; 16];
        encode_decode_apdu(&mut buff, &apdu);
    }
}
