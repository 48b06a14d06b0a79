// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::Decode;

use ledger_xmss_apdu::{prelude::*, ApduError, ApduStatic};

use crate::xmss::params::{MSG_BYTES, SEED_BYTES};

/// [`Engine`][super::Engine] input events, decoded from request APDUs
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    None,

    /// Fetch application version
    GetVersion,

    /// Fetch application mode and index / progress
    GetState,

    /// Fetch the public key (root and public seed)
    GetPublicKey,

    /// Start key generation, wiping any prior keypair
    KeygenInit {
        /// Imported master seed, `None` to draw from the device RNG
        seed: Option<[u8; SEED_BYTES]>,
    },

    /// Execute one bounded unit of key generation
    KeygenStep,

    /// Start signing a transaction digest at the current leaf index
    SignInit {
        digest: [u8; MSG_BYTES],
    },

    /// Execute one bounded signing step / fetch the next signature chunk
    SignNext,

    /// Read a cached leaf node (diagnostic)
    #[cfg(feature = "diag")]
    ReadLeaf { index: u16 },

    /// Overwrite a cached leaf node (diagnostic)
    #[cfg(feature = "diag")]
    WriteLeaf { index: u16, node: [u8; 32] },

    /// Compute the message digest for an index (diagnostic)
    #[cfg(feature = "diag")]
    Digest { index: u16, msg: [u8; 32] },

    /// Start a raw signing context, bypassing approval and commit (diagnostic)
    #[cfg(feature = "diag")]
    SignInitRaw { index: u16, digest: [u8; 32] },

    /// Step a raw signing context (diagnostic)
    #[cfg(feature = "diag")]
    SignStepRaw,
}

/// Helper for decoding APDUs to events
fn decode_event<'a, T>(buff: &'a [u8]) -> Result<Event, ApduError>
where
    T: Decode<'a, Error = ApduError>,
    Event: From<T::Output>,
{
    T::decode(buff).map(|(v, _n)| Event::from(v))
}

impl Event {
    /// Parse an incoming request APDU payload to an engine event
    pub fn parse(ins: u8, buff: &[u8]) -> Result<Self, ApduError> {
        match ins {
            VersionReq::INS => decode_event::<VersionReq>(buff),
            StateReq::INS => decode_event::<StateReq>(buff),
            PublicKeyReq::INS => decode_event::<PublicKeyReq>(buff),

            KeygenInitReq::INS => decode_event::<KeygenInitReq>(buff),
            KeygenStepReq::INS => decode_event::<KeygenStepReq>(buff),

            SignInitReq::INS => decode_event::<SignInitReq>(buff),
            SignNextReq::INS => decode_event::<SignNextReq>(buff),

            #[cfg(feature = "diag")]
            ReadLeafReq::INS => decode_event::<ReadLeafReq>(buff),
            #[cfg(feature = "diag")]
            WriteLeafReq::INS => decode_event::<WriteLeafReq>(buff),
            #[cfg(feature = "diag")]
            DigestReq::INS => decode_event::<DigestReq>(buff),
            #[cfg(feature = "diag")]
            SignInitRawReq::INS => decode_event::<SignInitRawReq>(buff),
            #[cfg(feature = "diag")]
            SignStepRawReq::INS => decode_event::<SignStepRawReq>(buff),

            _ => Err(ApduError::InvalidEncoding),
        }
    }
}

impl From<VersionReq> for Event {
    fn from(_: VersionReq) -> Self {
        Event::GetVersion
    }
}

impl From<StateReq> for Event {
    fn from(_: StateReq) -> Self {
        Event::GetState
    }
}

impl From<PublicKeyReq> for Event {
    fn from(_: PublicKeyReq) -> Self {
        Event::GetPublicKey
    }
}

impl<'a> From<KeygenInitReq<'a>> for Event {
    fn from(a: KeygenInitReq<'a>) -> Self {
        Event::KeygenInit {
            seed: a.seed.copied(),
        }
    }
}

impl From<KeygenStepReq> for Event {
    fn from(_: KeygenStepReq) -> Self {
        Event::KeygenStep
    }
}

impl From<SignInitReq> for Event {
    fn from(a: SignInitReq) -> Self {
        Event::SignInit { digest: a.digest }
    }
}

impl From<SignNextReq> for Event {
    fn from(_: SignNextReq) -> Self {
        Event::SignNext
    }
}

#[cfg(feature = "diag")]
impl From<ReadLeafReq> for Event {
    fn from(a: ReadLeafReq) -> Self {
        Event::ReadLeaf { index: a.index }
    }
}

#[cfg(feature = "diag")]
impl From<WriteLeafReq> for Event {
    fn from(a: WriteLeafReq) -> Self {
        Event::WriteLeaf {
            index: a.index,
            node: a.node,
        }
    }
}

#[cfg(feature = "diag")]
impl From<DigestReq> for Event {
    fn from(a: DigestReq) -> Self {
        Event::Digest {
            index: a.index,
            msg: a.msg,
        }
    }
}

#[cfg(feature = "diag")]
impl From<SignInitRawReq> for Event {
    fn from(a: SignInitRawReq) -> Self {
        Event::SignInitRaw {
            index: a.index,
            digest: a.digest,
        }
    }
}

#[cfg(feature = "diag")]
impl From<SignStepRawReq> for Event {
    fn from(_: SignStepRawReq) -> Self {
        Event::SignStepRaw
    }
}

#[cfg(test)]
mod tests {
    use encdec::Encode;

    use super::*;

    #[test]
    fn parse_sign_init() {
        let digest = [0xabu8; MSG_BYTES];
        let req = SignInitReq::new(digest);

        let mut buff = [0u8; 64];
        let n = req.encode(&mut buff).unwrap();

        let evt = Event::parse(SignInitReq::INS, &buff[..n]).unwrap();
        assert_eq!(evt, Event::SignInit { digest });
    }

    #[test]
    fn parse_keygen_init_with_seed() {
        let seed = [0x11u8; SEED_BYTES];
        let req = KeygenInitReq::new(Some(&seed));

        let mut buff = [0u8; 64];
        let n = req.encode(&mut buff).unwrap();

        let evt = Event::parse(KeygenInitReq::INS, &buff[..n]).unwrap();
        assert_eq!(evt, Event::KeygenInit { seed: Some(seed) });
    }

    #[test]
    fn parse_truncated_payload_rejected() {
        let req = SignInitReq::new([0u8; MSG_BYTES]);

        let mut buff = [0u8; 64];
        let n = req.encode(&mut buff).unwrap();

        let r = Event::parse(SignInitReq::INS, &buff[..n - 1]);
        assert_eq!(r, Err(ApduError::InvalidLength));
    }
}
