// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::Encode;
use heapless::Vec;

use ledger_xmss_apdu::{prelude::*, state::Mode, ApduError};

/// [`Engine`][super::Engine] outputs (in response to events), encoded to
/// response APDUs by the dispatcher
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Application version and flags
    Version {
        flags: AppFlags,
        major: u8,
        minor: u8,
        patch: u8,
    },

    /// Application mode plus keygen progress or leaf index
    State { mode: Mode, value: u16 },

    /// Public key (root and public seed)
    PublicKey {
        root: [u8; 32],
        pub_seed: [u8; 32],
    },

    /// One chunk of an assembled signature
    SigChunk {
        seq: u8,
        last: bool,
        data: Vec<u8, CHUNK_LEN>,
    },

    /// Cached leaf node (diagnostic)
    #[cfg(feature = "diag")]
    Leaf { node: [u8; 32] },

    /// Computed message digest (diagnostic)
    #[cfg(feature = "diag")]
    Digest { digest: [u8; 32] },
}

impl Output {
    /// Encode an [`Output`] object to a response APDU payload
    pub fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match self {
            Output::None => Ok(0),
            Output::Version {
                flags,
                major,
                minor,
                patch,
            } => VersionResp::new(*flags, *major, *minor, *patch).encode(buff),
            Output::State { mode, value } => StateResp::new(*mode, *value).encode(buff),
            Output::PublicKey { root, pub_seed } => {
                PublicKeyResp::new(*root, *pub_seed).encode(buff)
            }
            Output::SigChunk { seq, last, data } => {
                let mut flags = SigFlags::empty();
                flags.set(SigFlags::LAST, *last);
                SigChunk::new(*seq, flags, data).encode(buff)
            }
            #[cfg(feature = "diag")]
            Output::Leaf { node } => LeafResp::new(*node).encode(buff),
            #[cfg(feature = "diag")]
            Output::Digest { digest } => DigestResp::new(*digest).encode(buff),
        }
    }

    /// Fetch mode and value for state outputs
    pub fn state(&self) -> Option<(Mode, u16)> {
        match self {
            Output::State { mode, value } => Some((*mode, *value)),
            _ => None,
        }
    }
}
