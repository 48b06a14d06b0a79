// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    app_info::{AppFlags, VersionReq, VersionResp},
    keygen::{KeygenFlags, KeygenInitReq, KeygenStepReq, SEED_IMPORT_LEN},
    public_key::{PublicKeyReq, PublicKeyResp},
    sign::{SigChunk, SigFlags, SignInitReq, SignNextReq, CHUNK_LEN},
    state::{Mode, StateReq, StateResp},
};

#[cfg(feature = "diag")]
pub use crate::diag::{
    DigestReq, DigestResp, LeafResp, ReadLeafReq, SignInitRawReq, SignStepRawReq, WriteLeafReq,
};
