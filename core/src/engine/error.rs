// Copyright (c) 2022-2023 The MobileCoin Foundation

use crate::store::StoreError;

/// [Engine][super::Engine] errors
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Invalid argument length
    #[cfg_attr(feature = "thiserror", error("Invalid argument length"))]
    InvalidLength = 0x00,

    /// Unexpected event for the current state
    #[cfg_attr(feature = "thiserror", error("Unexpected event"))]
    UnexpectedEvent = 0x01,

    /// Invalid engine state
    #[cfg_attr(feature = "thiserror", error("invalid engine state"))]
    InvalidState = 0x02,

    /// Pending user approval
    #[cfg_attr(feature = "thiserror", error("pending user approval"))]
    ApprovalPending = 0x03,

    /// All one-time leaf indices consumed, keypair unusable for signing
    #[cfg_attr(feature = "thiserror", error("leaf indices exhausted"))]
    Exhausted = 0x04,

    /// Persistent store rejected an operation
    #[cfg_attr(feature = "thiserror", error("store operation failed"))]
    StoreFailed = 0x05,

    /// Response encoding failed
    #[cfg_attr(feature = "thiserror", error("message encoding failed"))]
    EncodingFailed = 0x06,

    /// Unknown / not-yet defined error (placeholder)
    #[cfg_attr(feature = "thiserror", error("unknown"))]
    Unknown = 0xf0,
}

impl From<StoreError> for Error {
    fn from(_: StoreError) -> Self {
        Error::StoreFailed
    }
}
