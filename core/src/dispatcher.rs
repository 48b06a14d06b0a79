// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Framed command dispatcher.
//!
//! Receives one framed request at a time from the transport, validates the
//! fixed-position header, drives the [Engine] and encodes the response:
//! `[class][ins][p1][p2][payload...]` in, `[payload...][status_hi][status_lo]`
//! out. Every internal failure maps to exactly one [Status] code; no other
//! engine state leaks on error.

use rand_core::{CryptoRngCore, OsRng};

use ledger_xmss_apdu::{Instruction, Status, APDU_HEADER_LEN, XMSS_APDU_CLA};

use crate::{
    engine::{Engine, Error, Event},
    store::NvStore,
};

/// Map engine errors to response status words
impl From<Error> for Status {
    fn from(e: Error) -> Self {
        match e {
            Error::Exhausted => Status::KeyExhausted,
            Error::ApprovalPending => Status::ConditionsNotSatisfied,
            Error::UnexpectedEvent | Error::InvalidState => Status::CommandNotAllowed,
            Error::InvalidLength | Error::EncodingFailed => Status::ExecutionError,
            Error::StoreFailed | Error::Unknown => Status::Unknown,
        }
    }
}

/// Command dispatcher over an [Engine].
///
/// One request is fully processed before the next is accepted; multi-step
/// operations are driven by the transport re-issuing the relevant
/// instruction until completion is reported.
pub struct Dispatcher<S: NvStore, RNG: CryptoRngCore = OsRng> {
    engine: Engine<S, RNG>,
}

impl<S: NvStore, RNG: CryptoRngCore> Dispatcher<S, RNG> {
    /// Create a dispatcher over the provided engine
    pub fn new(engine: Engine<S, RNG>) -> Self {
        Self { engine }
    }

    /// Access the wrapped engine (UI / display collaborator hooks)
    pub fn engine(&self) -> &Engine<S, RNG> {
        &self.engine
    }

    /// Mutable access to the wrapped engine
    pub fn engine_mut(&mut self) -> &mut Engine<S, RNG> {
        &mut self.engine
    }

    /// Release the wrapped engine
    pub fn into_engine(self) -> Engine<S, RNG> {
        self.engine
    }

    /// Process one framed request, writing the response (payload plus
    /// status trailer) into `buff` and returning its length.
    pub fn dispatch(&mut self, req: &[u8], buff: &mut [u8]) -> usize {
        // Header is validated before any instruction-specific parsing
        if req.len() < APDU_HEADER_LEN {
            return respond_status(buff, 0, Status::ExecutionError);
        }

        let (cla, ins) = (req[0], req[1]);

        if cla != XMSS_APDU_CLA {
            return respond_status(buff, 0, Status::ClaNotSupported);
        }

        let ins = match Instruction::try_from(ins) {
            Ok(v) => v,
            Err(_) => return respond_status(buff, 0, Status::InsNotSupported),
        };

        // Decode the payload to an engine event
        let evt = match Event::parse(ins as u8, &req[APDU_HEADER_LEN..]) {
            Ok(v) => v,
            Err(_e) => {
                #[cfg(feature = "log")]
                log::warn!("payload decode failed for {:?}: {:?}", ins, _e);

                return respond_status(buff, 0, Status::ExecutionError);
            }
        };

        // Update engine and encode the response
        match self.engine.update(&evt) {
            Ok(output) => {
                let lim = buff.len().saturating_sub(2);
                match output.encode(&mut buff[..lim]) {
                    Ok(n) => respond_status(buff, n, Status::Ok),
                    Err(_) => respond_status(buff, 0, Status::Unknown),
                }
            }
            Err(e) => respond_status(buff, 0, Status::from(e)),
        }
    }
}

/// Append a status trailer after `n` payload bytes
fn respond_status(buff: &mut [u8], n: usize, status: Status) -> usize {
    if buff.len() < n + 2 {
        return 0;
    }

    buff[n..n + 2].copy_from_slice(&status.to_bytes());
    n + 2
}
