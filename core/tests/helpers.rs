#![allow(unused)]
// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::{Decode, Encode};

use ledger_xmss_core::{
    apdu::{prelude::*, ApduError, Instruction, Status, APDU_HEADER_LEN, XMSS_APDU_CLA},
    dispatcher::Dispatcher,
    engine::{Engine, Event, Output},
    store::MemStore,
    xmss::params::{NUM_LEAVES, SEED_BYTES, SIG_BYTES},
};

/// Fixed all-zero master seed used as the regression fixture
pub const TEST_SEED: [u8; SEED_BYTES] = [0u8; SEED_BYTES];

pub fn log_init() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Info, Default::default());
}

/// Frame a request APDU for the given instruction
pub fn frame<A: Encode<Error = ApduError>>(ins: Instruction, apdu: &A) -> Vec<u8> {
    let mut req = vec![XMSS_APDU_CLA, ins as u8, 0x00, 0x00];

    let mut payload = [0u8; 256];
    let n = apdu.encode(&mut payload).expect("encode request failed");
    req.extend_from_slice(&payload[..n]);

    req
}

/// Dispatch one framed request, splitting the response into payload and
/// status word
pub fn exchange(d: &mut Dispatcher<MemStore>, req: &[u8]) -> (Vec<u8>, Status) {
    let mut buff = [0u8; 256];
    let n = d.dispatch(req, &mut buff);
    assert!(n >= 2, "response missing status trailer");

    let status = Status::try_from(u16::from_be_bytes([buff[n - 2], buff[n - 1]]))
        .expect("unknown status word");

    (buff[..n - 2].to_vec(), status)
}

/// Fetch mode and value via GetState
pub fn get_state(d: &mut Dispatcher<MemStore>) -> (Mode, u16) {
    let (payload, status) = exchange(d, &frame(Instruction::GetState, &StateReq));
    assert_eq!(status, Status::Ok);

    let (resp, _) = StateResp::decode(&payload).expect("decode state failed");
    (resp.mode, resp.value)
}

/// Fetch the public key (root, public seed)
pub fn get_public_key(d: &mut Dispatcher<MemStore>) -> ([u8; 32], [u8; 32]) {
    let (payload, status) = exchange(d, &frame(Instruction::GetPublicKey, &PublicKeyReq));
    assert_eq!(status, Status::Ok);

    let (resp, _) = PublicKeyResp::decode(&payload).expect("decode public key failed");
    (resp.root, resp.pub_seed)
}

/// Drive key generation to completion via repeated KeygenStep requests
pub fn run_keygen(d: &mut Dispatcher<MemStore>, seed: Option<&[u8; SEED_BYTES]>) {
    let (_, status) = exchange(d, &frame(Instruction::KeygenInit, &KeygenInitReq::new(seed)));
    assert_eq!(status, Status::Ok);

    for _ in 0..=NUM_LEAVES + 1 {
        let (payload, status) = exchange(d, &frame(Instruction::KeygenStep, &KeygenStepReq));
        assert_eq!(status, Status::Ok);

        let (resp, _) = StateResp::decode(&payload).expect("decode state failed");
        if resp.mode == Mode::Ready {
            return;
        }
    }

    panic!("key generation did not complete");
}

lazy_static::lazy_static! {
    /// Keypair generated once from the fixed seed and cloned per test
    static ref READY_STORE: MemStore = {
        let mut d = Dispatcher::new(Engine::new(MemStore::new()));
        run_keygen(&mut d, Some(&TEST_SEED));
        d.into_engine().into_store()
    };
}

/// Build a dispatcher over a generated keypair from the fixed seed
pub fn ready_dispatcher() -> Dispatcher<MemStore> {
    Dispatcher::new(Engine::new(READY_STORE.clone()))
}

/// Run the full signing flow for a digest, approving on the first pending
/// poll, and return the assembled signature
pub fn run_sign(d: &mut Dispatcher<MemStore>, digest: [u8; 32]) -> Result<Vec<u8>, Status> {
    let (_, status) = exchange(d, &frame(Instruction::SignInit, &SignInitReq::new(digest)));
    if status != Status::Ok {
        return Err(status);
    }

    // Held for user confirmation until the display approves
    let (_, status) = exchange(d, &frame(Instruction::SignNext, &SignNextReq));
    assert_eq!(status, Status::ConditionsNotSatisfied);

    d.engine_mut().approve();

    collect_signature(d, Instruction::SignNext)
}

/// Poll sign-next style requests until the last chunk, concatenating the
/// signature
pub fn collect_signature(
    d: &mut Dispatcher<MemStore>,
    ins: Instruction,
) -> Result<Vec<u8>, Status> {
    let mut sig = Vec::new();

    for _ in 0..64 {
        let (payload, status) = exchange(d, &frame(ins, &SignNextReq));
        if status != Status::Ok {
            return Err(status);
        }

        // Progress responses are 3-byte state payloads, chunks are longer
        if payload.len() <= 3 {
            continue;
        }

        let (chunk, _) = SigChunk::decode(&payload).expect("decode chunk failed");
        sig.extend_from_slice(chunk.data);

        if chunk.flags.contains(SigFlags::LAST) {
            assert_eq!(sig.len(), SIG_BYTES);
            return Ok(sig);
        }
    }

    panic!("signature delivery did not complete");
}
