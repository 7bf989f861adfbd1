//! Fuzz target for classic LZMA header decoding.
//!
//! Run with: cargo +nightly fuzz run header_decode
//!
//! Properties checked:
//! - Decoding never panics
//! - A decoded header re-encodes to the same 13 bytes
//! - Normalization never lowers the dictionary below the minimum

#![no_main]

use libfuzzer_sys::fuzz_target;
use lzclassic::{HEADER_LEN, MIN_DICT_CAP, decode_header, encode_header, read_params};

fuzz_target!(|data: &[u8]| {
    let Some(bytes) = data.get(..HEADER_LEN) else {
        let _ = read_params(&mut &data[..]);
        return;
    };
    let mut buf = [0u8; HEADER_LEN];
    buf.copy_from_slice(bytes);

    if let Ok(params) = decode_header(&buf) {
        let encoded = encode_header(&params).expect("decoded header must re-encode");
        assert_eq!(encoded, buf, "header round trip changed bytes");

        let mut normalized = params.clone();
        normalized.normalize_for_decoding();
        assert!(normalized.dict_cap >= MIN_DICT_CAP);
        if normalized.size < 0 {
            assert!(normalized.eos_marker);
        }
    }
});
