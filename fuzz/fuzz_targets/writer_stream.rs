//! Fuzz target for the streaming writer.
//!
//! The first bytes pick the properties and declared size; the rest is split
//! into chunks and written. Checks that the byte budget is never exceeded
//! and that a successful close always leaves a well-formed header.
//!
//! Run with: cargo +nightly fuzz run writer_stream

#![no_main]

use libfuzzer_sys::fuzz_target;
use lzclassic::{Error, Parameters, Properties, Writer, read_header};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let Ok(properties) = Properties::from_code(data[0] % 225) else {
        return;
    };
    let size = if data[1] & 0x80 != 0 {
        -1
    } else {
        i64::from(data[1])
    };
    let chunk = usize::from(data[2]).max(1);
    let payload = &data[3..];

    let params = Parameters::default()
        .with_properties(properties)
        .with_dict_cap(1 << 12)
        .with_size(size);
    let mut writer = Writer::unbuffered(Vec::new(), params);

    for piece in payload.chunks(chunk) {
        match writer.try_write(piece) {
            Ok(n) => assert_eq!(n, piece.len()),
            Err(Error::NoSpace { accepted }) => assert!(accepted < piece.len()),
            Err(e) => panic!("unexpected error: {e}"),
        }
        if size >= 0 {
            assert!(writer.processed() <= size as u64);
        }
    }

    if writer.close().is_ok() {
        let out = writer.into_inner().expect("sink available after close");
        let header = read_header(&mut out.as_slice()).expect("valid header");
        assert_eq!(header.size, size);
    }
});
