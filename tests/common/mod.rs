//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{self, Read};

use lzclassic::{HEADER_LEN, Parameters, Writer};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Pseudo-random bytes, reproducible from `seed`.
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

/// English-like text with plenty of repeated words.
pub fn text_bytes(len: usize) -> Vec<u8> {
    const WORDS: &[&str] = &[
        "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "stream", "range",
        "coder", "window", "literal", "match", "distance",
    ];
    let mut out = Vec::with_capacity(len + 16);
    let mut i = 0usize;
    while out.len() < len {
        out.extend_from_slice(WORDS[(i * 7 + i / 3) % WORDS.len()].as_bytes());
        out.push(if i % 11 == 10 { b'\n' } else { b' ' });
        i += 1;
    }
    out.truncate(len);
    out
}

/// Data mixing long runs, short periods and noise.
pub fn mixed_bytes(len: usize, seed: u64) -> Vec<u8> {
    let noise = random_bytes(len, seed);
    (0..len)
        .map(|i| match (i / 1000) % 3 {
            0 => b'A' + (i % 3) as u8,
            1 => noise[i],
            _ => (i / 64) as u8,
        })
        .collect()
}

/// Compresses `data` in one call and closes the writer.
pub fn compress(params: Parameters, data: &[u8]) -> lzclassic::Result<Vec<u8>> {
    let mut writer = Writer::with_params(Vec::new(), params);
    writer.try_write(data)?;
    writer.finish()
}

/// Compresses `data` in chunks of `chunk` bytes.
pub fn compress_chunked(
    params: Parameters,
    data: &[u8],
    chunk: usize,
) -> lzclassic::Result<Vec<u8>> {
    let mut writer = Writer::with_params(Vec::new(), params);
    for piece in data.chunks(chunk) {
        writer.try_write(piece)?;
    }
    writer.finish()
}

/// Decodes a complete `.lzma` stream with lzma-rust2.
pub fn decompress(stream: &[u8]) -> io::Result<Vec<u8>> {
    if stream.len() < HEADER_LEN {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream shorter than header",
        ));
    }
    let props_byte = stream[0];
    let dict_size = u32::from_le_bytes(stream[1..5].try_into().unwrap());
    let size = u64::from_le_bytes(stream[5..13].try_into().unwrap());

    let mut reader = lzma_rust2::LzmaReader::new_with_props(
        &stream[HEADER_LEN..],
        size,
        props_byte,
        dict_size,
        None,
    )
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

/// Parameters for a stream with a known size and no end marker.
pub fn sized_params(len: usize) -> Parameters {
    Parameters::default()
        .with_dict_cap(1 << 16)
        .with_size(len as i64)
        .with_eos_marker(false)
}

/// Parameters for a stream of unknown size.
pub fn unsized_params() -> Parameters {
    Parameters::default().with_dict_cap(1 << 16)
}
