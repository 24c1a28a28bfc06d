//! RLE, Delta, Dictionary and Hybrid strategies
//!
//! Each `compress_*` emits a fully tagged buffer; each `decompress_*`
//! consumes the payload after the tag. Hybrid runs the other four and
//! keeps the smallest tagged buffer, so its own tag just means
//! "recursively tagged" and decode recurses exactly once.

use super::huffman;
use super::wire::{self, Reader};
use super::{CompressionMethod, MAX_DECODED_VALUES};
use num_bigint::BigInt;
use std::collections::HashMap;

// RLE: [tag][n_runs u32] then [value][run_len u32] per maximal run.
// A run of length 1 is still emitted explicitly.
pub(crate) fn compress_rle(values: &[BigInt]) -> Vec<u8> {
    let mut runs: Vec<(&BigInt, u32)> = Vec::new();
    for value in values {
        match runs.last_mut() {
            Some((current, len)) if *current == value && *len < u32::MAX => *len += 1,
            _ => runs.push((value, 1)),
        }
    }

    let mut out = vec![CompressionMethod::Rle as u8];
    wire::put_u32(&mut out, runs.len() as u32);
    for (value, len) in runs {
        wire::put_bigint(&mut out, value);
        wire::put_u32(&mut out, len);
    }
    out
}

pub(crate) fn decompress_rle(r: &mut Reader) -> Option<Vec<BigInt>> {
    let n_runs = r.u32()?;
    let mut out = Vec::new();
    for _ in 0..n_runs {
        let value = r.bigint()?;
        let len = r.u32()? as usize;
        // Run lengths are untrusted; cap the total expansion so a short
        // buffer cannot demand an enormous output vector.
        if len == 0 || out.len() + len > MAX_DECODED_VALUES {
            return None;
        }
        for _ in 0..len {
            out.push(value.clone());
        }
    }
    (r.remaining() == 0).then_some(out)
}

// DELTA: [tag][n_values u32][first value][signed differences...].
// Differences use exact BigInt subtraction, so magnitudes are unbounded.
pub(crate) fn compress_delta(values: &[BigInt]) -> Vec<u8> {
    let mut out = vec![CompressionMethod::Delta as u8];
    wire::put_u32(&mut out, values.len() as u32);
    for (i, value) in values.iter().enumerate() {
        if i == 0 {
            wire::put_bigint(&mut out, value);
        } else {
            wire::put_bigint(&mut out, &(value - &values[i - 1]));
        }
    }
    out
}

pub(crate) fn decompress_delta(r: &mut Reader) -> Option<Vec<BigInt>> {
    let n_values = r.u32()?;
    let mut out: Vec<BigInt> = Vec::new();
    for i in 0..n_values {
        let raw = r.bigint()?;
        if i == 0 {
            out.push(raw);
        } else {
            let prev = out.last().cloned()?;
            out.push(prev + raw);
        }
    }
    (r.remaining() == 0).then_some(out)
}

// DICTIONARY: [tag][n_dict u32][distinct values in first-seen order]
// [n_values u32][u32 index per value].
pub(crate) fn compress_dictionary(values: &[BigInt]) -> Vec<u8> {
    let mut index: HashMap<&BigInt, u32> = HashMap::new();
    let mut dict: Vec<&BigInt> = Vec::new();
    let mut indices: Vec<u32> = Vec::with_capacity(values.len());
    for value in values {
        let i = *index.entry(value).or_insert_with(|| {
            dict.push(value);
            (dict.len() - 1) as u32
        });
        indices.push(i);
    }

    let mut out = vec![CompressionMethod::Dictionary as u8];
    wire::put_u32(&mut out, dict.len() as u32);
    for value in dict {
        wire::put_bigint(&mut out, value);
    }
    wire::put_u32(&mut out, indices.len() as u32);
    for i in indices {
        wire::put_u32(&mut out, i);
    }
    out
}

pub(crate) fn decompress_dictionary(r: &mut Reader) -> Option<Vec<BigInt>> {
    let n_dict = r.u32()?;
    let mut dict = Vec::new();
    for _ in 0..n_dict {
        dict.push(r.bigint()?);
    }
    let n_values = r.u32()?;
    let mut out = Vec::new();
    for _ in 0..n_values {
        let i = r.u32()? as usize;
        out.push(dict.get(i)?.clone());
    }
    (r.remaining() == 0).then_some(out)
}

// HYBRID: try the four concrete strategies, keep the smallest output.
pub(crate) fn compress_hybrid(values: &[BigInt]) -> Vec<u8> {
    let candidates = [
        huffman::compress(values),
        compress_rle(values),
        compress_delta(values),
        compress_dictionary(values),
    ];
    let best = candidates
        .into_iter()
        .min_by_key(|buf| buf.len())
        .unwrap_or_default();

    let mut out = vec![CompressionMethod::Hybrid as u8];
    out.extend_from_slice(&best);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|&v| BigInt::from(v)).collect()
    }

    #[test]
    fn test_rle_round_trip() {
        let values = big(&[5, 5, 5, 3, 3, 9]);
        let buf = compress_rle(&values);
        let mut r = Reader::new(&buf[1..]);
        assert_eq!(decompress_rle(&mut r).unwrap(), values);
    }

    #[test]
    fn test_rle_counts_maximal_runs() {
        let buf = compress_rle(&big(&[5, 5, 5, 3, 3, 9]));
        let mut r = Reader::new(&buf[1..]);
        assert_eq!(r.u32().unwrap(), 3);
    }

    #[test]
    fn test_rle_rejects_oversized_run() {
        // One 10-byte run entry asking for u32::MAX copies.
        let mut buf = vec![];
        wire::put_u32(&mut buf, 1);
        wire::put_bigint(&mut buf, &BigInt::from(4));
        wire::put_u32(&mut buf, u32::MAX);
        let mut r = Reader::new(&buf);
        assert!(decompress_rle(&mut r).is_none());
    }

    #[test]
    fn test_delta_round_trip_with_negatives() {
        let values = big(&[100, 7, -50, -50, 2000]);
        let buf = compress_delta(&values);
        let mut r = Reader::new(&buf[1..]);
        assert_eq!(decompress_delta(&mut r).unwrap(), values);
    }

    #[test]
    fn test_dictionary_round_trip() {
        let values = big(&[9, 1, 9, 1, 9, 42]);
        let buf = compress_dictionary(&values);
        let mut r = Reader::new(&buf[1..]);
        assert_eq!(decompress_dictionary(&mut r).unwrap(), values);
    }

    #[test]
    fn test_dictionary_rejects_bad_index() {
        let mut buf = vec![];
        wire::put_u32(&mut buf, 1);
        wire::put_bigint(&mut buf, &BigInt::from(7));
        wire::put_u32(&mut buf, 1);
        wire::put_u32(&mut buf, 5); // index beyond dictionary
        let mut r = Reader::new(&buf);
        assert!(decompress_dictionary(&mut r).is_none());
    }

    #[test]
    fn test_hybrid_not_larger_than_candidates() {
        let values = big(&[1, 1, 1, 1, 1, 1, 2, 2, 2, 3]);
        let hybrid = compress_hybrid(&values);
        let sizes = [
            huffman::compress(&values).len(),
            compress_rle(&values).len(),
            compress_delta(&values).len(),
            compress_dictionary(&values).len(),
        ];
        // One extra byte for the hybrid tag itself.
        assert_eq!(hybrid.len() - 1, *sizes.iter().min().unwrap());
    }

    #[test]
    fn test_empty_inputs() {
        for (compress, decompress) in [
            (
                compress_rle as fn(&[BigInt]) -> Vec<u8>,
                decompress_rle as fn(&mut Reader) -> Option<Vec<BigInt>>,
            ),
            (compress_delta, decompress_delta),
            (compress_dictionary, decompress_dictionary),
        ] {
            let buf = compress(&[]);
            let mut r = Reader::new(&buf[1..]);
            assert_eq!(decompress(&mut r).unwrap(), vec![]);
        }
    }
}
