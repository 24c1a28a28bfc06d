//! Vector Compression Engine
//!
//! Packs sequences of arbitrary-precision integers into self-describing
//! byte buffers. Every buffer starts with a one-byte method tag and
//! `decompress` dispatches purely on that tag — the engine's configured
//! method only affects future `compress` calls, never decoding.

pub mod huffman;
pub mod strategies;
pub mod wire;

use crate::vector::{LayeredMatrix, Vector};
use log::debug;
use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use wire::Reader;

/// Fixed-point scale used to carry f64 matrix entries through the
/// integer engine. Values are multiplied by this, rounded, and divided
/// back on decode, so anything representable at 1e-6 resolution
/// round-trips exactly. Non-finite entries quantize to zero.
pub const FIXED_POINT_SCALE: f64 = 1_000_000.0;

/// Upper bound on the number of values one decode may materialize.
/// Counts on the wire are untrusted, so a handful of bytes must not be
/// able to demand gigabytes of output.
pub(crate) const MAX_DECODED_VALUES: usize = 1 << 24;

/// The five interchangeable packing strategies. Discriminant values are
/// the on-wire tag bytes and are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompressionMethod {
    Huffman = 0,
    Rle = 1,
    Delta = 2,
    Dictionary = 3,
    Hybrid = 4,
}

impl CompressionMethod {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Huffman),
            1 => Some(Self::Rle),
            2 => Some(Self::Delta),
            3 => Some(Self::Dictionary),
            4 => Some(Self::Hybrid),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Huffman => "huffman",
            Self::Rle => "rle",
            Self::Delta => "delta",
            Self::Dictionary => "dictionary",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Compression engine. Holds the method applied by `compress`; decoding
/// is stateless.
#[derive(Debug, Clone)]
pub struct VectorCompression {
    method: CompressionMethod,
}

impl Default for VectorCompression {
    fn default() -> Self {
        Self::new(CompressionMethod::Huffman)
    }
}

impl VectorCompression {
    pub fn new(method: CompressionMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    pub fn set_method(&mut self, method: CompressionMethod) {
        self.method = method;
    }

    pub fn compress(&self, vec: &Vector) -> Vec<u8> {
        self.compress_bigints(vec.data())
    }

    pub fn decompress(&self, data: &[u8]) -> Option<Vector> {
        self.decompress_bigints(data).map(Vector::new)
    }

    pub fn compress_bigints(&self, values: &[BigInt]) -> Vec<u8> {
        match self.method {
            CompressionMethod::Huffman => huffman::compress(values),
            CompressionMethod::Rle => strategies::compress_rle(values),
            CompressionMethod::Delta => strategies::compress_delta(values),
            CompressionMethod::Dictionary => strategies::compress_dictionary(values),
            CompressionMethod::Hybrid => strategies::compress_hybrid(values),
        }
    }

    pub fn decompress_bigints(&self, data: &[u8]) -> Option<Vec<BigInt>> {
        decode_tagged(data, true)
    }

    /// Serialize a LayeredMatrix as one compressed vector, shape-prefixed
    /// so decoding can reshape:
    /// `[num_layers u32][row_dim u32][col_dim u32][tagged buffer]`.
    /// Entries are flattened block-row, block-col, then intra-block
    /// row-major, and quantized through [`FIXED_POINT_SCALE`].
    pub fn compress_matrix(&self, matrix: &LayeredMatrix) -> Vec<u8> {
        let n = matrix.num_layers();
        let rows = matrix.row_dimension();
        let cols = matrix.col_dimension();

        let mut flat = Vec::with_capacity(n * n * rows * cols);
        for i in 0..n {
            for j in 0..n {
                // Grid indices are in range by construction.
                let block = matrix.block(i, j).expect("validated grid index");
                for r in 0..rows {
                    for c in 0..cols {
                        flat.push(quantize(block[(r, c)]));
                    }
                }
            }
        }

        let mut out = Vec::new();
        wire::put_u32(&mut out, n as u32);
        wire::put_u32(&mut out, rows as u32);
        wire::put_u32(&mut out, cols as u32);
        out.extend_from_slice(&self.compress_bigints(&flat));
        out
    }

    pub fn decompress_matrix(&self, data: &[u8]) -> Option<LayeredMatrix> {
        let mut r = Reader::new(data);
        let n = r.u32()? as usize;
        let rows = r.u32()? as usize;
        let cols = r.u32()? as usize;

        let expected = n
            .checked_mul(n)?
            .checked_mul(rows)?
            .checked_mul(cols)?;
        // A zero entry count describes only the empty matrix. A header
        // claiming layers or block dimensions with no entries to back
        // them would leave `n` unbounded.
        if expected == 0 && (n != 0 || rows != 0 || cols != 0) {
            return None;
        }
        let flat = decode_tagged(r.rest(), true)?;
        if flat.len() != expected {
            return None;
        }

        let mut blocks = Vec::with_capacity(n);
        for i in 0..n {
            let mut row = Vec::with_capacity(n);
            for j in 0..n {
                let base = (i * n + j) * rows * cols;
                row.push(DMatrix::from_fn(rows, cols, |r, c| {
                    dequantize(&flat[base + r * cols + c])
                }));
            }
            blocks.push(row);
        }
        LayeredMatrix::from_blocks(blocks).ok()
    }

    /// Uncompressed byte estimate divided by compressed length.
    /// Diagnostic only; does not affect correctness.
    pub fn compression_ratio(&self, vec: &Vector) -> f64 {
        let uncompressed = 4 + vec.data().iter().map(wire::bigint_wire_len).sum::<usize>();
        let compressed = self.compress(vec).len();
        if compressed == 0 {
            return 0.0;
        }
        let ratio = uncompressed as f64 / compressed as f64;
        debug!(
            "{} ratio for {}-element vector: {:.3} ({} -> {} bytes)",
            self.method.name(),
            vec.dimension(),
            ratio,
            uncompressed,
            compressed
        );
        ratio
    }
}

/// Tag-dispatched decode. Hybrid buffers wrap one more tagged buffer;
/// the recursion is depth one only, so a hybrid inside a hybrid is
/// malformed input.
fn decode_tagged(data: &[u8], allow_hybrid: bool) -> Option<Vec<BigInt>> {
    let (&tag, payload) = data.split_first()?;
    let mut r = Reader::new(payload);
    match CompressionMethod::from_tag(tag)? {
        CompressionMethod::Huffman => huffman::decompress(&mut r),
        CompressionMethod::Rle => strategies::decompress_rle(&mut r),
        CompressionMethod::Delta => strategies::decompress_delta(&mut r),
        CompressionMethod::Dictionary => strategies::decompress_dictionary(&mut r),
        CompressionMethod::Hybrid => {
            if !allow_hybrid {
                return None;
            }
            decode_tagged(payload, false)
        }
    }
}

fn quantize(value: f64) -> BigInt {
    if !value.is_finite() {
        return BigInt::from(0);
    }
    BigInt::from_f64((value * FIXED_POINT_SCALE).round()).unwrap_or_default()
}

fn dequantize(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(0.0) / FIXED_POINT_SCALE
}
