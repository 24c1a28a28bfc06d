//! Huffman strategy — prefix codes over distinct BigInt values
//!
//! The tree is built in an index arena by repeatedly merging the two
//! lowest-frequency nodes, ties broken by first-seen order. Only code
//! lengths go on the wire; both sides assign canonical codes from the
//! lengths (sorted by length, then symbol-table position), so the symbol
//! table fully determines the codebook.
//!
//! Payload after the tag byte:
//! `[n_values u32][n_symbols u32]` then per symbol `[bigint][code_len u16]`,
//! then `[pad_bits u8][bit-packed code stream]`.

use super::wire::{self, Reader};
use super::CompressionMethod;
use num_bigint::BigInt;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::HashMap;

struct Node {
    symbol: Option<usize>,
    children: Option<(usize, usize)>,
}

pub(crate) fn compress(values: &[BigInt]) -> Vec<u8> {
    let mut out = vec![CompressionMethod::Huffman as u8];

    // Frequency table in first-seen order.
    let mut index: HashMap<&BigInt, usize> = HashMap::new();
    let mut symbols: Vec<(&BigInt, u64)> = Vec::new();
    for value in values {
        match index.get(value) {
            Some(&i) => symbols[i].1 += 1,
            None => {
                index.insert(value, symbols.len());
                symbols.push((value, 1));
            }
        }
    }

    let lengths = code_lengths(&symbols);
    let codes = canonical_codes(&lengths);

    wire::put_u32(&mut out, values.len() as u32);
    wire::put_u32(&mut out, symbols.len() as u32);
    for (&(value, _), len) in symbols.iter().zip(&lengths) {
        wire::put_bigint(&mut out, value);
        wire::put_u16(&mut out, *len);
    }

    let mut bits: Vec<u8> = Vec::new();
    for value in values {
        bits.extend_from_slice(&codes[index[value]]);
    }
    let pad = (8 - bits.len() % 8) % 8;
    out.push(pad as u8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, bit) in chunk.iter().enumerate() {
            byte |= bit << (7 - i);
        }
        out.push(byte);
    }
    out
}

pub(crate) fn decompress(r: &mut Reader) -> Option<Vec<BigInt>> {
    let n_values = r.u32()? as usize;
    let n_symbols = r.u32()? as usize;
    if n_values > 0 && n_symbols == 0 {
        return None;
    }

    let mut symbols = Vec::new();
    let mut lengths = Vec::new();
    for _ in 0..n_symbols {
        symbols.push(r.bigint()?);
        let len = r.u16()?;
        if len == 0 {
            return None;
        }
        lengths.push(len);
    }

    let pad = r.u8()? as usize;
    let stream = r.rest();
    if pad > 7 || (stream.is_empty() && pad > 0) {
        return None;
    }
    let total_bits = stream.len() * 8 - pad;

    let codes = canonical_codes(&lengths);
    let trie = DecodeTrie::build(&codes)?;

    let mut out = Vec::new();
    let mut node = 0usize;
    let mut consumed = 0usize;
    while out.len() < n_values {
        if consumed >= total_bits {
            return None;
        }
        let bit = (stream[consumed / 8] >> (7 - consumed % 8)) & 1;
        consumed += 1;
        node = trie.step(node, bit)?;
        if let Some(symbol) = trie.symbol(node) {
            out.push(symbols[symbol].clone());
            node = 0;
        }
    }
    // A well-formed stream carries no trailing code bits.
    if consumed != total_bits {
        return None;
    }
    Some(out)
}

/// Code length per symbol, in symbol-table order. A lone symbol still
/// receives a 1-bit code so the stream length stays proportional to the
/// value count.
fn code_lengths(symbols: &[(&BigInt, u64)]) -> Vec<u16> {
    if symbols.is_empty() {
        return Vec::new();
    }
    if symbols.len() == 1 {
        return vec![1];
    }

    // Heap ordered by (frequency, insertion order); the counter breaks
    // frequency ties in first-seen order and keeps merges deterministic.
    let mut arena: Vec<Node> = Vec::with_capacity(symbols.len() * 2 - 1);
    let mut heap: BinaryHeap<Reverse<(u64, u64, usize)>> = BinaryHeap::new();
    let mut order = 0u64;
    for (i, (_, freq)) in symbols.iter().enumerate() {
        arena.push(Node {
            symbol: Some(i),
            children: None,
        });
        heap.push(Reverse((*freq, order, i)));
        order += 1;
    }
    while heap.len() > 1 {
        let Reverse((f1, _, left)) = heap.pop().unwrap();
        let Reverse((f2, _, right)) = heap.pop().unwrap();
        let idx = arena.len();
        arena.push(Node {
            symbol: None,
            children: Some((left, right)),
        });
        heap.push(Reverse((f1 + f2, order, idx)));
        order += 1;
    }
    let root = heap.pop().unwrap().0 .2;

    let mut lengths = vec![0u16; symbols.len()];
    let mut stack = vec![(root, 0u16)];
    while let Some((idx, depth)) = stack.pop() {
        let node = &arena[idx];
        if let Some(symbol) = node.symbol {
            lengths[symbol] = depth.max(1);
        }
        if let Some((left, right)) = node.children {
            stack.push((left, depth + 1));
            stack.push((right, depth + 1));
        }
    }
    lengths
}

/// Canonical code assignment: symbols sorted by (length, table index),
/// codes counted up in binary and widened with zeros as lengths grow.
/// Codes are bit vectors (one 0/1 per element) so depth is unbounded.
fn canonical_codes(lengths: &[u16]) -> Vec<Vec<u8>> {
    let mut order: Vec<usize> = (0..lengths.len()).collect();
    order.sort_by_key(|&i| (lengths[i], i));

    let mut codes = vec![Vec::new(); lengths.len()];
    let mut current: Vec<u8> = Vec::new();
    for &i in &order {
        if current.is_empty() {
            current = vec![0; lengths[i] as usize];
        } else {
            increment_bits(&mut current);
            current.resize(lengths[i] as usize, 0);
        }
        codes[i] = current.clone();
    }
    codes
}

fn increment_bits(bits: &mut [u8]) {
    for bit in bits.iter_mut().rev() {
        if *bit == 0 {
            *bit = 1;
            return;
        }
        *bit = 0;
    }
}

/// Flat binary trie rebuilt from canonical codes on the decode side.
struct DecodeTrie {
    // (left, right, symbol); usize::MAX marks an absent branch.
    nodes: Vec<(usize, usize, Option<usize>)>,
}

impl DecodeTrie {
    const NONE: usize = usize::MAX;

    fn build(codes: &[Vec<u8>]) -> Option<Self> {
        let mut trie = DecodeTrie {
            nodes: vec![(Self::NONE, Self::NONE, None)],
        };
        for (symbol, code) in codes.iter().enumerate() {
            let mut node = 0usize;
            for &bit in code {
                // A prefix collision means the length table was corrupt.
                if trie.nodes[node].2.is_some() {
                    return None;
                }
                let next = if bit == 0 {
                    trie.nodes[node].0
                } else {
                    trie.nodes[node].1
                };
                node = if next == Self::NONE {
                    trie.nodes.push((Self::NONE, Self::NONE, None));
                    let idx = trie.nodes.len() - 1;
                    if bit == 0 {
                        trie.nodes[node].0 = idx;
                    } else {
                        trie.nodes[node].1 = idx;
                    }
                    idx
                } else {
                    next
                };
            }
            if trie.nodes[node].2.is_some()
                || trie.nodes[node].0 != Self::NONE
                || trie.nodes[node].1 != Self::NONE
            {
                return None;
            }
            trie.nodes[node].2 = Some(symbol);
        }
        Some(trie)
    }

    fn step(&self, node: usize, bit: u8) -> Option<usize> {
        let next = if bit == 0 {
            self.nodes[node].0
        } else {
            self.nodes[node].1
        };
        (next != Self::NONE).then_some(next)
    }

    fn symbol(&self, node: usize) -> Option<usize> {
        self.nodes[node].2
    }
}
