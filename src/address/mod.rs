//! Tagged, checksummed network addresses
//!
//! An address payload is `[header][format-specific fields][checksum]`,
//! where the header byte packs the address type in its high nibble and
//! the format in its low nibble, and the checksum trailer is a SHA-256
//! prefix over everything before it (4 bytes, or 2 for the compressed
//! format). Addresses are immutable value objects: parsing happens once
//! at construction, malformed bytes parse to a default invalid address,
//! and `verify()` is the authoritative validity check.

pub mod generator;

pub use generator::{AddressError, AddressGenerator};

use crate::geo::{Coordinates, Geohash};
use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Base58 alphabet (Bitcoin style, no 0/O/I/l).
const BASE58: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddressType {
    User = 0,
    Node = 1,
    Resource = 2,
    Service = 3,
}

impl AddressType {
    fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0 => Some(Self::User),
            1 => Some(Self::Node),
            2 => Some(Self::Resource),
            3 => Some(Self::Service),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddressFormat {
    Standard = 0,
    Geohashed = 1,
    QuantumProof = 2,
    Compressed = 3,
}

impl AddressFormat {
    fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0 => Some(Self::Standard),
            1 => Some(Self::Geohashed),
            2 => Some(Self::QuantumProof),
            3 => Some(Self::Compressed),
            _ => None,
        }
    }

    /// Checksum trailer length for this format.
    pub(crate) fn checksum_len(&self) -> usize {
        match self {
            Self::Compressed => 2,
            _ => 4,
        }
    }
}

/// Immutable address value. Two addresses are equal iff their raw byte
/// payloads are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    data: Vec<u8>,
    address_type: AddressType,
    format: AddressFormat,
    geohash: Option<String>,
    coordinates: Option<Coordinates>,
    commitment: Option<Vec<u8>>,
}

impl Address {
    /// Parse raw payload bytes. Never fails: malformed input yields an
    /// address with default metadata that `verify()` rejects.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mut address = Self {
            data,
            address_type: AddressType::User,
            format: AddressFormat::Standard,
            geohash: None,
            coordinates: None,
            commitment: None,
        };
        address.parse_data();
        address
    }

    /// Parse the base58 string form produced by `to_string`.
    pub fn from_string(s: &str) -> Self {
        Self::from_bytes(base58_decode(s).unwrap_or_default())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn address_type(&self) -> AddressType {
        self.address_type
    }

    pub fn format(&self) -> AddressFormat {
        self.format
    }

    pub fn geohash(&self) -> Option<&str> {
        self.geohash.as_deref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Quantum-state commitment bytes, for quantum-proof addresses.
    pub fn commitment(&self) -> Option<&[u8]> {
        self.commitment.as_deref()
    }

    /// Recompute the checksum trailer and compare. Tampering or
    /// structural damage returns false; this never errors.
    pub fn verify(&self) -> bool {
        let header = match self.data.first() {
            Some(&h) => h,
            None => return false,
        };
        let format = match AddressFormat::from_nibble(header & 0x0F) {
            Some(f) => f,
            None => return false,
        };
        if AddressType::from_nibble(header >> 4).is_none() {
            return false;
        }
        let checksum_len = format.checksum_len();
        if self.data.len() <= checksum_len {
            return false;
        }
        let (body, trailer) = self.data.split_at(self.data.len() - checksum_len);
        let expected = Sha256::digest(body);
        if trailer != &expected[..checksum_len] {
            return false;
        }
        // A geohashed address must carry a well-formed geohash.
        if format == AddressFormat::Geohashed {
            match &self.geohash {
                Some(gh) => Geohash::default().is_valid(gh),
                None => false,
            }
        } else {
            true
        }
    }

    fn parse_data(&mut self) {
        let header = match self.data.first() {
            Some(&h) => h,
            None => return,
        };
        let address_type = AddressType::from_nibble(header >> 4);
        let format = AddressFormat::from_nibble(header & 0x0F);
        let (address_type, format) = match (address_type, format) {
            (Some(t), Some(f)) => (t, f),
            _ => return,
        };
        self.address_type = address_type;
        self.format = format;

        match format {
            AddressFormat::Geohashed => {
                if let Some(field) = read_length_prefixed(&self.data[1..]) {
                    if let Ok(geohash) = std::str::from_utf8(field) {
                        let decoder = Geohash::default();
                        self.coordinates = decoder.decode(geohash);
                        self.geohash = Some(geohash.to_string());
                    }
                }
            }
            AddressFormat::QuantumProof => {
                self.commitment = read_length_prefixed(&self.data[1..]).map(<[u8]>::to_vec);
            }
            AddressFormat::Standard | AddressFormat::Compressed => {}
        }
    }
}

/// `[len u8][field]` reader used by the geohash and commitment fields.
fn read_length_prefixed(data: &[u8]) -> Option<&[u8]> {
    let (&len, rest) = data.split_first()?;
    rest.get(..len as usize)
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Address {}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58_encode(&self.data))
    }
}

/// Base58 via BigInt radix conversion; leading zero bytes become
/// leading '1' characters so the encoding is length-preserving.
pub(crate) fn base58_encode(data: &[u8]) -> String {
    let mut value = BigInt::from_bytes_be(Sign::Plus, data);
    let mut out = Vec::new();
    while !value.is_zero() {
        let digit = (&value % 58u32).to_usize().unwrap_or(0);
        out.push(BASE58[digit]);
        value /= 58u32;
    }
    for byte in data {
        if *byte != 0 {
            break;
        }
        out.push(b'1');
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

pub(crate) fn base58_decode(s: &str) -> Option<Vec<u8>> {
    let mut value = BigInt::from(0u32);
    for ch in s.bytes() {
        let digit = BASE58.iter().position(|&c| c == ch)?;
        value = value * 58u32 + digit as u32;
    }
    let mut out = value.to_bytes_be().1;
    if out == [0] {
        out.clear();
    }
    let leading_ones = s.bytes().take_while(|&c| c == b'1').count();
    let mut result = vec![0u8; leading_ones];
    result.append(&mut out);
    Some(result)
}
