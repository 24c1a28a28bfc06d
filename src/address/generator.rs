//! AddressGenerator — derives addresses from public-key material
//!
//! The core digest is SHA-512 truncated to the configured security
//! level (128/192/256 bits). Generation is stateless per call; the only
//! mutable state is `security_level`, which the thread-safe facade
//! guards with its write lock.

use super::{Address, AddressFormat, AddressType};
use crate::compression::{CompressionMethod, VectorCompression};
use crate::geo::{Coordinates, GeoError, Geohash, GeohashPrecision};
use log::debug;
use num_bigint::BigInt;
use num_complex::Complex;
use sha2::{Digest, Sha256, Sha512};

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("quantum state is empty or has zero norm")]
    InvalidQuantumState,
}

pub struct AddressGenerator {
    security_level: usize,
}

impl Default for AddressGenerator {
    fn default() -> Self {
        Self::new(128)
    }
}

impl AddressGenerator {
    /// Create a generator at the given bit strength. Levels follow the
    /// usual tiers: <=128 -> 128, <=192 -> 192, otherwise 256.
    pub fn new(security_level: usize) -> Self {
        Self {
            security_level: clamp_security_level(security_level),
        }
    }

    pub fn security_level(&self) -> usize {
        self.security_level
    }

    pub fn set_security_level(&mut self, security_level: usize) {
        self.security_level = clamp_security_level(security_level);
    }

    /// Derive an address in any of the four formats. The geohashed and
    /// quantum formats need extra inputs; through this entry point they
    /// fall back to the origin coordinates and the trivial one-amplitude
    /// state, so every (type, format) pair yields a verifiable address.
    pub fn generate_from_public_key(
        &self,
        public_key: &[u8],
        address_type: AddressType,
        format: AddressFormat,
    ) -> Address {
        match format {
            AddressFormat::Standard => self.generate_standard(public_key, address_type),
            AddressFormat::Compressed => self.generate_compressed_address(public_key, address_type),
            AddressFormat::Geohashed => self
                .generate_geo_address(public_key, &Coordinates::new(0.0, 0.0, 0.0), address_type)
                .expect("origin coordinates are always valid"),
            AddressFormat::QuantumProof => self
                .generate_quantum_address(public_key, &[Complex::new(1.0, 0.0)], address_type)
                .expect("unit state is always valid"),
        }
    }

    fn generate_standard(&self, public_key: &[u8], address_type: AddressType) -> Address {
        let mut data = vec![header_byte(address_type, AddressFormat::Standard)];
        data.extend_from_slice(&self.key_digest(public_key));
        finish(data, AddressFormat::Standard)
    }

    /// Geohashed address: the coordinates are folded in as a
    /// length-prefixed precision-9 geohash right after the header.
    pub fn generate_geo_address(
        &self,
        public_key: &[u8],
        coordinates: &Coordinates,
        address_type: AddressType,
    ) -> Result<Address, AddressError> {
        let geohash =
            Geohash::new(GeohashPrecision::default()).encode(coordinates.latitude, coordinates.longitude)?;

        let mut data = vec![header_byte(address_type, AddressFormat::Geohashed)];
        data.push(geohash.len() as u8);
        data.extend_from_slice(geohash.as_bytes());
        data.extend_from_slice(&self.key_digest(public_key));
        debug!("geo address at {} for {}-byte key", geohash, public_key.len());
        Ok(finish(data, AddressFormat::Geohashed))
    }

    /// Quantum-proof address: the payload carries a commitment to the
    /// normalized state (quantized magnitude + phase per amplitude,
    /// hashed) alongside the key digest.
    pub fn generate_quantum_address(
        &self,
        public_key: &[u8],
        quantum_state: &[Complex<f64>],
        address_type: AddressType,
    ) -> Result<Address, AddressError> {
        let commitment = quantum_commitment(quantum_state)?;

        let mut data = vec![header_byte(address_type, AddressFormat::QuantumProof)];
        data.push(commitment.len() as u8);
        data.extend_from_slice(&commitment);
        data.extend_from_slice(&self.key_digest(public_key));
        Ok(finish(data, AddressFormat::QuantumProof))
    }

    /// Compressed address: the key digest runs through the compression
    /// engine (hybrid selection) before the header/checksum wrap, with a
    /// 2-byte checksum instead of 4.
    pub fn generate_compressed_address(
        &self,
        public_key: &[u8],
        address_type: AddressType,
    ) -> Address {
        let digest = self.key_digest(public_key);
        let values: Vec<BigInt> = digest.iter().map(|&b| BigInt::from(b)).collect();
        let compressed = VectorCompression::new(CompressionMethod::Hybrid).compress_bigints(&values);

        let mut data = vec![header_byte(address_type, AddressFormat::Compressed)];
        data.extend_from_slice(&(compressed.len() as u16).to_be_bytes());
        data.extend_from_slice(&compressed);
        finish(data, AddressFormat::Compressed)
    }

    pub fn verify_address(&self, address: &Address) -> bool {
        address.verify()
    }

    /// Fixed-size digest of the key at the configured bit strength.
    pub fn key_digest(&self, public_key: &[u8]) -> Vec<u8> {
        let digest = Sha512::digest(public_key);
        let truncated = digest[..self.security_level / 8].to_vec();
        debug!("key digest {}", hex::encode(&truncated));
        truncated
    }
}

fn clamp_security_level(level: usize) -> usize {
    if level <= 128 {
        128
    } else if level <= 192 {
        192
    } else {
        256
    }
}

fn header_byte(address_type: AddressType, format: AddressFormat) -> u8 {
    (address_type as u8) << 4 | format as u8
}

/// Append the checksum trailer and parse the finished payload.
fn finish(mut data: Vec<u8>, format: AddressFormat) -> Address {
    let checksum = Sha256::digest(&data);
    data.extend_from_slice(&checksum[..format.checksum_len()]);
    Address::from_bytes(data)
}

/// Commit to a quantum state: normalize, quantize each amplitude's
/// magnitude and phase to u16 fixed-point, and hash the lot. The
/// quantization makes the commitment stable across bit-identical
/// states without ever storing the amplitudes themselves.
fn quantum_commitment(state: &[Complex<f64>]) -> Result<Vec<u8>, AddressError> {
    if state.is_empty() {
        return Err(AddressError::InvalidQuantumState);
    }
    let norm = state.iter().map(|amp| amp.norm_sqr()).sum::<f64>().sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(AddressError::InvalidQuantumState);
    }

    let mut hasher = Sha256::new();
    hasher.update((state.len() as u32).to_be_bytes());
    for amp in state {
        let magnitude = (amp.norm() / norm).clamp(0.0, 1.0);
        let phase = amp.arg().rem_euclid(std::f64::consts::TAU);
        let q_mag = (magnitude * f64::from(u16::MAX)).round() as u16;
        let q_phase = ((phase / std::f64::consts::TAU) * f64::from(u16::MAX)).round() as u16;
        hasher.update(q_mag.to_be_bytes());
        hasher.update(q_phase.to_be_bytes());
    }
    Ok(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [AddressType; 4] = [
        AddressType::User,
        AddressType::Node,
        AddressType::Resource,
        AddressType::Service,
    ];
    const ALL_FORMATS: [AddressFormat; 4] = [
        AddressFormat::Standard,
        AddressFormat::Geohashed,
        AddressFormat::QuantumProof,
        AddressFormat::Compressed,
    ];

    #[test]
    fn test_every_type_format_pair_verifies() {
        let generator = AddressGenerator::default();
        let key = b"pk-material-0123456789abcdef";
        for address_type in ALL_TYPES {
            for format in ALL_FORMATS {
                let address = generator.generate_from_public_key(key, address_type, format);
                assert_eq!(address.address_type(), address_type);
                assert_eq!(address.format(), format);
                assert!(generator.verify_address(&address), "{:?}/{:?}", address_type, format);
            }
        }
    }

    #[test]
    fn test_bit_flip_breaks_verification() {
        let generator = AddressGenerator::default();
        let address =
            generator.generate_from_public_key(b"some key", AddressType::Node, AddressFormat::Standard);
        for i in 0..address.data().len() {
            let mut tampered = address.data().to_vec();
            tampered[i] ^= 0x01;
            assert!(!Address::from_bytes(tampered).verify(), "byte {} flip passed", i);
        }
    }

    #[test]
    fn test_geo_address_round_trips_coordinates() {
        let generator = AddressGenerator::default();
        let coords = Coordinates::new(37.8324, 112.5584, 0.0);
        let address = generator
            .generate_geo_address(b"geo key", &coords, AddressType::Resource)
            .unwrap();
        assert!(address.verify());

        let geohash = address.geohash().unwrap();
        assert_eq!(geohash.len(), 9);
        let decoded = address.coordinates().unwrap();
        assert!((decoded.latitude - coords.latitude).abs() < 1e-3);
        assert!((decoded.longitude - coords.longitude).abs() < 1e-3);

        // String form survives a round trip through base58.
        let reparsed = Address::from_string(&address.to_string());
        assert_eq!(reparsed, address);
        assert!(reparsed.verify());
        assert_eq!(reparsed.geohash(), Some(geohash));
    }

    #[test]
    fn test_geo_address_rejects_bad_coordinates() {
        let generator = AddressGenerator::default();
        let result = generator.generate_geo_address(
            b"key",
            &Coordinates::new(95.0, 0.0, 0.0),
            AddressType::User,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_quantum_address_commitment() {
        let generator = AddressGenerator::default();
        let state = [
            Complex::new(0.5, 0.5),
            Complex::new(-0.5, 0.0),
            Complex::new(0.0, 0.5),
        ];
        let address = generator
            .generate_quantum_address(b"qkey", &state, AddressType::Service)
            .unwrap();
        assert!(address.verify());
        assert_eq!(address.commitment().unwrap().len(), 32);

        // Same state, same key: deterministic. A scaled state commits
        // identically because commitment is over the normalized form.
        let again = generator
            .generate_quantum_address(b"qkey", &state, AddressType::Service)
            .unwrap();
        assert_eq!(address, again);
        let scaled: Vec<Complex<f64>> = state.iter().map(|a| a * 2.0).collect();
        let scaled_addr = generator
            .generate_quantum_address(b"qkey", &scaled, AddressType::Service)
            .unwrap();
        assert_eq!(address, scaled_addr);
    }

    #[test]
    fn test_quantum_address_rejects_degenerate_state() {
        let generator = AddressGenerator::default();
        assert!(generator
            .generate_quantum_address(b"k", &[], AddressType::User)
            .is_err());
        assert!(generator
            .generate_quantum_address(b"k", &[Complex::new(0.0, 0.0)], AddressType::User)
            .is_err());
    }

    #[test]
    fn test_security_level_changes_digest_width() {
        let mut generator = AddressGenerator::new(128);
        assert_eq!(generator.key_digest(b"k").len(), 16);
        generator.set_security_level(200);
        assert_eq!(generator.security_level(), 256);
        assert_eq!(generator.key_digest(b"k").len(), 32);
        generator.set_security_level(0);
        assert_eq!(generator.security_level(), 128);
    }

    #[test]
    fn test_compressed_address_is_compact() {
        let generator = AddressGenerator::new(256);
        let address = generator.generate_compressed_address(b"compact", AddressType::Node);
        assert!(address.verify());
        assert!(address.data().len() < 300, "got {}", address.data().len());

        // 2-byte trailer for the compressed format.
        let body_len = address.data().len() - 2;
        let expected = Sha256::digest(&address.data()[..body_len]);
        assert_eq!(&address.data()[body_len..], &expected[..2]);
    }

    #[test]
    fn test_different_keys_different_addresses() {
        let generator = AddressGenerator::default();
        let a = generator.generate_from_public_key(b"key-a", AddressType::User, AddressFormat::Standard);
        let b = generator.generate_from_public_key(b"key-b", AddressType::User, AddressFormat::Standard);
        assert_ne!(a, b);
    }
}
