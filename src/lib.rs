//! LVSF — Layered Vector Storage Fabric, addressing & compaction core
//!
//! Turns arbitrary-precision numeric vectors and public-key material
//! into compact byte encodings and canonical, verifiable network
//! addresses, some embedding geolocation or quantum-state commitments.

pub mod address;
pub mod compression;
pub mod geo;
pub mod parallel;
pub mod vector;

pub use address::{Address, AddressError, AddressFormat, AddressGenerator, AddressType};
pub use compression::{CompressionMethod, VectorCompression};
pub use geo::{BoundingBox, Coordinates, GeoError, Geohash, GeohashPrecision};
pub use parallel::{ThreadSafeAddressGenerator, ThreadSafeVectorCompression};
pub use vector::{LayeredMatrix, LayeredVector, Vector, VectorError};
