//! Thread-safe facades and parallel batch operations
//!
//! The engine and generator cores are pure per call except for one
//! mutable configuration field each (`method`, `security_level`). The
//! facades wrap them in a reader-writer lock: operations take the shared
//! lock, configuration changes the exclusive lock, so unlimited
//! concurrent work proceeds while a reconfiguration waits for in-flight
//! calls and blocks new ones until it lands.
//!
//! Batch operations fan out over a bounded rayon pool. A thread count of
//! 0 means "auto" (the detected hardware concurrency), always clamped to
//! the batch size. Results come back in input order, and one element's
//! failure is that element's own result, never the batch's.

use crate::address::{Address, AddressFormat, AddressGenerator, AddressType};
use crate::compression::{CompressionMethod, VectorCompression};
use crate::vector::{LayeredMatrix, Vector};
use log::info;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::RwLock;

/// Resolve a requested thread count against the hardware and batch size.
fn worker_count(requested: usize, batch_size: usize) -> usize {
    let auto = if requested == 0 {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    } else {
        requested
    };
    auto.min(batch_size).max(1)
}

fn build_pool(threads: usize) -> ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("worker pool construction")
}

/// Reader-writer guarded compression engine.
#[derive(Default)]
pub struct ThreadSafeVectorCompression {
    inner: RwLock<VectorCompression>,
}

impl ThreadSafeVectorCompression {
    pub fn new(method: CompressionMethod) -> Self {
        Self {
            inner: RwLock::new(VectorCompression::new(method)),
        }
    }

    pub fn compress(&self, vec: &Vector) -> Vec<u8> {
        self.inner.read().expect("compression lock").compress(vec)
    }

    pub fn decompress(&self, data: &[u8]) -> Option<Vector> {
        self.inner.read().expect("compression lock").decompress(data)
    }

    pub fn method(&self) -> CompressionMethod {
        self.inner.read().expect("compression lock").method()
    }

    pub fn set_method(&self, method: CompressionMethod) {
        self.inner.write().expect("compression lock").set_method(method);
    }

    pub fn compression_ratio(&self, vec: &Vector) -> f64 {
        self.inner.read().expect("compression lock").compression_ratio(vec)
    }

    pub fn compress_matrix(&self, matrix: &LayeredMatrix) -> Vec<u8> {
        self.inner.read().expect("compression lock").compress_matrix(matrix)
    }

    pub fn decompress_matrix(&self, data: &[u8]) -> Option<LayeredMatrix> {
        self.inner.read().expect("compression lock").decompress_matrix(data)
    }

    /// Compress a batch, one unit of work per vector, preserving order.
    pub fn compress_batch(&self, vectors: &[Vector], threads: usize) -> Vec<Vec<u8>> {
        let workers = worker_count(threads, vectors.len());
        info!("compressing {} vectors on {} workers", vectors.len(), workers);
        let engine = self.inner.read().expect("compression lock");
        build_pool(workers).install(|| vectors.par_iter().map(|v| engine.compress(v)).collect())
    }

    /// Decompress a batch. A malformed buffer yields `None` in its slot
    /// without aborting the rest.
    pub fn decompress_batch(&self, buffers: &[Vec<u8>], threads: usize) -> Vec<Option<Vector>> {
        let workers = worker_count(threads, buffers.len());
        let engine = self.inner.read().expect("compression lock");
        build_pool(workers).install(|| buffers.par_iter().map(|b| engine.decompress(b)).collect())
    }
}

/// Reader-writer guarded address generator.
#[derive(Default)]
pub struct ThreadSafeAddressGenerator {
    inner: RwLock<AddressGenerator>,
}

impl ThreadSafeAddressGenerator {
    pub fn new(security_level: usize) -> Self {
        Self {
            inner: RwLock::new(AddressGenerator::new(security_level)),
        }
    }

    pub fn generate_from_public_key(
        &self,
        public_key: &[u8],
        address_type: AddressType,
        format: AddressFormat,
    ) -> Address {
        self.inner
            .read()
            .expect("generator lock")
            .generate_from_public_key(public_key, address_type, format)
    }

    pub fn verify_address(&self, address: &Address) -> bool {
        self.inner.read().expect("generator lock").verify_address(address)
    }

    pub fn security_level(&self) -> usize {
        self.inner.read().expect("generator lock").security_level()
    }

    pub fn set_security_level(&self, security_level: usize) {
        self.inner
            .write()
            .expect("generator lock")
            .set_security_level(security_level);
    }

    /// Generate one address per key, in input order.
    pub fn generate_batch(
        &self,
        public_keys: &[Vec<u8>],
        address_type: AddressType,
        format: AddressFormat,
        threads: usize,
    ) -> Vec<Address> {
        let workers = worker_count(threads, public_keys.len());
        info!("generating {} addresses on {} workers", public_keys.len(), workers);
        let generator = self.inner.read().expect("generator lock");
        build_pool(workers).install(|| {
            public_keys
                .par_iter()
                .map(|key| generator.generate_from_public_key(key, address_type, format))
                .collect()
        })
    }

    /// Digest many keys in parallel, in input order.
    pub fn hash_keys_batch(&self, public_keys: &[Vec<u8>], threads: usize) -> Vec<Vec<u8>> {
        let workers = worker_count(threads, public_keys.len());
        let generator = self.inner.read().expect("generator lock");
        build_pool(workers).install(|| {
            public_keys
                .par_iter()
                .map(|key| generator.key_digest(key))
                .collect()
        })
    }
}
