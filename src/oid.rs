//! Generation of `_id` values for documents that don't supply their own.
//!
//! Mirrors the layout MongoDB's own drivers use: a 4-byte seconds-since-epoch
//! timestamp, 5 bytes unique to this process, and a 3-byte counter that
//! rolls over per process. The "unique to this process" bytes are seeded
//! once from the process id and the time the process started, which is
//! enough to avoid collisions between processes on the same host without
//! pulling in a random number generator.

use std::sync::atomic::{AtomicUsize, Ordering, ATOMIC_USIZE_INIT};
use std::time::{SystemTime, UNIX_EPOCH};

use bson::Bson;

static COUNTER: AtomicUsize = ATOMIC_USIZE_INIT;

/// A 12-byte MongoDB object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectId {
    bytes: [u8; 12],
}

impl ObjectId {
    /// Generates a fresh id. Never fails in practice; the `Result` is kept
    /// for symmetry with the rest of the facade, which treats clock or
    /// entropy failures as recoverable rather than panics.
    pub fn new() -> ::std::io::Result<ObjectId> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0) as u32;

        let process_unique = process_unique_bytes();
        let count = COUNTER.fetch_add(1, Ordering::SeqCst) as u32;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes()[..]);
        bytes[4..9].copy_from_slice(&process_unique);
        bytes[9] = ((count >> 16) & 0xff) as u8;
        bytes[10] = ((count >> 8) & 0xff) as u8;
        bytes[11] = (count & 0xff) as u8;

        Ok(ObjectId { bytes: bytes })
    }

    /// The raw 12 bytes, as stored on the wire.
    pub fn bytes(&self) -> [u8; 12] {
        self.bytes
    }

    /// Wraps this id as the `Bson::ObjectId` variant for insertion into a
    /// document.
    pub fn to_bson(&self) -> Bson {
        Bson::ObjectId(self.bytes)
    }
}

fn process_unique_bytes() -> [u8; 5] {
    let pid = ::std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let mut out = [0u8; 5];
    out[0] = (pid & 0xff) as u8;
    out[1] = ((pid >> 8) & 0xff) as u8;
    out[2] = (nanos & 0xff) as u8;
    out[3] = ((nanos >> 8) & 0xff) as u8;
    out[4] = ((nanos >> 16) & 0xff) as u8;
    out
}
