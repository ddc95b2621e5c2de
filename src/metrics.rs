//! Process-wide decode counters, logged at shutdown.
use std::sync::atomic::{AtomicU64, Ordering};

static CONNECTIONS_OPENED: AtomicU64 = AtomicU64::new(0);
static CONNECTIONS_CLOSED: AtomicU64 = AtomicU64::new(0);
static FRAMES_DECODED: AtomicU64 = AtomicU64::new(0);
static FRAMES_REJECTED: AtomicU64 = AtomicU64::new(0);
static GARBAGE_BYTES: AtomicU64 = AtomicU64::new(0);
static DECODE_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn inc_connections_opened() {
    CONNECTIONS_OPENED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_connections_closed() {
    CONNECTIONS_CLOSED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_frames_decoded() {
    FRAMES_DECODED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_frames_rejected() {
    FRAMES_REJECTED.fetch_add(1, Ordering::Relaxed);
}
pub fn add_garbage_bytes(n: u64) {
    GARBAGE_BYTES.fetch_add(n, Ordering::Relaxed);
}
pub fn inc_decode_failures() {
    DECODE_FAILURES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub frames_decoded: u64,
    pub frames_rejected: u64,
    pub garbage_bytes: u64,
    pub decode_failures: u64,
}

impl Snapshot {
    pub fn active_connections(&self) -> u64 {
        self.connections_opened
            .saturating_sub(self.connections_closed)
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        connections_opened: CONNECTIONS_OPENED.load(Ordering::Relaxed),
        connections_closed: CONNECTIONS_CLOSED.load(Ordering::Relaxed),
        frames_decoded: FRAMES_DECODED.load(Ordering::Relaxed),
        frames_rejected: FRAMES_REJECTED.load(Ordering::Relaxed),
        garbage_bytes: GARBAGE_BYTES.load(Ordering::Relaxed),
        decode_failures: DECODE_FAILURES.load(Ordering::Relaxed),
    }
}
