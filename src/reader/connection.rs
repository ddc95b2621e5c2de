//! Per-connection decode state and its lifecycle.
//!
//! A [`ConnectionContext`] is created when a reader connects and owned by the
//! single task serving that socket, so its buffer and counts are never shared.
//! Closing consumes the context; nothing can be emitted for it afterwards.
use std::fmt;
use std::net::SocketAddr;

use log::{info, warn};

use super::decode::decode_frame;
use super::errors::FrameError;
use super::framer::{FrameStep, ReportFramer};
use super::report::TagReport;
use super::session::SessionCounter;
use crate::config::ProtocolConfig;
use crate::logutil::hex_snippet;
use crate::metrics;
use crate::relay::EventSink;

/// What one `on_data` call did with the buffered bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    pub reports: usize,
    pub discarded_bytes: usize,
    pub rejected_headers: usize,
    pub decode_failures: usize,
}

pub struct ConnectionContext {
    remote: SocketAddr,
    framer: ReportFramer,
    counter: SessionCounter,
}

impl ConnectionContext {
    /// Start a session for a freshly accepted reader.
    pub fn open(remote: SocketAddr, protocol: ProtocolConfig) -> Self {
        info!("Reader connected: {}", remote);
        metrics::inc_connections_opened();
        Self {
            remote,
            framer: ReportFramer::new(protocol),
            counter: SessionCounter::new(),
        }
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub fn buffered(&self) -> usize {
        self.framer.buffered()
    }

    pub fn read_count(&self, tag_id: &str) -> u64 {
        self.counter.count(tag_id)
    }

    /// Append a chunk and emit a report for every complete frame now available.
    pub fn on_data<S: EventSink + ?Sized>(&mut self, chunk: &[u8], sink: &mut S) -> DrainSummary {
        self.framer.push(chunk);
        let mut summary = DrainSummary::default();

        loop {
            match self.framer.next_step() {
                FrameStep::NeedMore => break,
                FrameStep::Discard { len, reason } => {
                    warn!("{}: {}", self.remote, reason);
                    summary.discarded_bytes += len;
                    match reason {
                        FrameError::LeadingGarbage { .. } => metrics::add_garbage_bytes(len as u64),
                        FrameError::UnknownCommand { .. } | FrameError::InvalidEpcLength { .. } => {
                            summary.rejected_headers += 1;
                            metrics::inc_frames_rejected();
                        }
                    }
                }
                FrameStep::Frame(raw) => match decode_frame(&raw) {
                    Ok(decoded) => {
                        let count = self.counter.record(&decoded.tag_id);
                        info!(
                            "{}: tag {} read #{} (ant={:?} rssi={:?})",
                            self.remote, decoded.tag_id, count, decoded.antenna_id, decoded.rssi
                        );
                        sink.emit(TagReport::from_decoded(decoded, count));
                        summary.reports += 1;
                        metrics::inc_frames_decoded();
                    }
                    Err(e) => {
                        warn!(
                            "{}: dropping undecodable frame ({}): {}",
                            self.remote,
                            e,
                            hex_snippet(&raw, raw.len())
                        );
                        summary.discarded_bytes += raw.len();
                        summary.decode_failures += 1;
                        metrics::inc_decode_failures();
                    }
                },
            }
        }
        summary
    }

    /// Orderly disconnect. Buffered partial frames and counts are dropped.
    pub fn close(self) {
        self.release("disconnected");
    }

    /// Socket failure. Same release as [`close`](Self::close), logged as a warning.
    pub fn fail(self, err: &dyn fmt::Display) {
        warn!("Reader {} socket error: {}", self.remote, err);
        self.release("closed after error");
    }

    fn release(self, how: &str) {
        info!(
            "Reader {} {} ({} distinct tags, {} reads, {} bytes unparsed)",
            self.remote,
            how,
            self.counter.distinct_tags(),
            self.counter.total_reads(),
            self.framer.buffered()
        );
        metrics::inc_connections_closed();
    }
}

impl fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("remote", &self.remote)
            .field("buffered", &self.framer.buffered())
            .field("distinct_tags", &self.counter.distinct_tags())
            .finish()
    }
}
