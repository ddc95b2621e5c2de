//! Incremental framer for reader tag-report messages.
//!
//! Reader devices stream reports over TCP without any outer framing, so frame
//! boundaries are recovered from the content itself:
//!
//! ```text
//!  0      1      2..4       4     5      6        7 .. 7+E+1      +2    +1   +1    +1    +3     +1
//! [SOF] [ADDR] [RSV LEN] [CMD] [SUB] [EPC LEN] [EPC ... SUFFIX] [META] [ANT] [CNT] [RSSI] [META] [CHK]
//! ```
//!
//! The framer can be fed arbitrary chunks and hands back one [`FrameStep`] per
//! call: either it needs more bytes, it discarded some bytes (garbage or a
//! rejected header), or it split off one complete frame. Every discard removes
//! at least one byte, so repeated calls always terminate.
use bytes::{Buf, Bytes, BytesMut};

use super::errors::FrameError;
use crate::config::ProtocolConfig;

/// Bytes required before the command and EPC-length fields can be read.
pub const MIN_HEADER_LEN: usize = 7;
pub const COMMAND_OFFSET: usize = 4;
pub const EPC_LEN_OFFSET: usize = 6;
pub const EPC_OFFSET: usize = 7;
pub const MAX_EPC_LEN: u8 = 64;

/// Frame bytes that do not scale with the EPC length: the 16 fixed header and
/// trailer bytes plus the suffix byte closing the EPC span.
pub const FRAME_OVERHEAD: usize = 17;

/// Total frame length for a given EPC-length byte.
pub fn expected_frame_len(epc_len: u8) -> usize {
    FRAME_OVERHEAD + epc_len as usize
}

pub fn is_valid_epc_len(epc_len: u8) -> bool {
    (1..=MAX_EPC_LEN).contains(&epc_len)
}

/// Outcome of a single framer pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameStep {
    /// No complete frame buffered; wait for the next chunk.
    NeedMore,
    /// `len` bytes were dropped from the front of the buffer.
    Discard { len: usize, reason: FrameError },
    /// One complete, header-validated frame.
    Frame(Bytes),
}

/// Per-connection frame buffer plus the synchronizer and header checks.
#[derive(Debug)]
pub struct ReportFramer {
    buf: BytesMut,
    start_marker: u8,
    report_command: u8,
}

impl ReportFramer {
    pub fn new(protocol: ProtocolConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
            start_marker: protocol.start_marker,
            report_command: protocol.report_command,
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes currently held and not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Advance the state machine by one action.
    ///
    /// A buffer without any start marker is left untouched; the bytes are only
    /// dropped as garbage once a marker shows up behind them.
    pub fn next_step(&mut self) -> FrameStep {
        let Some(pos) = self.buf.iter().position(|&b| b == self.start_marker) else {
            return FrameStep::NeedMore;
        };
        if pos > 0 {
            self.buf.advance(pos);
            return FrameStep::Discard {
                len: pos,
                reason: FrameError::LeadingGarbage { len: pos },
            };
        }

        if self.buf.len() < MIN_HEADER_LEN {
            return FrameStep::NeedMore;
        }

        let command = self.buf[COMMAND_OFFSET];
        if command != self.report_command {
            return self.resync(FrameError::UnknownCommand {
                found: command,
                expected: self.report_command,
            });
        }

        let epc_len = self.buf[EPC_LEN_OFFSET];
        if !is_valid_epc_len(epc_len) {
            return self.resync(FrameError::InvalidEpcLength {
                len: epc_len,
                max: MAX_EPC_LEN,
            });
        }

        let frame_len = expected_frame_len(epc_len);
        if self.buf.len() < frame_len {
            return FrameStep::NeedMore;
        }
        FrameStep::Frame(self.buf.split_to(frame_len).freeze())
    }

    // Drop only the marker byte so a real marker hidden inside the rejected
    // header is still found on the next pass.
    fn resync(&mut self, reason: FrameError) -> FrameStep {
        self.buf.advance(1);
        FrameStep::Discard { len: 1, reason }
    }
}

impl Default for ReportFramer {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}
