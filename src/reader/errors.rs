use thiserror::Error;

/// Reasons the framer throws bytes away instead of yielding a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Bytes in front of the first start marker.
    #[error("discarded {len} byte(s) of leading garbage before start marker")]
    LeadingGarbage { len: usize },

    /// Marker found but the command byte is not the tag-report command.
    #[error("unrecognized command 0x{found:02X} (expected 0x{expected:02X})")]
    UnknownCommand { found: u8, expected: u8 },

    /// EPC-length byte outside `1..=64`.
    #[error("EPC length {len} outside 1..={max}")]
    InvalidEpcLength { len: u8, max: u8 },
}

/// Failures while extracting fields from one length-validated frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Slice too short to hold the header and EPC span.
    #[error("frame truncated: need {needed} bytes for EPC span, have {actual}")]
    Truncated { needed: usize, actual: usize },

    /// EPC-length byte inside the frame is outside `1..=64`.
    #[error("EPC length {0} outside valid range")]
    InvalidEpcLength(u8),
}
