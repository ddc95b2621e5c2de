//! Field extraction for a single tag-report frame.
//!
//! Offsets after the EPC are computed from the end of the whole `E + 1` byte
//! span (EPC plus suffix byte), which places them one byte later than the
//! vendor's prose description of the layout. The computed offsets are what
//! deployed readers were validated against, so they are kept as-is.
use super::errors::DecodeError;
use super::framer::{is_valid_epc_len, EPC_LEN_OFFSET, EPC_OFFSET};

const META_LEN: usize = 2;

/// Fields pulled out of one frame, before session annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub tag_id: String,
    pub antenna_id: Option<u8>,
    pub reader_read_count: Option<u8>,
    pub rssi: Option<u8>,
    pub raw_hex: String,
}

/// Decode one frame. Pure: the same bytes always give the same result.
///
/// The EPC span is required; antenna, reader count and RSSI are absent when
/// the slice ends before their offsets.
pub fn decode_frame(frame: &[u8]) -> Result<DecodedFrame, DecodeError> {
    let epc_len = *frame.get(EPC_LEN_OFFSET).ok_or(DecodeError::Truncated {
        needed: EPC_OFFSET,
        actual: frame.len(),
    })?;
    if !is_valid_epc_len(epc_len) {
        return Err(DecodeError::InvalidEpcLength(epc_len));
    }

    let epc_len = epc_len as usize;
    let span_end = EPC_OFFSET + epc_len + 1;
    if frame.len() < span_end {
        return Err(DecodeError::Truncated {
            needed: span_end,
            actual: frame.len(),
        });
    }

    let meta_end = span_end + META_LEN;
    Ok(DecodedFrame {
        tag_id: hex::encode_upper(&frame[EPC_OFFSET..EPC_OFFSET + epc_len]),
        antenna_id: frame.get(meta_end).copied(),
        reader_read_count: frame.get(meta_end + 1).copied(),
        rssi: frame.get(meta_end + 2).copied(),
        raw_hex: hex::encode_upper(frame),
    })
}
