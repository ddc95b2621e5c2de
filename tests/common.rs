//! Test utilities & fixtures.
//! Builders for reader tag-report frames and helpers to drive a connection.

use std::net::SocketAddr;

use tagrelay::config::ProtocolConfig;
use tagrelay::reader::{ConnectionContext, TagReport};

pub const MARKER: u8 = 0xCF;
pub const REPORT_COMMAND: u8 = 0x01;

/// Fields that vary between test frames.
#[derive(Debug, Clone)]
pub struct FrameParts {
    pub epc: Vec<u8>,
    pub suffix: u8,
    pub reserved_len: [u8; 2],
    pub sub_command: u8,
    pub antenna: u8,
    pub reader_count: u8,
    pub rssi: u8,
}

impl FrameParts {
    pub fn new(epc: &[u8]) -> Self {
        Self {
            epc: epc.to_vec(),
            suffix: 0x00,
            reserved_len: [0x00, 0x00],
            sub_command: 0x00,
            antenna: 0x01,
            reader_count: 0x01,
            rssi: 0x45,
        }
    }

    /// Encode as one frame: header, EPC span (EPC + suffix), meta, fields, trailer, checksum.
    pub fn encode(&self) -> Vec<u8> {
        let mut f = vec![
            MARKER,
            0xFF,
            self.reserved_len[0],
            self.reserved_len[1],
            REPORT_COMMAND,
            self.sub_command,
            self.epc.len() as u8,
        ];
        f.extend_from_slice(&self.epc);
        f.push(self.suffix);
        f.extend_from_slice(&[0x30, 0x00]);
        f.push(self.antenna);
        f.push(self.reader_count);
        f.push(self.rssi);
        f.extend_from_slice(&[0x00, 0x00, 0x00]);
        let checksum = f[1..].iter().fold(0u8, |acc, b| acc ^ b);
        f.push(checksum);
        f
    }
}

#[allow(dead_code)]
pub fn frame(epc: &[u8]) -> Vec<u8> {
    FrameParts::new(epc).encode()
}

#[allow(dead_code)]
pub fn reader_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([192, 0, 2, 1], port))
}

#[allow(dead_code)]
pub fn open_context(port: u16) -> ConnectionContext {
    ConnectionContext::open(reader_addr(port), ProtocolConfig::default())
}

/// Feed `bytes` to a fresh connection, splitting before each offset in `cuts`.
#[allow(dead_code)]
pub fn decode_with_cuts(bytes: &[u8], cuts: &[usize]) -> Vec<TagReport> {
    let mut ctx = open_context(50000);
    let mut out: Vec<TagReport> = Vec::new();
    let end = bytes.len();
    let mut start = 0;
    for &cut in cuts.iter().chain(std::iter::once(&end)) {
        ctx.on_data(&bytes[start..cut], &mut out);
        start = cut;
    }
    ctx.close();
    out
}

/// Comparable view of a report (timestamps differ between runs).
#[allow(dead_code)]
pub fn essence(r: &TagReport) -> (String, u64, Option<u8>, Option<u8>, Option<u8>, String) {
    (
        r.tag_id.clone(),
        r.server_read_count,
        r.reader_reported_read_count,
        r.antenna_id,
        r.rssi,
        r.raw_data_packet.clone(),
    )
}
