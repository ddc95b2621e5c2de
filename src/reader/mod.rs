//! # Reader Stream Decoding
//!
//! Fixed RFID readers push tag reports over a plain TCP stream. Chunk
//! boundaries carry no meaning, so this module rebuilds frames from the byte
//! stream, validates their headers, and turns each frame into a [`TagReport`].
//!
//! ## Pipeline
//!
//! ```text
//! chunk ──▶ ReportFramer ──▶ decode_frame ──▶ SessionCounter ──▶ EventSink
//!           (resync/length)   (field offsets)   (per-tag count)
//! ```
//!
//! - [`framer`] owns the connection buffer and the marker/header checks
//! - [`decode`] extracts tag id, antenna, reader count and RSSI
//! - [`session`] keeps per-connection read counts
//! - [`connection`] ties them together for one live socket
//!
//! ## Usage
//!
//! ```rust
//! use tagrelay::config::ProtocolConfig;
//! use tagrelay::reader::{ConnectionContext, TagReport};
//!
//! let mut ctx = ConnectionContext::open("127.0.0.1:5000".parse().unwrap(), ProtocolConfig::default());
//! let mut reports: Vec<TagReport> = Vec::new();
//! ctx.on_data(&[0xCF, 0xFF, 0x00], &mut reports);
//! assert!(reports.is_empty());
//! ctx.close();
//! ```
//!
//! Corrupt input never stops the stream: bad headers cost one byte, frames
//! that fail to decode are dropped whole, and both are logged.

pub mod connection;
pub mod decode;
pub mod errors;
pub mod framer;
pub mod report;
pub mod session;

pub use connection::{ConnectionContext, DrainSummary};
pub use decode::{decode_frame, DecodedFrame};
pub use errors::{DecodeError, FrameError};
pub use framer::{FrameStep, ReportFramer};
pub use report::TagReport;
pub use session::SessionCounter;
