//! # tagrelay - TCP ingest for UHF RFID fixed readers
//!
//! Fixed RFID readers stream binary tag reports over TCP. tagrelay accepts
//! those connections, rebuilds frames from the raw byte stream, decodes each
//! report (EPC tag id, antenna, reader-side read count, RSSI), counts reads per
//! tag for the lifetime of each connection, and relays the decoded reports to
//! any number of viewers as JSON lines.
//!
//! ## Features
//!
//! - **Stream Framing**: Start-marker synchronization with one-byte resync on
//!   corrupt headers; frames may be split across any TCP chunk boundaries.
//! - **Variable EPC Length**: Frame size computed from the EPC-length field (1..=64 bytes).
//! - **Session Counts**: Per-connection, per-tag running read counts.
//! - **Viewer Relay**: Newline-delimited JSON broadcast of decoded reports.
//! - **Offline Decoding**: Run hex captures through the same pipeline from the CLI.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tagrelay::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     tagrelay::server::run(config).await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`reader`] - framing, decoding and per-connection state
//! - [`relay`] - event sink seam and the viewer relay
//! - [`server`] - reader-facing TCP listener
//! - [`config`] - configuration loading and validation
//! - [`logutil`] - hex helpers for logs and captures
//! - [`metrics`] - process-wide decode counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Reader Server  │ ← one task per reader socket
//! └─────────────────┘
//!          │ chunks
//! ┌─────────────────┐
//! │ Reader Decoding │ ← framer, decoder, session counts
//! └─────────────────┘
//!          │ TagReport
//! ┌─────────────────┐
//! │  Viewer Relay   │ ← broadcast to viewers
//! └─────────────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod metrics;
pub mod reader;
pub mod relay;
pub mod server;
