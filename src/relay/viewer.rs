//! TCP relay that streams decoded reports to viewers as JSON lines.
//!
//! Each line is an envelope `{"event":"parsedTcpData","data":{...}}`. Viewers
//! only listen; anything they send is ignored.
use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};

use super::{Broadcaster, REPORT_EVENT};
use crate::reader::TagReport;

#[derive(Serialize)]
struct Envelope<'a> {
    event: &'static str,
    data: &'a TagReport,
}

/// One newline-terminated JSON envelope for `report`.
pub fn envelope_line(report: &TagReport) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(&Envelope {
        event: REPORT_EVENT,
        data: report,
    })?;
    line.push('\n');
    Ok(line)
}

pub struct ViewerRelay {
    listener: TcpListener,
    broadcaster: Broadcaster,
}

impl ViewerRelay {
    pub async fn bind(addr: &str, broadcaster: Broadcaster) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow!("Failed to bind viewer relay on {}: {}", addr, e))?;
        Ok(Self {
            listener,
            broadcaster,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept viewers until the task is dropped.
    pub async fn run(self) -> Result<()> {
        info!("Viewer relay listening on {}", self.local_addr()?);
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    info!("Viewer connected: {}", peer);
                    let rx = self.broadcaster.subscribe();
                    tokio::spawn(async move {
                        let (_read_half, write_half) = stream.into_split();
                        if let Err(e) = serve_viewer(write_half, rx).await {
                            debug!("Viewer {} write failed: {}", peer, e);
                        }
                        info!("Viewer disconnected: {}", peer);
                    });
                }
                Err(e) => {
                    error!("Viewer accept error: {}", e);
                }
            }
        }
    }
}

/// Forward reports from `rx` to one viewer until the channel closes or a write fails.
pub async fn serve_viewer<W: AsyncWrite + Unpin>(
    mut out: W,
    mut rx: broadcast::Receiver<TagReport>,
) -> Result<()> {
    loop {
        match rx.recv().await {
            Ok(report) => {
                let line = envelope_line(&report)?;
                out.write_all(line.as_bytes()).await?;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Viewer lagging; skipped {} report(s)", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report(count: u64) -> TagReport {
        TagReport {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            tag_id: "E200AB".to_string(),
            server_read_count: count,
            reader_reported_read_count: Some(1),
            antenna_id: Some(4),
            rssi: Some(200),
            raw_data_packet: "CF".to_string(),
        }
    }

    #[test]
    fn envelope_wraps_report() {
        let line = envelope_line(&report(1)).unwrap();
        assert!(line.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(v["event"], "parsedTcpData");
        assert_eq!(v["data"]["tagId"], "E200AB");
        assert_eq!(v["data"]["antennaId"], 4);
    }

    #[tokio::test]
    async fn serve_viewer_writes_lines_until_closed() {
        let (tx, rx) = broadcast::channel(4);
        tx.send(report(1)).unwrap();
        tx.send(report(2)).unwrap();
        drop(tx);

        let mut out: Vec<u8> = Vec::new();
        serve_viewer(&mut out, rx).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let counts: Vec<u64> = text
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .map(|v| v["data"]["serverReadCount"].as_u64().unwrap())
            .collect();
        assert_eq!(counts, vec![1, 2]);
    }

    #[tokio::test]
    async fn lagging_viewer_skips_ahead() {
        let (tx, rx) = broadcast::channel(2);
        for i in 1..=5 {
            tx.send(report(i)).unwrap();
        }
        drop(tx);

        let mut out: Vec<u8> = Vec::new();
        serve_viewer(&mut out, rx).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
