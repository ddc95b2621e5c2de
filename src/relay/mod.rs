//! Downstream side of the decoder: where [`TagReport`]s go once decoded.
//!
//! The decoder only sees the [`EventSink`] trait. The server wires it to a
//! [`Broadcaster`], whose subscribers (see [`viewer`]) forward reports to
//! remote viewers; tests and the offline `decode` command collect into a `Vec`.

pub mod viewer;

use log::trace;
use tokio::sync::broadcast;

use crate::reader::TagReport;

/// Event name viewers subscribe to.
pub const REPORT_EVENT: &str = "parsedTcpData";

/// Receives decoded reports. Called synchronously from the decode loop, so
/// implementations must not block.
pub trait EventSink {
    fn emit(&mut self, report: TagReport);
}

impl EventSink for Vec<TagReport> {
    fn emit(&mut self, report: TagReport) {
        self.push(report);
    }
}

/// Fan-out of reports to any number of subscribers.
///
/// Each reader connection holds its own clone. Reports emitted while nobody
/// is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<TagReport>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TagReport> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventSink for Broadcaster {
    fn emit(&mut self, report: TagReport) {
        if let Err(broadcast::error::SendError(report)) = self.tx.send(report) {
            trace!("No viewers subscribed; dropped report for {}", report.tag_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(tag: &str) -> TagReport {
        TagReport {
            timestamp: Utc::now(),
            tag_id: tag.to_string(),
            server_read_count: 1,
            reader_reported_read_count: None,
            antenna_id: Some(1),
            rssi: Some(60),
            raw_data_packet: String::new(),
        }
    }

    #[test]
    fn broadcaster_fans_out_to_every_subscriber() {
        let mut b = Broadcaster::new(8);
        let mut rx1 = b.subscribe();
        let mut rx2 = b.clone().subscribe();
        assert_eq!(b.subscriber_count(), 2);
        b.emit(report("AA01"));
        assert_eq!(rx1.try_recv().unwrap().tag_id, "AA01");
        assert_eq!(rx2.try_recv().unwrap().tag_id, "AA01");
    }

    #[test]
    fn emitting_without_subscribers_is_harmless() {
        let mut b = Broadcaster::new(8);
        b.emit(report("AA02"));
        let mut rx = b.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
