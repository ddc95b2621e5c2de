use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::decode::DecodedFrame;

/// One decoded tag read, as handed to the event sink and serialized for viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReport {
    /// Capture time on this host, not the reader's clock.
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub tag_id: String,
    /// Reads of this tag on this connection so far, starting at 1.
    pub server_read_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_reported_read_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antenna_id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<u8>,
    pub raw_data_packet: String,
}

impl TagReport {
    pub fn from_decoded(decoded: DecodedFrame, server_read_count: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            tag_id: decoded.tag_id,
            server_read_count,
            reader_reported_read_count: decoded.reader_read_count,
            antenna_id: decoded.antenna_id,
            rssi: decoded.rssi,
            raw_data_packet: decoded.raw_hex,
        }
    }
}

// Viewers expect JavaScript-style ISO strings (millisecond precision, `Z`).
mod iso_millis {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> TagReport {
        TagReport {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            tag_id: "E2801122".to_string(),
            server_read_count: 3,
            reader_reported_read_count: Some(1),
            antenna_id: Some(2),
            rssi: None,
            raw_data_packet: "CFFF".to_string(),
        }
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["timestamp"], "2024-03-09T14:05:07.000Z");
        assert_eq!(json["tagId"], "E2801122");
        assert_eq!(json["serverReadCount"], 3);
        assert_eq!(json["readerReportedReadCount"], 1);
        assert_eq!(json["antennaId"], 2);
        assert!(json.get("rssi").is_none());
        assert_eq!(json["rawDataPacket"], "CFFF");
    }

    #[test]
    fn parses_back_from_json() {
        let text = serde_json::to_string(&sample()).unwrap();
        let back: TagReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, sample());
    }
}
