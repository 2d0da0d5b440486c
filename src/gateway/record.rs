//! Inbound telemetry events and the enriched records built from them.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{MAX_HEAP_UNKNOWN, TIMESTAMP_FORMAT};
use crate::error_handling::EventError;
use crate::geoip::GeoLocation;

/// A phone-home event as reported by a broker instance.
///
/// Every field is optional; an absent field is omitted from the record, never
/// defaulted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryEvent {
    pub os: Option<String>,
    pub cpu_arch: Option<String>,
    pub jvm_version: Option<String>,
    pub jvm_vendor: Option<String>,
    pub remote_ip: Option<String>,
    pub broker_version: Option<String>,
    pub uuid: Option<String>,
    pub standalone: Option<bool>,
    /// `None` both when absent and when reported as unknown
    pub max_heap: Option<i64>,
}

/// `max_heap` arrives as a numeric string, the unknown sentinel, or a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MaxHeapField {
    Number(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct WireEvent {
    os: Option<String>,
    cpu_arch: Option<String>,
    jvm_version: Option<String>,
    jvm_vendor: Option<String>,
    remote_ip: Option<String>,
    broker_version: Option<String>,
    uuid: Option<String>,
    standalone: Option<bool>,
    max_heap: Option<MaxHeapField>,
}

impl TryFrom<WireEvent> for TelemetryEvent {
    type Error = EventError;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        let max_heap = match wire.max_heap {
            None => None,
            Some(MaxHeapField::Number(n)) => Some(n),
            Some(MaxHeapField::Text(text)) if text == MAX_HEAP_UNKNOWN => None,
            Some(MaxHeapField::Text(text)) => Some(
                text.parse::<i64>()
                    .map_err(|_| EventError::InvalidMaxHeap(text.clone()))?,
            ),
        };
        Ok(TelemetryEvent {
            os: wire.os,
            cpu_arch: wire.cpu_arch,
            jvm_version: wire.jvm_version,
            jvm_vendor: wire.jvm_vendor,
            remote_ip: wire.remote_ip,
            broker_version: wire.broker_version,
            uuid: wire.uuid,
            standalone: wire.standalone,
            max_heap,
        })
    }
}

/// Parses a request body into a [`TelemetryEvent`].
///
/// An empty (or all-whitespace) body is an empty event. Unknown keys are
/// ignored.
///
/// # Errors
///
/// Returns `EventError` for invalid JSON, a non-object document, a field of
/// the wrong type, or a `max_heap` that is neither an integer nor `"undefined"`.
pub fn parse_event(body: &[u8]) -> Result<TelemetryEvent, EventError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TelemetryEvent::default());
    }
    let wire: WireEvent = serde_json::from_slice(body)?;
    TelemetryEvent::try_from(wire)
}

/// Formats a timestamp the way `startup_date` is stored.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// The record forwarded to the store for one event.
///
/// Serialized as a flat JSON object: `IP`, `startup_date`, the location keys,
/// then whichever caller fields are present.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    ip: String,
    startup_date: String,
    location: GeoLocation,
    event: TelemetryEvent,
}

impl EnrichedRecord {
    pub fn new(
        source_ip: impl Into<String>,
        received_at: DateTime<Utc>,
        location: GeoLocation,
        event: TelemetryEvent,
    ) -> Self {
        EnrichedRecord {
            ip: source_ip.into(),
            startup_date: format_timestamp(received_at),
            location,
            event,
        }
    }

    pub fn source_ip(&self) -> &str {
        &self.ip
    }

    pub fn location(&self) -> &GeoLocation {
        &self.location
    }
}

fn entry_if_some<M, T>(map: &mut M, key: &str, value: &Option<T>) -> Result<(), M::Error>
where
    M: SerializeMap,
    T: Serialize,
{
    match value {
        Some(value) => map.serialize_entry(key, value),
        None => Ok(()),
    }
}

impl Serialize for EnrichedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("IP", &self.ip)?;
        map.serialize_entry("startup_date", &self.startup_date)?;
        self.location.write_fields(&mut map)?;

        let event = &self.event;
        entry_if_some(&mut map, "os", &event.os)?;
        entry_if_some(&mut map, "cpu_arch", &event.cpu_arch)?;
        entry_if_some(&mut map, "jvm_version", &event.jvm_version)?;
        entry_if_some(&mut map, "jvm_vendor", &event.jvm_vendor)?;
        entry_if_some(&mut map, "remote_ip", &event.remote_ip)?;
        entry_if_some(&mut map, "version", &event.broker_version)?;
        entry_if_some(&mut map, "uuid", &event.uuid)?;
        entry_if_some(&mut map, "standalone", &event.standalone)?;
        entry_if_some(&mut map, "max_heap", &event.max_heap)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoip::CityLocation;
    use chrono::TimeZone;
    use serde_json::json;

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap()
    }

    #[test]
    fn test_parse_full_event() {
        let body = br#"{
            "os": "Linux", "cpu_arch": "amd64", "jvm_version": "17.0.2",
            "jvm_vendor": "Eclipse Adoptium", "remote_ip": "8.8.8.8",
            "broker_version": "0.17", "uuid": "7f6c", "standalone": true,
            "max_heap": "4294967296"
        }"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.os.as_deref(), Some("Linux"));
        assert_eq!(event.broker_version.as_deref(), Some("0.17"));
        assert_eq!(event.standalone, Some(true));
        assert_eq!(event.max_heap, Some(4_294_967_296));
    }

    #[test]
    fn test_parse_empty_body_is_empty_event() {
        assert_eq!(parse_event(b"").unwrap(), TelemetryEvent::default());
        assert_eq!(parse_event(b" \n").unwrap(), TelemetryEvent::default());
        assert_eq!(parse_event(b"{}").unwrap(), TelemetryEvent::default());
    }

    #[test]
    fn test_parse_max_heap_forms() {
        assert_eq!(parse_event(br#"{"max_heap": 1024}"#).unwrap().max_heap, Some(1024));
        assert_eq!(parse_event(br#"{"max_heap": "undefined"}"#).unwrap().max_heap, None);
        assert_eq!(parse_event(br#"{"max_heap": null}"#).unwrap().max_heap, None);
        assert!(matches!(
            parse_event(br#"{"max_heap": "lots"}"#),
            Err(EventError::InvalidMaxHeap(v)) if v == "lots"
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_bodies() {
        for body in [
            &b"{not json"[..],
            &b"[1, 2, 3]"[..],
            &b"\"just a string\""[..],
            &br#"{"standalone": "yes"}"#[..],
            &br#"{"os": 42}"#[..],
        ] {
            assert!(
                matches!(parse_event(body), Err(EventError::Malformed(_))),
                "body {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let event = parse_event(br#"{"uuid": "u1", "extra": {"nested": true}}"#).unwrap();
        assert_eq!(event.uuid.as_deref(), Some("u1"));
    }

    #[test]
    fn test_format_timestamp_is_utc_seconds_with_z() {
        assert_eq!(format_timestamp(received_at()), "2024-03-09T17:04:05Z");
    }

    #[test]
    fn test_record_field_order_and_renames() {
        let event = TelemetryEvent {
            os: Some("Linux".to_string()),
            broker_version: Some("0.17".to_string()),
            standalone: Some(false),
            max_heap: Some(512),
            ..Default::default()
        };
        let location = GeoLocation::Located(CityLocation {
            nation: Some("Italy".to_string()),
            region: Some("Lombardy".to_string()),
            city: Some("Milan".to_string()),
            latitude: Some(45.4643),
            longitude: Some(9.1895),
        });
        let record = EnrichedRecord::new("203.0.113.5", received_at(), location, event);

        let encoded = serde_json::to_string(&record).unwrap();
        assert_eq!(
            encoded,
            r#"{"IP":"203.0.113.5","startup_date":"2024-03-09T17:04:05Z","nation":"Italy","region":"Lombardy","city":"Milan","latitude":45.4643,"longitude":9.1895,"os":"Linux","version":"0.17","standalone":false,"max_heap":512}"#
        );
    }

    #[test]
    fn test_record_unmapped_has_no_location_keys() {
        let record = EnrichedRecord::new(
            "10.0.0.1",
            received_at(),
            GeoLocation::Unmapped,
            TelemetryEvent::default(),
        );
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"IP": "10.0.0.1", "startup_date": "2024-03-09T17:04:05Z"})
        );
    }

    #[test]
    fn test_record_fallback_echoes_remote_ip() {
        let event = TelemetryEvent {
            remote_ip: Some("not-an-ip".to_string()),
            ..Default::default()
        };
        let record = EnrichedRecord::new(
            "203.0.113.5",
            received_at(),
            GeoLocation::Fallback("not-an-ip".to_string()),
            event,
        );
        assert_eq!(record.source_ip(), "203.0.113.5");
        assert_eq!(
            record.location(),
            &GeoLocation::Fallback("not-an-ip".to_string())
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["nation"], "not-an-ip");
        assert_eq!(value["latitude"], 0.0);
        assert_eq!(value["remote_ip"], "not-an-ip");
        assert_eq!(value["IP"], "203.0.113.5");
    }
}
