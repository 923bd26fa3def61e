//! Models for the Netro Public API (NPA) JSON envelope and payloads.
//!
//! Scope: types only — no API client code.
//!
//! Notes
//! - Every response is wrapped in the same envelope: `status`, `meta` and
//!   either `data` (on OK) or `errors` (on ERROR).
//! - Date/time fields arrive without a timezone suffix and are UTC by
//!   contract; they use `chrono` naive types. Local time-of-day fields
//!   remain strings.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =====================
// Scalar ID newtype wrappers
// =====================

/// Zone index within a controller (small positive integer, `ith` in info).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub i64);

// =====================
// Status vocabulary
// =====================

/// Envelope-level result discriminator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Lifecycle state of a watering schedule slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Standby,
    Valid,
    Executed,
    Executing,
}

/// Device state strings reported in the `status` field of info payloads.
pub mod device_state {
    pub const STANDBY: &str = "STANDBY";
    pub const WATERING: &str = "WATERING";
}

/// Device enable switch for `set_status` (1=enable, 0=disable on the wire).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OnOff {
    Enable,
    Disable,
}

impl OnOff {
    pub fn code(self) -> u8 {
        match self {
            OnOff::Enable => 1,
            OnOff::Disable => 0,
        }
    }
}

/// Event kinds delivered by `events.json` (integer-coded on the wire).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    // 1=device offline, 2=device online, 3=schedule start, 4=schedule end
    DeviceOffline,
    DeviceOnline,
    ScheduleStart,
    ScheduleEnd,
}

impl EventType {
    pub fn code(self) -> u8 {
        match self {
            EventType::DeviceOffline => 1,
            EventType::DeviceOnline => 2,
            EventType::ScheduleStart => 3,
            EventType::ScheduleEnd => 4,
        }
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = EventType;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "an integer 1, 2, 3 or 4 for EventType")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match value {
                    1 => Ok(EventType::DeviceOffline),
                    2 => Ok(EventType::DeviceOnline),
                    3 => Ok(EventType::ScheduleStart),
                    4 => Ok(EventType::ScheduleEnd),
                    other => Err(E::invalid_value(serde::de::Unexpected::Signed(other), &self)),
                }
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match value {
                    1 => Ok(EventType::DeviceOffline),
                    2 => Ok(EventType::DeviceOnline),
                    3 => Ok(EventType::ScheduleStart),
                    4 => Ok(EventType::ScheduleEnd),
                    other => Err(E::invalid_value(serde::de::Unexpected::Unsigned(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(V)
    }
}

/// Weather condition codes accepted by `report_weather`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WeatherCondition {
    // 0=clear, 1=cloudy, 2=rain, 3=snow, 4=wind
    Clear,
    Cloudy,
    Rain,
    Snow,
    Wind,
}

impl WeatherCondition {
    pub fn code(self) -> u8 {
        match self {
            WeatherCondition::Clear => 0,
            WeatherCondition::Cloudy => 1,
            WeatherCondition::Rain => 2,
            WeatherCondition::Snow => 3,
            WeatherCondition::Wind => 4,
        }
    }
}

// =====================
// Envelope
// =====================

/// Rate-limit and request bookkeeping reported with every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub time: Option<NaiveDateTime>,
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub token_limit: Option<i64>,
    #[serde(default)]
    pub token_remaining: Option<i64>,
    #[serde(default)]
    pub last_active: Option<NaiveDateTime>,
    #[serde(default)]
    pub token_reset: Option<NaiveDateTime>,
}

/// One entry of the `errors` list in an ERROR envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

/// The full vendor response wrapper, returned to callers on success so that
/// `meta` (token quota) stays inspectable alongside the payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Envelope<T> {
    pub status: ResponseStatus,
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub data: T,
}

/// Envelope of a command endpoint (`water`, `set_status`, ...): the vendor
/// acknowledges with an empty or vendor-defined object, kept raw.
pub type Ack = Envelope<Value>;

// =====================
// info.json
// =====================

/// One valve/circuit as listed in controller info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub ith: ZoneId,
    pub enabled: bool,
    #[serde(default)]
    pub smart: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A sprinkler controller as reported by `info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub sw_version: Option<String>,
    #[serde(default)]
    pub last_active: Option<NaiveDateTime>,
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub zone_num: Option<i64>,
    #[serde(default)]
    pub zones: Vec<ZoneInfo>,
}

/// A soil sensor as reported by `info.json` (sensor keys only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub battery_level: Option<f64>,
}

/// `info.json` data: exactly one of `device` / `sensor` depending on the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoPayload {
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub sensor: Option<Sensor>,
}

// =====================
// schedules.json
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub id: Option<i64>,
    pub zone: ZoneId,
    pub status: ScheduleStatus,
    /// Scheduled start, UTC without suffix.
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub local_date: Option<NaiveDate>,
    #[serde(default)]
    pub local_start_time: Option<String>,
    #[serde(default)]
    pub local_end_time: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulesPayload {
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

// =====================
// moistures.json
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moisture {
    pub zone: ZoneId,
    /// Estimated soil humidity, percent.
    #[serde(default)]
    pub moisture: Option<f64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoisturesPayload {
    #[serde(default)]
    pub moistures: Vec<Moisture>,
}

// =====================
// sensor_data.json
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub time: Option<NaiveDateTime>,
    #[serde(default)]
    pub local_date: Option<NaiveDate>,
    #[serde(default)]
    pub local_time: Option<String>,
    #[serde(default)]
    pub moisture: Option<f64>,
    #[serde(default)]
    pub sensor_temp: Option<f64>,
    #[serde(default)]
    pub celsius_degree: Option<f64>,
    #[serde(default)]
    pub fahrenheit_degree: Option<f64>,
    #[serde(default)]
    pub sunlight: Option<f64>,
    #[serde(default)]
    pub battery_level: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorDataPayload {
    #[serde(default)]
    pub sensor_data: Vec<SensorSample>,
}

// =====================
// events.json
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: Option<i64>,
    pub event: EventType,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsPayload {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn load_fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/data/{name}")).expect("fixture present")
    }

    #[test]
    fn decodes_controller_info() {
        let body = load_fixture("info.json");
        let envelope: Envelope<InfoPayload> = serde_json::from_str(&body).expect("parse info");
        assert_eq!(envelope.status, ResponseStatus::Ok);

        let meta = envelope.meta.expect("meta present");
        assert_eq!(meta.token_limit, Some(2000));
        assert_eq!(meta.token_remaining, Some(1999));

        let device = envelope.data.device.expect("controller payload");
        assert_eq!(device.name.as_deref(), Some("Front garden"));
        assert_eq!(device.status.as_deref(), Some(device_state::STANDBY));
        assert_eq!(device.zone_num, Some(3));
        assert_eq!(device.zones.len(), 3);
        assert_eq!(device.zones[0].ith, ZoneId(1));
        assert!(device.zones[0].enabled);
        assert!(!device.zones[2].enabled);
        assert!(envelope.data.sensor.is_none());
    }

    #[test]
    fn decodes_schedules() {
        let body = load_fixture("schedules.json");
        let envelope: Envelope<SchedulesPayload> = serde_json::from_str(&body).expect("parse schedules");
        let schedules = envelope.data.schedules;
        assert_eq!(schedules.len(), 4);
        assert_eq!(schedules[0].zone, ZoneId(1));
        assert_eq!(schedules[0].status, ScheduleStatus::Executed);
        assert_eq!(
            schedules[0].start_time,
            NaiveDate::from_ymd_opt(2023, 3, 28)
                .unwrap()
                .and_hms_opt(6, 30, 0)
        );
        assert_eq!(schedules[1].status, ScheduleStatus::Valid);
        assert_eq!(schedules[1].local_start_time.as_deref(), Some("08:30:00"));
    }

    #[test]
    fn decodes_moistures_and_sensor_data() {
        let body = load_fixture("moistures.json");
        let envelope: Envelope<MoisturesPayload> = serde_json::from_str(&body).expect("parse moistures");
        assert_eq!(envelope.data.moistures.len(), 3);
        assert_eq!(envelope.data.moistures[0].zone, ZoneId(1));
        assert_eq!(envelope.data.moistures[0].moisture, Some(43.0));

        let body = load_fixture("sensor-data.json");
        let envelope: Envelope<SensorDataPayload> = serde_json::from_str(&body).expect("parse sensor data");
        let samples = envelope.data.sensor_data;
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].moisture, Some(31.0));
        assert_eq!(samples[0].celsius_degree, Some(14.5));
    }

    #[test]
    fn decodes_events_with_integer_codes() {
        let body = load_fixture("events.json");
        let envelope: Envelope<EventsPayload> = serde_json::from_str(&body).expect("parse events");
        let events = envelope.data.events;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, EventType::ScheduleStart);
        assert_eq!(events[1].event, EventType::ScheduleEnd);
    }

    #[test]
    fn rejects_unknown_event_code() {
        let err = serde_json::from_str::<Event>(r#"{"id": 7, "event": 9}"#).unwrap_err();
        assert!(err.to_string().contains("invalid value"));
    }

    #[test]
    fn command_envelope_keeps_raw_data() {
        let ack: Ack = serde_json::from_str(
            r#"{"status": "OK", "meta": {"token_remaining": 12}, "data": {}}"#,
        )
        .expect("parse ack");
        assert_eq!(ack.status, ResponseStatus::Ok);
        assert_eq!(ack.meta.unwrap().token_remaining, Some(12));
        assert!(ack.data.is_object());
    }

    #[test]
    fn envelope_tolerates_missing_data_field() {
        let ack: Ack = serde_json::from_str(r#"{"status": "OK"}"#).expect("parse bare envelope");
        assert!(ack.data.is_null());
        assert!(ack.meta.is_none());
    }
}
