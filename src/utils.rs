//! Parsing helpers for console arguments.

use chrono::{NaiveDate, NaiveTime};

use crate::models::netro::{EventType, OnOff, ZoneId};

pub fn parse_date(arg: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(arg.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected a date as YYYY-MM-DD, got: {}", arg))
}

pub fn parse_time(arg: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(arg.trim(), "%H:%M")
        .map_err(|_| format!("expected a time as HH:MM, got: {}", arg))
}

/// Comma-separated zone indices, e.g. `1,2,3`.
pub fn parse_zones(arg: &str) -> Result<Vec<ZoneId>, String> {
    let ids = arg
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map(ZoneId)
                .map_err(|_| format!("expected a zone id, got: {}", part))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err("expected a comma-separated zone list, e.g. 1,2".to_string());
    }
    Ok(ids)
}

pub fn parse_on_off(arg: &str) -> Result<OnOff, String> {
    match arg.trim() {
        "on" => Ok(OnOff::Enable),
        "off" => Ok(OnOff::Disable),
        other => Err(format!("expected on|off, got: {}", other)),
    }
}

/// Numeric event type filter (1=offline, 2=online, 3=schedule start,
/// 4=schedule end).
pub fn parse_event_type(arg: &str) -> Result<EventType, String> {
    match arg.trim() {
        "1" => Ok(EventType::DeviceOffline),
        "2" => Ok(EventType::DeviceOnline),
        "3" => Ok(EventType::ScheduleStart),
        "4" => Ok(EventType::ScheduleEnd),
        other => Err(format!("expected an event type 1-4, got: {}", other)),
    }
}

pub fn parse_i64(arg: &str, what: &str) -> Result<i64, String> {
    arg.trim()
        .parse::<i64>()
        .map_err(|_| format!("expected an integer {}, got: {}", what, arg))
}

pub fn parse_i32(arg: &str, what: &str) -> Result<i32, String> {
    arg.trim()
        .parse::<i32>()
        .map_err(|_| format!("expected an integer {}, got: {}", what, arg))
}

pub fn parse_f64(arg: &str, what: &str) -> Result<f64, String> {
    arg.trim()
        .parse::<f64>()
        .map_err(|_| format!("expected a number {}, got: {}", what, arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dates_and_times() {
        assert_eq!(parse_date("2022-12-01").unwrap(), NaiveDate::from_ymd_opt(2022, 12, 1).unwrap());
        assert!(parse_date("12/01/2022").is_err());
        assert_eq!(parse_time("11:00").unwrap(), NaiveTime::from_hms_opt(11, 0, 0).unwrap());
        assert!(parse_time("11h00").is_err());
    }

    #[test]
    fn parses_zone_lists() {
        assert_eq!(parse_zones("1,2,3").unwrap(), vec![ZoneId(1), ZoneId(2), ZoneId(3)]);
        assert_eq!(parse_zones(" 2 , 1 ").unwrap(), vec![ZoneId(2), ZoneId(1)]);
        assert!(parse_zones("a,b").is_err());
        assert!(parse_zones(",").is_err());
    }

    #[test]
    fn parses_switches_and_event_types() {
        assert_eq!(parse_on_off("on").unwrap(), OnOff::Enable);
        assert_eq!(parse_on_off("off").unwrap(), OnOff::Disable);
        assert!(parse_on_off("standby").is_err());

        assert_eq!(parse_event_type("4").unwrap(), EventType::ScheduleEnd);
        assert!(parse_event_type("0").is_err());
        assert!(parse_event_type("5").is_err());
    }

    #[test]
    fn parses_numbers_with_context_in_errors() {
        assert_eq!(parse_i64("15", "duration").unwrap(), 15);
        assert_eq!(parse_f64("10.6", "days").unwrap(), 10.6);
        let err = parse_i32("many", "moisture").unwrap_err();
        assert!(err.contains("moisture"));
    }
}
