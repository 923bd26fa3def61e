//! Per-zone views over flat schedule and moisture lists.
//!
//! A `Zone` is a transient, client-side aggregate: it is built from the
//! enabled zones of a controller's info payload, its lists are replaced (not
//! merged) on every grouping call, and nothing is persisted.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::models::netro::{Device, Moisture, Schedule, ScheduleStatus, ZoneId, ZoneInfo};

/// One irrigation zone with its time-ordered history and outlook.
#[derive(Debug, Clone)]
pub struct Zone {
    pub ith: ZoneId,
    pub enabled: bool,
    pub smart: Option<String>,
    pub name: Option<String>,
    /// Executed/executing runs, most recent first.
    pub past_schedules: Vec<Schedule>,
    /// Valid runs strictly in the future, soonest first.
    pub coming_schedules: Vec<Schedule>,
    /// Moisture readings, most recent first.
    pub moistures: Vec<Moisture>,
}

impl Zone {
    pub fn from_info(info: &ZoneInfo) -> Self {
        Zone {
            ith: info.ith,
            enabled: info.enabled,
            smart: info.smart.clone(),
            name: info.name.clone(),
            past_schedules: Vec::new(),
            coming_schedules: Vec::new(),
            moistures: Vec::new(),
        }
    }

    /// The last executed or still executing run, if any was reported.
    pub fn last_run(&self) -> Option<&Schedule> {
        self.past_schedules.first()
    }

    /// The next valid run to be executed in the future, if any.
    pub fn next_run(&self) -> Option<&Schedule> {
        self.coming_schedules.first()
    }

    /// The most recently reported moisture estimate, if any.
    pub fn latest_moisture(&self) -> Option<&Moisture> {
        self.moistures.first()
    }
}

/// Zones keyed by their index, in index order.
pub type ZoneTable = BTreeMap<i64, Zone>;

/// Build the zone table from a controller's info payload. Disabled zones are
/// not tracked.
pub fn zones_from_device(device: &Device) -> ZoneTable {
    device
        .zones
        .iter()
        .filter(|z| z.enabled)
        .map(|z| (z.ith.0, Zone::from_info(z)))
        .collect()
}

/// Split `schedules` per zone into past (EXECUTED/EXECUTING, most recent
/// first) and coming (VALID with a start strictly after `now`, soonest
/// first). Equal start times keep their input order.
pub fn group_schedules_by_zone(zones: &mut ZoneTable, schedules: &[Schedule], now: NaiveDateTime) {
    for zone in zones.values_mut() {
        let mut past: Vec<Schedule> = schedules
            .iter()
            .filter(|s| {
                s.zone == zone.ith
                    && matches!(s.status, ScheduleStatus::Executed | ScheduleStatus::Executing)
            })
            .cloned()
            .collect();
        past.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        let mut coming: Vec<Schedule> = schedules
            .iter()
            .filter(|s| {
                s.zone == zone.ith
                    && s.status == ScheduleStatus::Valid
                    && s.start_time.map(|t| t > now).unwrap_or(false)
            })
            .cloned()
            .collect();
        coming.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        zone.past_schedules = past;
        zone.coming_schedules = coming;
    }
}

/// Partition `moistures` per zone, most recent first where dates are
/// reported; entries without a date keep their input order at the tail.
pub fn group_moistures_by_zone(zones: &mut ZoneTable, moistures: &[Moisture]) {
    for zone in zones.values_mut() {
        let mut of_zone: Vec<Moisture> = moistures
            .iter()
            .filter(|m| m.zone == zone.ith)
            .cloned()
            .collect();
        of_zone.sort_by(|a, b| b.date.cmp(&a.date));
        zone.moistures = of_zone;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
    }

    fn schedule(zone: i64, status: ScheduleStatus, start: Option<NaiveDateTime>) -> Schedule {
        Schedule {
            id: None,
            zone: ZoneId(zone),
            status,
            start_time: start,
            end_time: None,
            local_date: None,
            local_start_time: None,
            local_end_time: None,
            source: None,
        }
    }

    fn table_with_zone(ith: i64) -> ZoneTable {
        let mut zones = ZoneTable::new();
        zones.insert(
            ith,
            Zone::from_info(&ZoneInfo {
                ith: ZoneId(ith),
                enabled: true,
                smart: Some("SMART".into()),
                name: Some(format!("zone {}", ith)),
            }),
        );
        zones
    }

    #[test]
    fn splits_past_and_coming_runs() {
        let mut zones = table_with_zone(1);
        let schedules = vec![
            schedule(1, ScheduleStatus::Executed, Some(dt(2022, 1, 1, 0, 0))),
            schedule(1, ScheduleStatus::Valid, Some(dt(2099, 1, 1, 0, 0))),
        ];
        group_schedules_by_zone(&mut zones, &schedules, dt(2023, 6, 15, 12, 0));

        let zone = &zones[&1];
        assert_eq!(zone.last_run().unwrap().status, ScheduleStatus::Executed);
        assert_eq!(zone.last_run().unwrap().start_time, Some(dt(2022, 1, 1, 0, 0)));
        assert_eq!(zone.next_run().unwrap().status, ScheduleStatus::Valid);
        assert_eq!(zone.next_run().unwrap().start_time, Some(dt(2099, 1, 1, 0, 0)));
    }

    #[test]
    fn past_runs_are_most_recent_first_and_include_executing() {
        let mut zones = table_with_zone(1);
        let schedules = vec![
            schedule(1, ScheduleStatus::Executed, Some(dt(2023, 3, 1, 6, 0))),
            schedule(1, ScheduleStatus::Executing, Some(dt(2023, 3, 3, 6, 0))),
            schedule(1, ScheduleStatus::Executed, Some(dt(2023, 3, 2, 6, 0))),
        ];
        group_schedules_by_zone(&mut zones, &schedules, dt(2023, 3, 3, 7, 0));

        let starts: Vec<_> = zones[&1]
            .past_schedules
            .iter()
            .map(|s| s.start_time.unwrap())
            .collect();
        assert_eq!(
            starts,
            vec![dt(2023, 3, 3, 6, 0), dt(2023, 3, 2, 6, 0), dt(2023, 3, 1, 6, 0)]
        );
        assert_eq!(zones[&1].last_run().unwrap().status, ScheduleStatus::Executing);
    }

    #[test]
    fn coming_runs_exclude_past_valid_and_standby() {
        let mut zones = table_with_zone(1);
        let now = dt(2023, 6, 15, 12, 0);
        let schedules = vec![
            schedule(1, ScheduleStatus::Valid, Some(dt(2023, 6, 14, 6, 0))),
            schedule(1, ScheduleStatus::Standby, Some(dt(2023, 6, 16, 6, 0))),
            schedule(1, ScheduleStatus::Valid, Some(dt(2023, 6, 17, 6, 0))),
            schedule(1, ScheduleStatus::Valid, Some(dt(2023, 6, 16, 6, 0))),
        ];
        group_schedules_by_zone(&mut zones, &schedules, now);

        let starts: Vec<_> = zones[&1]
            .coming_schedules
            .iter()
            .map(|s| s.start_time.unwrap())
            .collect();
        assert_eq!(starts, vec![dt(2023, 6, 16, 6, 0), dt(2023, 6, 17, 6, 0)]);
    }

    #[test]
    fn start_exactly_now_is_not_coming() {
        let mut zones = table_with_zone(1);
        let now = dt(2023, 6, 15, 12, 0);
        let schedules = vec![schedule(1, ScheduleStatus::Valid, Some(now))];
        group_schedules_by_zone(&mut zones, &schedules, now);
        assert!(zones[&1].next_run().is_none());
    }

    #[test]
    fn equal_start_times_keep_input_order() {
        let mut zones = table_with_zone(1);
        let start = dt(2023, 3, 1, 6, 0);
        let mut first = schedule(1, ScheduleStatus::Executed, Some(start));
        first.id = Some(100);
        let mut second = schedule(1, ScheduleStatus::Executed, Some(start));
        second.id = Some(200);
        group_schedules_by_zone(&mut zones, &[first, second], dt(2023, 3, 2, 0, 0));

        let ids: Vec<_> = zones[&1].past_schedules.iter().map(|s| s.id.unwrap()).collect();
        assert_eq!(ids, vec![100, 200]);
    }

    #[test]
    fn grouping_replaces_previous_lists() {
        let mut zones = table_with_zone(1);
        let first = vec![schedule(1, ScheduleStatus::Executed, Some(dt(2023, 3, 1, 6, 0)))];
        group_schedules_by_zone(&mut zones, &first, dt(2023, 3, 2, 0, 0));
        assert_eq!(zones[&1].past_schedules.len(), 1);

        group_schedules_by_zone(&mut zones, &[], dt(2023, 3, 2, 0, 0));
        assert!(zones[&1].past_schedules.is_empty());
        assert!(zones[&1].last_run().is_none());
    }

    #[test]
    fn schedules_of_other_zones_are_ignored() {
        let mut zones = table_with_zone(2);
        let schedules = vec![
            schedule(1, ScheduleStatus::Executed, Some(dt(2023, 3, 1, 6, 0))),
            schedule(2, ScheduleStatus::Executed, Some(dt(2023, 3, 2, 6, 0))),
        ];
        group_schedules_by_zone(&mut zones, &schedules, dt(2023, 3, 3, 0, 0));
        assert_eq!(zones[&2].past_schedules.len(), 1);
        assert_eq!(zones[&2].last_run().unwrap().start_time, Some(dt(2023, 3, 2, 6, 0)));
    }

    #[test]
    fn moistures_are_most_recent_first_per_zone() {
        let mut zones = table_with_zone(1);
        let moistures = vec![
            Moisture {
                zone: ZoneId(1),
                moisture: Some(40.0),
                date: NaiveDate::from_ymd_opt(2023, 3, 27),
            },
            Moisture {
                zone: ZoneId(2),
                moisture: Some(80.0),
                date: NaiveDate::from_ymd_opt(2023, 3, 29),
            },
            Moisture {
                zone: ZoneId(1),
                moisture: Some(43.0),
                date: NaiveDate::from_ymd_opt(2023, 3, 29),
            },
        ];
        group_moistures_by_zone(&mut zones, &moistures);

        let zone = &zones[&1];
        assert_eq!(zone.moistures.len(), 2);
        assert_eq!(zone.latest_moisture().unwrap().moisture, Some(43.0));
    }

    #[test]
    fn empty_inputs_yield_no_data_not_errors() {
        let mut zones = table_with_zone(1);
        group_schedules_by_zone(&mut zones, &[], dt(2023, 3, 1, 0, 0));
        group_moistures_by_zone(&mut zones, &[]);
        let zone = &zones[&1];
        assert!(zone.last_run().is_none());
        assert!(zone.next_run().is_none());
        assert!(zone.latest_moisture().is_none());
    }

    #[test]
    fn disabled_zones_are_not_tracked() {
        let device = Device {
            name: Some("ctrl".into()),
            serial: None,
            status: None,
            version: None,
            sw_version: None,
            last_active: None,
            battery_level: None,
            zone_num: Some(2),
            zones: vec![
                ZoneInfo {
                    ith: ZoneId(1),
                    enabled: true,
                    smart: None,
                    name: Some("front".into()),
                },
                ZoneInfo {
                    ith: ZoneId(2),
                    enabled: false,
                    smart: None,
                    name: Some("back".into()),
                },
            ],
        };
        let zones = zones_from_device(&device);
        assert_eq!(zones.len(), 1);
        assert!(zones.contains_key(&1));
    }
}
