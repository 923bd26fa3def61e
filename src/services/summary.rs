//! Interactive console handlers: fetch via the client, aggregate per zone,
//! and log human-oriented summaries. Raw records go to `debug!`, findings to
//! `info!`.

use chrono::{NaiveDate, NaiveTime, Utc};
use log::{debug, info};

use crate::client::NetroClient;
use crate::models::netro::{EventType, Meta, OnOff, Schedule, ZoneId};
use crate::services::zones::{group_moistures_by_zone, group_schedules_by_zone, zones_from_device, ZoneTable};

fn log_quota(meta: Option<&Meta>) {
    if let Some(remaining) = meta.and_then(|m| m.token_remaining) {
        info!("token_remaining = {}", remaining);
    }
}

fn opt_str(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn opt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Where and when a run happens in the device's own timezone.
fn local_run_label(schedule: &Schedule) -> String {
    let date = schedule
        .local_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{} at {}", date, opt_str(&schedule.local_start_time))
}

/// Fetch device info, log the main data and return the zone table (empty for
/// soil sensors, which have no zones).
pub fn show_info(client: &NetroClient, key: &str) -> Result<ZoneTable, String> {
    let envelope = client.get_info(key).map_err(|e| format!("get_info failed: {}", e))?;
    log_quota(envelope.meta.as_ref());

    if let Some(device) = envelope.data.device.as_ref() {
        info!("controller \"{}\": status = {}", opt_str(&device.name), opt_str(&device.status));
        if let Some(battery) = device.battery_level {
            info!("battery level = {}", battery);
        }
        let zones = zones_from_device(device);
        for zone in zones.values() {
            info!(
                "zone [{}]: ({}, enabled, {})",
                zone.ith.0,
                opt_str(&zone.name),
                opt_str(&zone.smart)
            );
        }
        Ok(zones)
    } else if let Some(sensor) = envelope.data.sensor.as_ref() {
        info!("sensor \"{}\": status = {}", opt_str(&sensor.name), opt_str(&sensor.status));
        if let Some(battery) = sensor.battery_level {
            info!("battery level = {}", battery);
        }
        Ok(ZoneTable::new())
    } else {
        Err("info payload contains neither a device nor a sensor".to_string())
    }
}

/// Fetch schedules and log the last and next watering per zone.
pub fn show_schedules(
    client: &NetroClient,
    key: &str,
    zone_filter: Option<&[ZoneId]>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), String> {
    let mut zones = show_info(client, key)?;

    let envelope = client
        .get_schedules(key, zone_filter, start_date, end_date)
        .map_err(|e| format!("get_schedules failed: {}", e))?;
    log_quota(envelope.meta.as_ref());

    let schedules = envelope.data.schedules;
    for schedule in &schedules {
        debug!("schedule: {:?}", schedule);
    }
    group_schedules_by_zone(&mut zones, &schedules, Utc::now().naive_utc());

    for zone in zones.values() {
        match zone.last_run() {
            Some(run) => match run.start_time {
                Some(start) => info!("zone [{}]: last watering ran at {} (UTC)", zone.ith.0, start),
                None => info!("zone [{}]: last watering has no recorded start time", zone.ith.0),
            },
            None => info!("zone [{}]: no past watering recorded", zone.ith.0),
        }
        match zone.next_run() {
            Some(run) => info!("zone [{}]: next watering {}", zone.ith.0, local_run_label(run)),
            None => info!("zone [{}]: no upcoming watering", zone.ith.0),
        }
    }
    Ok(())
}

/// Fetch moisture readings and log the latest value per zone.
pub fn show_moistures(
    client: &NetroClient,
    key: &str,
    zone_filter: Option<&[ZoneId]>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), String> {
    let mut zones = show_info(client, key)?;

    let envelope = client
        .get_moistures(key, zone_filter, start_date, end_date)
        .map_err(|e| format!("get_moistures failed: {}", e))?;
    log_quota(envelope.meta.as_ref());

    let moistures = envelope.data.moistures;
    for moisture in &moistures {
        debug!("moisture: {:?}", moisture);
    }
    group_moistures_by_zone(&mut zones, &moistures);

    for zone in zones.values() {
        match zone.latest_moisture() {
            Some(latest) => {
                let date = latest.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
                info!(
                    "zone [{}]: moisture {}% estimated on {}",
                    zone.ith.0,
                    latest.moisture.unwrap_or(0.0),
                    date
                );
            }
            None => info!("zone [{}]: no moisture info", zone.ith.0),
        }
    }
    Ok(())
}

/// Fetch and log readings of a soil sensor key.
pub fn show_sensor_data(
    client: &NetroClient,
    key: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), String> {
    let envelope = client
        .get_sensor_data(key, start_date, end_date)
        .map_err(|e| format!("get_sensor_data failed: {}", e))?;
    log_quota(envelope.meta.as_ref());

    let samples = envelope.data.sensor_data;
    if samples.is_empty() {
        info!("no sensor readings in the requested window");
        return Ok(());
    }
    for sample in &samples {
        debug!("sensor sample: {:?}", sample);
        let date = sample.local_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        info!(
            "{} {}: moisture = {}%, temp = {} C, sunlight = {} lux",
            date,
            opt_str(&sample.local_time),
            opt_num(sample.moisture),
            opt_num(sample.celsius_degree),
            opt_num(sample.sunlight)
        );
    }
    Ok(())
}

/// Fetch and log device events.
pub fn show_events(
    client: &NetroClient,
    key: &str,
    kind: Option<EventType>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), String> {
    let envelope = client
        .get_events(key, kind, start_date, end_date)
        .map_err(|e| format!("get_events failed: {}", e))?;
    log_quota(envelope.meta.as_ref());

    let events = envelope.data.events;
    if events.is_empty() {
        info!("no events in the requested window");
        return Ok(());
    }
    for event in &events {
        let time = event.time.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string());
        info!("{} {:?}: {}", time, event.event, opt_str(&event.message));
    }
    Ok(())
}

pub fn set_status(client: &NetroClient, key: &str, status: OnOff) -> Result<(), String> {
    let ack = client
        .set_status(key, status)
        .map_err(|e| format!("set_status failed: {}", e))?;
    info!("set_status {:?} acknowledged", status);
    log_quota(ack.meta.as_ref());
    Ok(())
}

pub fn set_moisture(client: &NetroClient, key: &str, moisture: i32, zones: &[ZoneId]) -> Result<(), String> {
    let ack = client
        .set_moisture(key, moisture, zones)
        .map_err(|e| format!("set_moisture failed: {}", e))?;
    info!("set_moisture {}% acknowledged", moisture);
    log_quota(ack.meta.as_ref());
    Ok(())
}

pub fn water(
    client: &NetroClient,
    key: &str,
    duration: i64,
    zones: Option<&[ZoneId]>,
    delay: Option<i64>,
    start_time: Option<NaiveTime>,
) -> Result<(), String> {
    let ack = client
        .water(key, duration, zones, delay, start_time)
        .map_err(|e| format!("water failed: {}", e))?;
    info!("water for {} minute(s) acknowledged", duration);
    log_quota(ack.meta.as_ref());
    Ok(())
}

pub fn stop_water(client: &NetroClient, key: &str) -> Result<(), String> {
    let ack = client.stop_water(key).map_err(|e| format!("stop_water failed: {}", e))?;
    info!("stop_water acknowledged");
    log_quota(ack.meta.as_ref());
    Ok(())
}

pub fn no_water(client: &NetroClient, key: &str, days: Option<f64>) -> Result<(), String> {
    let ack = client.no_water(key, days).map_err(|e| format!("no_water failed: {}", e))?;
    match days {
        Some(d) => info!("no_water for {} day(s) acknowledged", d),
        None => info!("no_water acknowledged"),
    }
    log_quota(ack.meta.as_ref());
    Ok(())
}
