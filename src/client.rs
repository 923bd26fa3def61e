//! Standalone HTTP client for the Netro Public API (NPA).
//!
//! - Blocking client using `ureq` (no async).
//! - Uses existing models in `crate::models::netro`.
//! - One public method per NPA endpoint; GET endpoints pass parameters in the
//!   query string, POST endpoints as URL-encoded form fields.
//!
//! Response handling
//! - Every endpoint returns the same envelope; the vendor may report an
//!   application error (`status = "ERROR"`) with any HTTP status code, so the
//!   envelope is inspected before the HTTP status.

use chrono::{NaiveDate, NaiveTime};
use http::StatusCode;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::netro::*;

pub const NETRO_BASE_URL: &str = "https://api.netrohome.com/npa/v1/";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug)]
pub enum NetroError {
    /// The vendor envelope reported `status = "ERROR"`; carries the first
    /// reported error's code and message.
    Api { code: i64, message: String },
    /// Non-2xx HTTP exchange without a vendor error envelope to explain it.
    Http { status: u16, body: String },
    /// Response body could not be decoded into the expected shape.
    Decode(String),
    /// The request never completed (DNS, TLS, connection failures).
    Transport(String),
}

impl core::fmt::Display for NetroError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NetroError::Api { code, message } => write!(f, "npa error #{}: {}", code, message),
            NetroError::Http { status, body } => {
                match StatusCode::from_u16(*status).ok().and_then(|s| s.canonical_reason()) {
                    Some(reason) => write!(f, "http {} {}: {}", status, reason, body),
                    None => write!(f, "http {}: {}", status, body),
                }
            }
            NetroError::Decode(s) => write!(f, "decode error: {}", s),
            NetroError::Transport(s) => write!(f, "transport error: {}", s),
        }
    }
}

impl std::error::Error for NetroError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Compile-time pairing of an HTTP method and an endpoint path suffix.
#[derive(Debug, Clone, Copy)]
struct Endpoint {
    method: HttpMethod,
    path: &'static str,
}

impl Endpoint {
    const fn get(path: &'static str) -> Self {
        Endpoint {
            method: HttpMethod::Get,
            path,
        }
    }

    const fn post(path: &'static str) -> Self {
        Endpoint {
            method: HttpMethod::Post,
            path,
        }
    }
}

const INFO: Endpoint = Endpoint::get("info.json");
const SCHEDULES: Endpoint = Endpoint::get("schedules.json");
const MOISTURES: Endpoint = Endpoint::get("moistures.json");
const SENSOR_DATA: Endpoint = Endpoint::get("sensor_data.json");
const EVENTS: Endpoint = Endpoint::get("events.json");
const REPORT_WEATHER: Endpoint = Endpoint::post("report_weather.json");
const SET_MOISTURE: Endpoint = Endpoint::post("set_moisture.json");
const WATER: Endpoint = Endpoint::post("water.json");
const STOP_WATER: Endpoint = Endpoint::post("stop_water.json");
const NO_WATER: Endpoint = Endpoint::post("no_water.json");
const SET_STATUS: Endpoint = Endpoint::post("set_status.json");

type Param = (&'static str, String);

/// Weather observations for `report_weather`. Fields left at `None` — and
/// numeric values equal to zero — are omitted from the request entirely;
/// the NPA treats an absent field and an explicit zero differently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherReport {
    pub condition: Option<WeatherCondition>,
    /// Rainfall amount, mm.
    pub rain: Option<f64>,
    /// Rain probability, percent.
    pub rain_prob: Option<f64>,
    /// Average temperature, Celsius.
    pub temp: Option<f64>,
    pub t_min: Option<f64>,
    pub t_max: Option<f64>,
    /// Dew point, Celsius.
    pub t_dew: Option<f64>,
    /// Wind speed, m/s.
    pub wind_speed: Option<f64>,
    /// Relative humidity, percent.
    pub humidity: Option<f64>,
    /// Atmospheric pressure, hPa.
    pub pressure: Option<f64>,
}

pub struct NetroClient {
    agent: ureq::Agent,
    base_url: String,
}

impl Default for NetroClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NetroClient {
    /// Client against the production NPA.
    pub fn new() -> Self {
        Self::with_base_url(NETRO_BASE_URL)
    }

    /// Client against an alternative base URL (e.g. a local simulator).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        NetroClient {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(
        &self,
        url: &str,
        method: HttpMethod,
        params: &[Param],
    ) -> Result<(u16, String), NetroError> {
        let result = match method {
            HttpMethod::Get => {
                let mut req = self.agent.get(url).set("Accept", "application/json");
                for (k, v) in params {
                    req = req.query(k, v);
                }
                req.call()
            }
            HttpMethod::Post => {
                let form: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
                self.agent
                    .post(url)
                    .set("Accept", "application/json")
                    .send_form(&form)
            }
        };
        match result {
            Ok(resp) => {
                let status = resp.status();
                let body = resp
                    .into_string()
                    .map_err(|e| NetroError::Transport(e.to_string()))?;
                Ok((status, body))
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_else(|_| String::from("<no body>"));
                Ok((status, body))
            }
            Err(ureq::Error::Transport(t)) => Err(NetroError::Transport(t.to_string())),
        }
    }

    fn execute<T: DeserializeOwned + Default>(
        &self,
        op: &'static str,
        endpoint: Endpoint,
        params: &[Param],
    ) -> Result<Envelope<T>, NetroError> {
        let url = self.url(endpoint.path);
        debug!("{} --> url = {}", op, url);
        debug!("{} --> params = {:?}", op, params);
        let (status, body) = self.request(&url, endpoint.method, params)?;
        debug!(
            "{} --> {} request status code = {}, body = {}",
            op,
            endpoint.method.as_str(),
            status,
            body
        );
        normalize(status, &body)
    }

    /// Current device information for the controller or sensor behind `key`.
    pub fn get_info(&self, key: &str) -> Result<Envelope<InfoPayload>, NetroError> {
        self.execute("get_info", INFO, &base_params(key))
    }

    /// Watering schedules, optionally restricted to zones and a date window.
    pub fn get_schedules(
        &self,
        key: &str,
        zones: Option<&[ZoneId]>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Envelope<SchedulesPayload>, NetroError> {
        self.execute(
            "get_schedules",
            SCHEDULES,
            &zoned_range_params(key, zones, start_date, end_date),
        )
    }

    /// Per-zone moisture estimates, optionally restricted like schedules.
    pub fn get_moistures(
        &self,
        key: &str,
        zones: Option<&[ZoneId]>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Envelope<MoisturesPayload>, NetroError> {
        self.execute(
            "get_moistures",
            MOISTURES,
            &zoned_range_params(key, zones, start_date, end_date),
        )
    }

    /// Readings reported by a soil sensor key.
    pub fn get_sensor_data(
        &self,
        key: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Envelope<SensorDataPayload>, NetroError> {
        let mut params = base_params(key);
        push_date(&mut params, "start_date", start_date);
        push_date(&mut params, "end_date", end_date);
        self.execute("get_sensor_data", SENSOR_DATA, &params)
    }

    /// Device events, optionally filtered by kind and date window.
    pub fn get_events(
        &self,
        key: &str,
        event: Option<EventType>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Envelope<EventsPayload>, NetroError> {
        self.execute("get_events", EVENTS, &events_params(key, event, start_date, end_date))
    }

    /// Feed locally observed weather to the smart-watering planner.
    pub fn report_weather(
        &self,
        key: &str,
        date: NaiveDate,
        report: &WeatherReport,
    ) -> Result<Ack, NetroError> {
        self.execute(
            "report_weather",
            REPORT_WEATHER,
            &report_weather_params(key, date, report),
        )
    }

    /// Override the moisture estimate (percent) of the given zones.
    pub fn set_moisture(&self, key: &str, moisture: i32, zones: &[ZoneId]) -> Result<Ack, NetroError> {
        let mut params = base_params(key);
        params.push(("moisture", moisture.to_string()));
        params.push(("zones", zone_set_param(zones)));
        self.execute("set_moisture", SET_MOISTURE, &params)
    }

    /// Start watering for `duration` minutes, optionally limited to zones,
    /// deferred by `delay` minutes or to a fixed start time.
    pub fn water(
        &self,
        key: &str,
        duration: i64,
        zones: Option<&[ZoneId]>,
        delay: Option<i64>,
        start_time: Option<NaiveTime>,
    ) -> Result<Ack, NetroError> {
        self.execute("water", WATER, &water_params(key, duration, zones, delay, start_time))
    }

    /// Stop any watering in progress.
    pub fn stop_water(&self, key: &str) -> Result<Ack, NetroError> {
        self.execute("stop_water", STOP_WATER, &base_params(key))
    }

    /// Suspend smart watering, optionally for a number of days (rounded to
    /// the nearest whole day).
    pub fn no_water(&self, key: &str, days: Option<f64>) -> Result<Ack, NetroError> {
        self.execute("no_water", NO_WATER, &no_water_params(key, days))
    }

    /// Enable or disable the device.
    pub fn set_status(&self, key: &str, status: OnOff) -> Result<Ack, NetroError> {
        let mut params = base_params(key);
        params.push(("status", status.code().to_string()));
        self.execute("set_status", SET_STATUS, &params)
    }
}

/// Minimal view of the envelope used to order the error checks before the
/// payload is decoded.
#[derive(Deserialize)]
struct EnvelopeProbe {
    status: ResponseStatus,
    #[serde(default)]
    errors: Vec<ApiError>,
}

/// Turn one HTTP exchange into the envelope or the matching error.
///
/// Check order matters: a vendor error envelope wins over a non-2xx HTTP
/// status, because the NPA reports structured errors with either.
fn normalize<T: DeserializeOwned + Default>(
    http_status: u16,
    body: &str,
) -> Result<Envelope<T>, NetroError> {
    let success = StatusCode::from_u16(http_status)
        .map(|s| s.is_success())
        .unwrap_or(false);

    let probe: EnvelopeProbe = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) if success => {
            return Err(NetroError::Decode(format!("undecodable response body: {}", e)));
        }
        Err(_) => {
            return Err(NetroError::Http {
                status: http_status,
                body: body.to_string(),
            });
        }
    };

    match probe.status {
        ResponseStatus::Error => match probe.errors.into_iter().next() {
            Some(first) => Err(NetroError::Api {
                code: first.code,
                message: first.message,
            }),
            None => Err(NetroError::Decode(
                "ERROR envelope with an empty errors list".to_string(),
            )),
        },
        ResponseStatus::Ok if !success => Err(NetroError::Http {
            status: http_status,
            body: body.to_string(),
        }),
        ResponseStatus::Ok => {
            let mut de = serde_json::Deserializer::from_str(body);
            serde_path_to_error::deserialize(&mut de).map_err(|e| {
                NetroError::Decode(format!("payload decode failed at {}: {}", e.path(), e.inner()))
            })
        }
    }
}

fn base_params(key: &str) -> Vec<Param> {
    vec![("key", key.to_string())]
}

/// Bracketed, comma-space-joined zone list (`[1, 2]`), ascending and deduped
/// so the serialization does not depend on caller ordering.
fn zone_set_param(zones: &[ZoneId]) -> String {
    let mut ids: Vec<i64> = zones.iter().map(|z| z.0).collect();
    ids.sort_unstable();
    ids.dedup();
    let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ");
    format!("[{}]", joined)
}

fn push_zone_set(params: &mut Vec<Param>, zones: Option<&[ZoneId]>) {
    if let Some(zs) = zones {
        if !zs.is_empty() {
            params.push(("zones", zone_set_param(zs)));
        }
    }
}

fn push_date(params: &mut Vec<Param>, name: &'static str, date: Option<NaiveDate>) {
    if let Some(d) = date {
        params.push((name, d.format(DATE_FORMAT).to_string()));
    }
}

fn push_nonzero(params: &mut Vec<Param>, name: &'static str, value: Option<f64>) {
    if let Some(v) = value {
        if v != 0.0 {
            params.push((name, v.to_string()));
        }
    }
}

fn zoned_range_params(
    key: &str,
    zones: Option<&[ZoneId]>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Vec<Param> {
    let mut params = base_params(key);
    push_zone_set(&mut params, zones);
    push_date(&mut params, "start_date", start_date);
    push_date(&mut params, "end_date", end_date);
    params
}

fn events_params(
    key: &str,
    event: Option<EventType>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Vec<Param> {
    let mut params = base_params(key);
    if let Some(kind) = event {
        params.push(("event", kind.code().to_string()));
    }
    push_date(&mut params, "start_date", start_date);
    push_date(&mut params, "end_date", end_date);
    params
}

fn report_weather_params(key: &str, date: NaiveDate, report: &WeatherReport) -> Vec<Param> {
    let mut params = base_params(key);
    params.push(("date", date.format(DATE_FORMAT).to_string()));
    if let Some(c) = report.condition {
        if c.code() != 0 {
            params.push(("condition", c.code().to_string()));
        }
    }
    push_nonzero(&mut params, "rain", report.rain);
    push_nonzero(&mut params, "rain_prob", report.rain_prob);
    push_nonzero(&mut params, "temp", report.temp);
    push_nonzero(&mut params, "t_min", report.t_min);
    push_nonzero(&mut params, "t_max", report.t_max);
    push_nonzero(&mut params, "t_dew", report.t_dew);
    push_nonzero(&mut params, "wind_speed", report.wind_speed);
    push_nonzero(&mut params, "humidity", report.humidity);
    push_nonzero(&mut params, "pressure", report.pressure);
    params
}

fn water_params(
    key: &str,
    duration: i64,
    zones: Option<&[ZoneId]>,
    delay: Option<i64>,
    start_time: Option<NaiveTime>,
) -> Vec<Param> {
    let mut params = base_params(key);
    params.push(("duration", duration.to_string()));
    push_zone_set(&mut params, zones);
    if let Some(d) = delay {
        if d > 0 {
            params.push(("delay", d.to_string()));
        }
    }
    if let Some(t) = start_time {
        params.push(("start_time", t.format(TIME_FORMAT).to_string()));
    }
    params
}

fn no_water_params(key: &str, days: Option<f64>) -> Vec<Param> {
    let mut params = base_params(key);
    if let Some(d) = days {
        params.push(("days", (d.round() as i64).to_string()));
    }
    params
}
