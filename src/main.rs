pub mod models {
    pub mod netro;
}

pub mod client;
pub mod config;
pub mod services {
    pub mod summary;
    pub mod zones;
}
pub mod utils;

use crate::client::NetroClient;
use crate::config::Config;
use crate::services::summary;
use log::{error, info};
use std::path::{Path, PathBuf};

const USAGE: &str = "\
usage : netro-npa [--env-file <path>] -e <command> [options]
commands : getinfo | getschedules | getmoistures | getsensordata | getevents |
           setstatus | setmoisture | water | stopwater | nowater
options :
  -d <ctrl|sens>        device key for getinfo (default: every configured key)
  -s <on|off>           status to set with setstatus
  -z <ids>              comma-separated zone ids, e.g. 1,2
  -m <percent>          moisture to set with setmoisture
  -u <minutes>          watering duration for water
  --delay <minutes>     defer watering by this many minutes
  --start-time <HH:MM>  fixed watering start time
  --days <days>         suspension length for nowater
  --event <1-4>         event type filter for getevents
  --from <YYYY-MM-DD>   window start for data queries
  --to <YYYY-MM-DD>     window end for data queries
Controller commands use the NPA_CTRL key, getsensordata uses NPA_SENS.";

#[derive(Debug, Default)]
struct CliArgs {
    env_file: Option<PathBuf>,
    command: Option<String>,
    device: Option<String>,
    status: Option<String>,
    zones: Option<String>,
    moisture: Option<String>,
    duration: Option<String>,
    delay: Option<String>,
    start_time: Option<String>,
    days: Option<String>,
    event: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

fn required_value(argv: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    argv.next().ok_or_else(|| format!("`{}` requires a value", flag))
}

fn parse_cli() -> Result<CliArgs, String> {
    let mut argv = std::env::args().skip(1);
    let mut args = CliArgs::default();

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            "--env-file" => args.env_file = Some(PathBuf::from(required_value(&mut argv, "--env-file")?)),
            s if s.starts_with("--env-file=") => {
                let path = &s["--env-file=".len()..];
                if path.is_empty() {
                    return Err("`--env-file` requires a path argument".to_string());
                }
                args.env_file = Some(PathBuf::from(path));
            }
            "-e" | "--execute" => args.command = Some(required_value(&mut argv, "-e")?),
            "-d" | "--device" => args.device = Some(required_value(&mut argv, "-d")?),
            "-s" | "--status" => args.status = Some(required_value(&mut argv, "-s")?),
            "-z" | "--zones" => args.zones = Some(required_value(&mut argv, "-z")?),
            "-m" | "--moisture" => args.moisture = Some(required_value(&mut argv, "-m")?),
            "-u" | "--duration" => args.duration = Some(required_value(&mut argv, "-u")?),
            "--delay" => args.delay = Some(required_value(&mut argv, "--delay")?),
            "--start-time" => args.start_time = Some(required_value(&mut argv, "--start-time")?),
            "--days" => args.days = Some(required_value(&mut argv, "--days")?),
            "--event" => args.event = Some(required_value(&mut argv, "--event")?),
            "--from" => args.from = Some(required_value(&mut argv, "--from")?),
            "--to" => args.to = Some(required_value(&mut argv, "--to")?),
            other => return Err(format!("unrecognised argument: {}", other)),
        }
    }

    // Load the explicit env file, else a ./.env when present.
    match &args.env_file {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("env file not found: {}", path.display()));
            }
            load_env_file(path)?;
        }
        None => {
            let default_path = Path::new(".env");
            if default_path.is_file() {
                load_env_file(default_path)?;
                args.env_file = Some(default_path.to_path_buf());
            }
        }
    }

    Ok(args)
}

fn load_env_file(path: &Path) -> Result<(), String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let assignment = trimmed
            .strip_prefix("export ")
            .map(str::trim_start)
            .unwrap_or(trimmed);
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("{}:{}: missing '=' in assignment", path.display(), index + 1))?;
        let key = key.trim();
        if key.is_empty() || key.chars().any(|c| c.is_whitespace()) {
            return Err(format!("{}:{}: invalid variable name", path.display(), index + 1));
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');

        // Preserve any value that was already supplied via the process environment.
        if std::env::var_os(key).is_none() {
            // Updating process-level environment variables is unsafe on some targets.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }

    Ok(())
}

fn run(args: &CliArgs) -> Result<(), String> {
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (base_url={}, ctrl_key={}, sens_key={})",
        cfg.base_url,
        if cfg.ctrl_key.is_some() { "set" } else { "-" },
        if cfg.sens_key.is_some() { "set" } else { "-" },
    );

    let client = NetroClient::with_base_url(cfg.base_url.clone());

    let command = args
        .command
        .as_deref()
        .ok_or_else(|| format!("missing command: use -e <command>\n{}", USAGE))?;

    let zones = args.zones.as_deref().map(utils::parse_zones).transpose()?;
    let from = args.from.as_deref().map(utils::parse_date).transpose()?;
    let to = args.to.as_deref().map(utils::parse_date).transpose()?;

    match command {
        "getinfo" => match args.device.as_deref() {
            Some("ctrl") => {
                summary::show_info(&client, cfg.ctrl_key()?)?;
            }
            Some("sens") => {
                summary::show_info(&client, cfg.sens_key()?)?;
            }
            Some(other) => return Err(format!("unknown device selector: {}", other)),
            None => {
                if let Some(key) = cfg.ctrl_key.as_deref() {
                    summary::show_info(&client, key)?;
                }
                if let Some(key) = cfg.sens_key.as_deref() {
                    summary::show_info(&client, key)?;
                }
            }
        },
        "getschedules" => {
            summary::show_schedules(&client, cfg.ctrl_key()?, zones.as_deref(), from, to)?;
        }
        "getmoistures" => {
            summary::show_moistures(&client, cfg.ctrl_key()?, zones.as_deref(), from, to)?;
        }
        "getsensordata" => {
            summary::show_sensor_data(&client, cfg.sens_key()?, from, to)?;
        }
        "getevents" => {
            let kind = args.event.as_deref().map(utils::parse_event_type).transpose()?;
            summary::show_events(&client, cfg.ctrl_key()?, kind, from, to)?;
        }
        "setstatus" => {
            let status = args
                .status
                .as_deref()
                .ok_or_else(|| "status missing: use -s <on|off>".to_string())?;
            summary::set_status(&client, cfg.ctrl_key()?, utils::parse_on_off(status)?)?;
        }
        "setmoisture" => {
            let moisture = args
                .moisture
                .as_deref()
                .ok_or_else(|| "moisture missing: use -m <percent>".to_string())?;
            let moisture = utils::parse_i32(moisture, "moisture")?;
            let zones = zones.ok_or_else(|| "zones missing: use -z <ids>".to_string())?;
            summary::set_moisture(&client, cfg.ctrl_key()?, moisture, &zones)?;
        }
        "water" => {
            let duration = args
                .duration
                .as_deref()
                .ok_or_else(|| "duration missing: use -u <minutes>".to_string())?;
            let duration = utils::parse_i64(duration, "duration")?;
            let delay = args
                .delay
                .as_deref()
                .map(|d| utils::parse_i64(d, "delay"))
                .transpose()?;
            let start_time = args.start_time.as_deref().map(utils::parse_time).transpose()?;
            summary::water(&client, cfg.ctrl_key()?, duration, zones.as_deref(), delay, start_time)?;
        }
        "stopwater" => {
            summary::stop_water(&client, cfg.ctrl_key()?)?;
        }
        "nowater" => {
            let days = args
                .days
                .as_deref()
                .map(|d| utils::parse_f64(d, "days"))
                .transpose()?;
            summary::no_water(&client, cfg.ctrl_key()?, days)?;
        }
        other => return Err(format!("unknown command: {}\n{}", other, USAGE)),
    }

    Ok(())
}

fn main() {
    let args = match parse_cli() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(2);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(path) = args.env_file.as_ref() {
        info!("Environment loaded from .env file: {}", path.display());
    }

    info!(
        "netro-npa {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(&args) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
