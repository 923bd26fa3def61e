//! Minimal runtime configuration helpers.
//! Device keys are the per-device serial strings issued by Netro.

use crate::client::NETRO_BASE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    /// Serial key of the sprinkler controller (`NPA_CTRL`).
    pub ctrl_key: Option<String>,
    /// Serial key of the soil sensor (`NPA_SENS`).
    pub sens_key: Option<String>,
    /// NPA base URL; `NETRO_BASE_URL` overrides it to target a simulator.
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let ctrl_key = env_value("NPA_CTRL");
        let sens_key = env_value("NPA_SENS");
        if ctrl_key.is_none() && sens_key.is_none() {
            return Err("Missing device key: set NPA_CTRL and/or NPA_SENS".to_string());
        }

        let base_url = env_value("NETRO_BASE_URL").unwrap_or_else(|| NETRO_BASE_URL.to_string());

        Ok(Config {
            ctrl_key,
            sens_key,
            base_url,
        })
    }

    /// The controller key, or an actionable error for commands that need it.
    pub fn ctrl_key(&self) -> Result<&str, String> {
        self.ctrl_key
            .as_deref()
            .ok_or_else(|| "controller key required: set NPA_CTRL".to_string())
    }

    /// The sensor key, or an actionable error for commands that need it.
    pub fn sens_key(&self) -> Result<&str, String> {
        self.sens_key
            .as_deref()
            .ok_or_else(|| "sensor key required: set NPA_SENS".to_string())
    }
}

fn env_value(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}
