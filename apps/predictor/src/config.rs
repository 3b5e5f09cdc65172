use std::{fs, path::Path, time::Duration};

use client_core::ClientOptions;
use serde::Deserialize;
use shared::domain::{InputState, DEFAULT_GEAR, DEFAULT_THROTTLE};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "predictor.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub service_url: String,
    pub request_timeout_secs: Option<u64>,
    pub default_throttle: f64,
    pub default_gear: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:3000".into(),
            request_timeout_secs: None,
            default_throttle: DEFAULT_THROTTLE,
            default_gear: i64::from(DEFAULT_GEAR),
        }
    }
}

impl Settings {
    pub fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::new(self.service_url.clone());
        match self.request_timeout_secs {
            Some(0) | None => options,
            Some(secs) => options.with_timeout(Duration::from_secs(secs)),
        }
    }

    pub fn initial_input(&self) -> InputState {
        InputState::new(self.default_throttle, self.default_gear)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    service_url: Option<String>,
    request_timeout_secs: Option<u64>,
    default_throttle: Option<f64>,
    default_gear: Option<i64>,
}

pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        apply_file(&mut settings, &raw, config_path);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str, origin: &Path) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(path = %origin.display(), error = %err, "ignoring unreadable config file");
            return;
        }
    };

    if let Some(v) = file_cfg.service_url {
        settings.service_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = file_cfg.default_throttle {
        settings.default_throttle = v;
    }
    if let Some(v) = file_cfg.default_gear {
        settings.default_gear = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PREDICTOR_SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = lookup("APP__SERVICE_URL") {
        settings.service_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = Some(parsed),
            Err(_) => warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    if let Some(v) = lookup("APP__DEFAULT_THROTTLE") {
        if let Ok(parsed) = v.parse::<f64>() {
            settings.default_throttle = parsed;
        }
    }
    if let Some(v) = lookup("APP__DEFAULT_GEAR") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.default_gear = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
