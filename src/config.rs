use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub events: EventsConfig,
    pub demo: DemoConfig,
}

/// Where setpoint-change events are broadcast (best effort, UDP).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub host: String,
    pub port: u16,
    pub udp_disabled: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 41234,
            udp_disabled: false,
        }
    }
}

/// Input files for the demonstration driver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub topology_path: String,
    pub measurement_paths: Vec<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            topology_path: "config/topology.json".to_string(),
            measurement_paths: vec![
                "input/measurements_cycle1.json".to_string(),
                "input/measurements_cycle2.json".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("GCC__").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_a_missing_config_file() {
        let cfg = Config::default();
        assert_eq!(cfg.events.host, "127.0.0.1");
        assert_eq!(cfg.events.port, 41234);
        assert!(!cfg.events.udp_disabled);
        assert_eq!(cfg.demo.measurement_paths.len(), 2);
    }
}
