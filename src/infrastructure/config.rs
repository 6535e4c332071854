use crate::domain::mode::WindowSize;
use crate::domain::telemetry::{Deployment, IMPLICIT_SENSOR_ID};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub push: PushSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    #[serde(default)]
    pub deployment: Deployment,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    pub preload_limit: Option<usize>,
    pub filter_limit: Option<usize>,
    #[serde(default = "default_implicit_sensor")]
    pub implicit_sensor: String,
    pub fraction_digits: Option<usize>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PushSettings {
    /// NDJSON event stream. Inbound messages come from stdin when unset.
    pub url: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_window_size() -> usize {
    WindowSize::default().get()
}

fn default_implicit_sensor() -> String {
    IMPLICIT_SENSOR_ID.to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            deployment: Deployment::default(),
            window_size: default_window_size(),
            preload_limit: None,
            filter_limit: None,
            implicit_sensor: default_implicit_sensor(),
            fraction_digits: None,
        }
    }
}

impl DashboardSettings {
    /// Configured window, or the default when the value is not positive.
    pub fn window(&self) -> WindowSize {
        WindowSize::new(self.window_size).unwrap_or_else(|| {
            tracing::warn!(
                "Ignoring window_size {}, using {}",
                self.window_size,
                WindowSize::default().get()
            );
            WindowSize::default()
        })
    }

    pub fn preload_limit(&self) -> usize {
        self.preload_limit.unwrap_or(match self.deployment {
            Deployment::Single => 2000,
            Deployment::Multi => 1000,
        })
    }

    pub fn filter_limit(&self) -> usize {
        self.filter_limit.unwrap_or(match self.deployment {
            Deployment::Single => 2000,
            Deployment::Multi => 5000,
        })
    }

    pub fn fraction_digits(&self) -> usize {
        self.fraction_digits.unwrap_or(match self.deployment {
            Deployment::Single => 1,
            Deployment::Multi => 2,
        })
    }
}

/// Load `config/dashboard.*`, overridden by `DASHBOARD__SECTION__KEY`
/// environment variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse(toml: &str) -> DashboardConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse("");
        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert_eq!(config.dashboard.deployment, Deployment::Single);
        assert_eq!(config.dashboard.window().get(), 20);
        assert_eq!(config.dashboard.preload_limit(), 2000);
        assert_eq!(config.dashboard.implicit_sensor, "main");
        assert!(config.push.url.is_none());
    }

    #[test]
    fn test_multi_sensor_limits() {
        let config = parse(
            r#"
            [dashboard]
            deployment = "multi"
            window_size = 0
            filter_limit = 100

            [push]
            url = "http://bench.local/events"
            "#,
        );
        assert_eq!(config.dashboard.deployment, Deployment::Multi);
        assert_eq!(config.dashboard.window().get(), 20);
        assert_eq!(config.dashboard.preload_limit(), 1000);
        assert_eq!(config.dashboard.filter_limit(), 100);
        assert_eq!(config.dashboard.fraction_digits(), 2);
        assert_eq!(config.push.url.as_deref(), Some("http://bench.local/events"));
    }
}
