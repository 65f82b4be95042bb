use crate::application::refresh_controller::RefreshSettings;
use crate::application::scale_builder::SceneSettings;
use crate::domain::viewport::{LodThresholds, ViewportSettings};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub chart: ChartSettings,
    pub lod: LodSettings,
    pub analytics: AnalyticsSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub endpoints: EndpointTemplates,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 30,
            endpoints: EndpointTemplates::default(),
        }
    }
}

/// Collaborator paths, with `${var}` placeholders.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointTemplates {
    pub timeline: String,
    pub weather_sync: String,
    pub analytics: String,
    pub predictions: String,
}

impl Default for EndpointTemplates {
    fn default() -> Self {
        Self {
            timeline: "${base}/systems/${system}/timeline".to_string(),
            weather_sync: "${base}/systems/${system}/weather/sync".to_string(),
            analytics: "${base}/analytics".to_string(),
            predictions: "${base}/systems/${system}/predictions".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub total_width: f64,
    pub height: f64,
    pub min_brush_width: f64,
    pub tooltip_threshold_ratio: f64,
    pub keyboard_zoom_factor: f64,
    pub max_zoom_percentage: f64,
    pub marker_radius: f64,
    pub max_x_ticks: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            total_width: 1200.0,
            height: 400.0,
            min_brush_width: 10.0,
            tooltip_threshold_ratio: 0.05,
            keyboard_zoom_factor: 1.5,
            max_zoom_percentage: 10_000.0,
            marker_radius: 4.0,
            max_x_ticks: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LodSettings {
    /// Zoom ratios at which the auto bucket steps from 1440 down to raw.
    pub thresholds: LodThresholds,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub local_min_records: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            local_min_records: 6,
        }
    }
}

impl EngineConfig {
    pub fn viewport_settings(&self) -> ViewportSettings {
        ViewportSettings {
            min_brush_width: self.chart.min_brush_width,
            keyboard_zoom_factor: self.chart.keyboard_zoom_factor,
            max_zoom_percentage: self.chart.max_zoom_percentage,
            lod_thresholds: self.lod.thresholds,
        }
    }

    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            height: self.chart.height,
            tooltip_threshold_ratio: self.chart.tooltip_threshold_ratio,
            marker_radius: self.chart.marker_radius,
            max_x_ticks: self.chart.max_x_ticks,
            ..SceneSettings::default()
        }
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            local_min_records: self.analytics.local_min_records,
        }
    }
}

/// `config/engine.*` if present, then `BATTERY_TIMELINE__SECTION__KEY` overrides.
pub fn load_engine_config() -> anyhow::Result<EngineConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/engine").required(false))
        .add_source(
            config::Environment::with_prefix("BATTERY_TIMELINE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in an endpoint string
pub fn prepare_endpoint(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_endpoint() {
        let mut vars = HashMap::new();
        vars.insert("base", "http://bms.local/api".to_string());
        vars.insert("system", "rack%201".to_string());

        let result = prepare_endpoint("${base}/systems/${system}/timeline", &vars);

        assert_eq!(result, "http://bms.local/api/systems/rack%201/timeline");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://bms.local/api"

            [chart]
            min_brush_width = 24.0

            [lod]
            thresholds = [1.5, 4.0, 12.0, 40.0, 80.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://bms.local/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.chart.tooltip_threshold_ratio, 0.05);
        assert_eq!(config.analytics.local_min_records, 6);

        let viewport = config.viewport_settings();
        assert_eq!(viewport.min_brush_width, 24.0);
        assert_eq!(viewport.lod_thresholds, LodThresholds([1.5, 4.0, 12.0, 40.0, 80.0]));
        assert_eq!(config.scene_settings().y_tick_count, 5);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.chart.max_zoom_percentage, 10_000.0);
        assert_eq!(config.refresh_settings(), RefreshSettings::default());
    }
}
