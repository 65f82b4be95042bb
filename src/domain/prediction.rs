// Hourly prediction data for the predictive chart mode
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPrediction {
    pub timestamp: String,
    #[serde(default)]
    pub predicted_soc: Option<f64>,
    #[serde(default)]
    pub predicted_current: Option<f64>,
    #[serde(default)]
    pub predicted_power: Option<f64>,
    #[serde(default)]
    pub clouds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionMetadata {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionSet {
    pub predictions: Vec<HourlyPrediction>,
    #[serde(default)]
    pub metadata: PredictionMetadata,
}
