// Analytics report shared by the local fallback and the remote collaborator
use super::metric::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyAverage {
    pub hour: u32,
    pub avg_current: Option<f64>,
    pub avg_power: Option<f64>,
    pub avg_state_of_charge: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceBaseline {
    pub avg_voltage: Option<f64>,
    pub avg_current: Option<f64>,
    pub avg_full_capacity: Option<f64>,
    /// Mean of (max - min) state of charge per calendar day.
    pub avg_daily_soc_swing: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub timestamp: i64,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertAnalysis {
    pub events: Vec<AlertEvent>,
    pub critical_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub hourly_averages: Vec<HourlyAverage>,
    pub performance_baseline: PerformanceBaseline,
    pub alert_analysis: AlertAnalysis,
}
