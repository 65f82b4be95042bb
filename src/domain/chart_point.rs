// Chart point domain model - one timestamp's value across all metrics
use super::metric::{MetricKey, Severity};
use enum_map::EnumMap;
use serde::{Deserialize, Serialize};

/// Which stream a point originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointSource {
    #[default]
    Device,
    Weather,
    Cloud,
    Estimated,
    Interpolated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub severity: Severity,
    pub message: String,
    pub key: MetricKey,
}

impl Anomaly {
    pub fn new(severity: Severity, message: impl Into<String>, key: MetricKey) -> Self {
        Self {
            severity,
            message: message.into(),
            key,
        }
    }
}

/// Per-bucket spread of a metric, used for variance bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: i64,
    pub record_count: usize,
    pub source: PointSource,
    pub anomalies: Vec<Anomaly>,
    pub values: EnumMap<MetricKey, Option<f64>>,
    /// Only present on aggregated points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bands: Option<EnumMap<MetricKey, Option<Band>>>,
}

impl ChartPoint {
    pub fn new(timestamp: i64, source: PointSource) -> Self {
        Self {
            timestamp,
            record_count: 1,
            source,
            anomalies: Vec::new(),
            values: EnumMap::default(),
            bands: None,
        }
    }

    pub fn value(&self, key: MetricKey) -> Option<f64> {
        self.values[key]
    }

    pub fn band(&self, key: MetricKey) -> Option<Band> {
        self.bands.as_ref().and_then(|bands| bands[key])
    }

    pub fn is_aggregated(&self) -> bool {
        self.bands.is_some()
    }

    /// Append an anomaly unless an identical (severity, message) pair is already
    /// recorded; all anomalies on a point share its timestamp.
    pub fn push_anomaly(&mut self, anomaly: Anomaly) {
        let duplicate = self
            .anomalies
            .iter()
            .any(|a| a.severity == anomaly.severity && a.message == anomaly.message);
        if !duplicate {
            self.anomalies.push(anomaly);
        }
    }
}
