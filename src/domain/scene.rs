// Render-ready scene description consumed by any SVG/canvas renderer
use super::chart_point::{Anomaly, PointSource};
use super::metric::{MetricKey, Severity};
use super::metric_config::Axis;
use super::timeline::BucketSize;
use super::viewport::ViewBox;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSegment {
    pub source: PointSource,
    /// SVG path data (`M x,y L x,y ...`).
    pub d: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPath {
    pub key: MetricKey,
    pub axis: Axis,
    pub color: &'static str,
    pub segments: Vec<PathSegment>,
}

/// Closed min/max polygon for an aggregated metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandPath {
    pub key: MetricKey,
    pub color: &'static str,
    pub d: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YAxis {
    pub side: Axis,
    pub domain: (f64, f64),
    pub unit: String,
    pub ticks: Vec<AxisTick>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyMarker {
    pub key: MetricKey,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationLine {
    pub x: f64,
    pub timestamp: i64,
    pub severity: Severity,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipValue {
    pub key: MetricKey,
    pub label: &'static str,
    pub unit: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipHit {
    pub timestamp: i64,
    /// Internal chart x of the matched point.
    pub x: f64,
    pub source: PointSource,
    pub record_count: usize,
    pub values: Vec<TooltipValue>,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartScene {
    pub total_width: f64,
    pub height: f64,
    pub view_box: ViewBox,
    pub zoom_percentage: f64,
    pub active_bucket: BucketSize,
    pub paths: Vec<MetricPath>,
    pub bands: Vec<BandPath>,
    pub x_ticks: Vec<AxisTick>,
    pub y_axes: Vec<YAxis>,
    pub markers: Vec<AnomalyMarker>,
    pub annotations: Vec<AnnotationLine>,
}
