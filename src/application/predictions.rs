// Predictive series - hourly forecasts drawn as their own estimated path set
use crate::application::scale_builder::{SceneSettings, build_series, x_ticks};
use crate::domain::chart_point::{Anomaly, ChartPoint, PointSource};
use crate::domain::errors::RenderError;
use crate::domain::metric::MetricKey;
use crate::domain::metric_config::MetricConfig;
use crate::domain::prediction::{HourlyPrediction, PredictionMetadata, PredictionSet};
use crate::domain::records::parse_timestamp_ms;
use crate::domain::scale::TimeScale;
use crate::domain::scene::{AxisTick, MetricPath, YAxis};
use crate::domain::viewport::ViewBox;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub points: Vec<ChartPoint>,
    pub metadata: PredictionMetadata,
    pub paths: Vec<MetricPath>,
    pub x_ticks: Vec<AxisTick>,
    pub y_axes: Vec<YAxis>,
}

fn prediction_values(prediction: &HourlyPrediction) -> [(MetricKey, Option<f64>); 4] {
    [
        (MetricKey::StateOfCharge, prediction.predicted_soc),
        (MetricKey::Current, prediction.predicted_current),
        (MetricKey::Power, prediction.predicted_power),
        (MetricKey::Clouds, prediction.clouds),
    ]
}

/// Predictions become `Estimated` points, sorted by time. Unparseable
/// timestamps are dropped.
pub fn map_predictions(set: &PredictionSet) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = set
        .predictions
        .iter()
        .filter_map(|prediction| match parse_timestamp_ms(&prediction.timestamp) {
            Ok(ts) => Some(map_prediction(prediction, ts)),
            Err(e) => {
                debug!("Skipping prediction: {}", e);
                None
            }
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

fn map_prediction(prediction: &HourlyPrediction, timestamp: i64) -> ChartPoint {
    let mut point = ChartPoint::new(timestamp, PointSource::Estimated);
    for (key, raw) in prediction_values(prediction) {
        let Some(raw) = raw.filter(|v| v.is_finite()) else {
            continue;
        };
        let descriptor = key.descriptor();
        point.values[key] = Some(raw * descriptor.multiplier);
        if let Some((severity, message)) = descriptor.check(raw) {
            point.push_anomaly(Anomaly::new(severity, message, key));
        }
    }
    point
}

/// Full-width forecast chart. `Ok(None)` when no prediction could be mapped.
pub fn build_forecast(
    set: &PredictionSet,
    config: &MetricConfig,
    total_width: f64,
    settings: &SceneSettings,
) -> Result<Option<Forecast>, RenderError> {
    if total_width <= 0.0 {
        return Err(RenderError::ZeroWidth);
    }
    let points = map_predictions(set);
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(None);
    };
    let x_scale = TimeScale::new(first.timestamp, last.timestamp, total_width);
    let (_, paths, _, y_axes) = build_series(&points, &x_scale, config, settings)?;

    Ok(Some(Forecast {
        x_ticks: x_ticks(&x_scale, ViewBox::full(total_width), settings.max_x_ticks),
        metadata: set.metadata.clone(),
        points,
        paths,
        y_axes,
    }))
}
