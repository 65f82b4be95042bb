// Point mapper - normalizes one raw record into a chart point
use crate::domain::chart_point::{Anomaly, ChartPoint, PointSource};
use crate::domain::errors::ParseError;
use crate::domain::metric::{self, MetricDescriptor, MetricKey, MetricSource};
use crate::domain::records::{EntryKind, TimelineEntry};
use serde_json::Value;

const FULL_CAPACITY_FIELD: &str = "fullCapacity";
const EMBEDDED_WEATHER_FIELD: &str = "weather";

pub fn map_entry(
    entry: &TimelineEntry,
    rated_capacity: Option<f64>,
) -> Result<ChartPoint, ParseError> {
    let timestamp = entry.timestamp_ms()?;
    Ok(map_record(
        entry.kind,
        &entry.data,
        timestamp,
        entry.point_source(),
        rated_capacity,
    ))
}

pub fn map_record(
    kind: EntryKind,
    data: &Value,
    timestamp: i64,
    source: PointSource,
    rated_capacity: Option<f64>,
) -> ChartPoint {
    let mut point = ChartPoint::new(timestamp, source);

    for descriptor in metric::all() {
        let Some(raw) = resolve_raw(kind, data, descriptor, rated_capacity) else {
            continue;
        };
        point.values[descriptor.key] = Some(raw * descriptor.multiplier);

        // Thresholds are written against raw units
        if let Some((severity, message)) = descriptor.check(raw) {
            point.push_anomaly(Anomaly::new(severity, message, descriptor.key));
        }
    }

    point
}

fn resolve_raw(
    kind: EntryKind,
    data: &Value,
    descriptor: &MetricDescriptor,
    rated_capacity: Option<f64>,
) -> Option<f64> {
    if descriptor.key == MetricKey::Health {
        return derive_health(kind, data, rated_capacity);
    }
    let object = source_object(kind, data, descriptor.source)?;
    numeric(object.get(descriptor.field?)?)
}

/// The object a metric's field lives in. Device records may carry the weather
/// observation captured alongside them.
fn source_object(kind: EntryKind, data: &Value, source: MetricSource) -> Option<&Value> {
    match (kind, source) {
        (EntryKind::Analysis, MetricSource::Device) => Some(data),
        (EntryKind::Analysis, MetricSource::Weather) => data.get(EMBEDDED_WEATHER_FIELD),
        (EntryKind::Weather, MetricSource::Weather) => Some(data),
        (EntryKind::Weather, MetricSource::Device) => None,
    }
}

fn derive_health(kind: EntryKind, data: &Value, rated_capacity: Option<f64>) -> Option<f64> {
    if kind != EntryKind::Analysis {
        return None;
    }
    let rated = rated_capacity.filter(|r| r.is_finite() && *r > 0.0)?;
    let full = numeric(data.get(FULL_CAPACITY_FIELD)?)?;
    Some(full * 100.0 / rated)
}

fn numeric(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}
