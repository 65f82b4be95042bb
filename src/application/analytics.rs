// Local analytics - hourly profile, baseline and alert summary from in-window points
use crate::domain::analytics::{
    AlertAnalysis, AlertEvent, AnalyticsReport, HourlyAverage, PerformanceBaseline,
};
use crate::domain::chart_point::{ChartPoint, PointSource};
use crate::domain::metric::{MetricKey, Severity};
use std::collections::BTreeMap;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Local computation is only trusted with enough device records.
pub fn should_compute_locally(record_count: usize, min_records: usize) -> bool {
    record_count >= min_records
}

/// Points measured by the device itself; overridden sources are excluded.
pub fn device_points(points: &[ChartPoint]) -> Vec<&ChartPoint> {
    points
        .iter()
        .filter(|p| p.source == PointSource::Device)
        .collect()
}

fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn compute_local(points: &[ChartPoint]) -> AnalyticsReport {
    let device = device_points(points);

    AnalyticsReport {
        hourly_averages: hourly_averages(&device),
        performance_baseline: performance_baseline(&device),
        alert_analysis: alert_analysis(&device),
    }
}

fn hourly_averages(points: &[&ChartPoint]) -> Vec<HourlyAverage> {
    let mut by_hour: BTreeMap<u32, Vec<&ChartPoint>> = BTreeMap::new();
    for point in points {
        let hour = (point.timestamp.rem_euclid(DAY_MS) / HOUR_MS) as u32;
        by_hour.entry(hour).or_default().push(point);
    }

    by_hour
        .into_iter()
        .map(|(hour, members)| {
            let avg = |key| mean(members.iter().filter_map(|p| p.value(key)));
            HourlyAverage {
                hour,
                avg_current: avg(MetricKey::Current),
                avg_power: avg(MetricKey::Power),
                avg_state_of_charge: avg(MetricKey::StateOfCharge),
                samples: members.len(),
            }
        })
        .collect()
}

fn performance_baseline(points: &[&ChartPoint]) -> PerformanceBaseline {
    let avg = |key| mean(points.iter().filter_map(|p| p.value(key)));

    let mut soc_by_day: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for point in points {
        let Some(soc) = point.value(MetricKey::StateOfCharge) else {
            continue;
        };
        soc_by_day
            .entry(point.timestamp.div_euclid(DAY_MS))
            .and_modify(|(lo, hi)| {
                *lo = lo.min(soc);
                *hi = hi.max(soc);
            })
            .or_insert((soc, soc));
    }

    PerformanceBaseline {
        avg_voltage: avg(MetricKey::OverallVoltage),
        avg_current: avg(MetricKey::Current),
        avg_full_capacity: avg(MetricKey::FullCapacity),
        avg_daily_soc_swing: mean(soc_by_day.values().map(|(lo, hi)| hi - lo)),
    }
}

fn alert_analysis(points: &[&ChartPoint]) -> AlertAnalysis {
    let events: Vec<AlertEvent> = points
        .iter()
        .flat_map(|point| {
            point.anomalies.iter().map(|a| AlertEvent {
                timestamp: point.timestamp,
                severity: a.severity,
                message: a.message.clone(),
            })
        })
        .collect();

    let critical_count = events
        .iter()
        .filter(|e| e.severity == Severity::Critical)
        .count();

    AlertAnalysis {
        warning_count: events.len() - critical_count,
        critical_count,
        events,
    }
}
