// Scale & path builder - turns the active LOD and view state into a ChartScene
use crate::domain::analytics::AlertEvent;
use crate::domain::chart_point::{ChartPoint, PointSource};
use crate::domain::errors::RenderError;
use crate::domain::metric::MetricKey;
use crate::domain::metric_config::{Axis, MetricConfig};
use crate::domain::scale::{LinearScale, TimeScale};
use crate::domain::scene::{
    AnnotationLine, AnomalyMarker, AxisTick, BandPath, ChartScene, MetricPath, PathSegment,
    TooltipHit, TooltipValue, YAxis,
};
use crate::domain::timeline::TimelineData;
use crate::domain::viewport::{ViewBox, ViewportController};
use chrono::DateTime;

const PADDING_RATIO: f64 = 0.1;
/// Used when an axis has a single distinct value.
const DEGENERATE_PADDING: f64 = 1.0;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const MONTH_MS: i64 = 30 * DAY_MS;
const TICK_INTERVALS_MS: [i64; 15] = [
    MINUTE_MS,
    5 * MINUTE_MS,
    15 * MINUTE_MS,
    30 * MINUTE_MS,
    HOUR_MS,
    3 * HOUR_MS,
    6 * HOUR_MS,
    12 * HOUR_MS,
    DAY_MS,
    2 * DAY_MS,
    7 * DAY_MS,
    MONTH_MS,
    3 * MONTH_MS,
    6 * MONTH_MS,
    365 * DAY_MS,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSettings {
    pub height: f64,
    /// Fraction of the visible time span a tooltip may snap across.
    pub tooltip_threshold_ratio: f64,
    pub marker_radius: f64,
    pub max_x_ticks: usize,
    pub y_tick_count: usize,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            height: 400.0,
            tooltip_threshold_ratio: 0.05,
            marker_radius: 4.0,
            max_x_ticks: 8,
            y_tick_count: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisScales {
    pub left: Option<LinearScale>,
    pub right: Option<LinearScale>,
}

impl AxisScales {
    pub fn build(points: &[ChartPoint], config: &MetricConfig, height: f64) -> Self {
        let scale_for = |axis| {
            let keys: Vec<MetricKey> = config.on_axis(axis).collect();
            if keys.is_empty() {
                return None;
            }
            let domain = axis_extent(points, &keys).map_or((0.0, DEGENERATE_PADDING), |(min, max)| {
                padded_domain(min, max)
            });
            Some(LinearScale::new(domain, (height, 0.0)))
        };
        Self {
            left: scale_for(Axis::Left),
            right: scale_for(Axis::Right),
        }
    }

    pub fn get(&self, axis: Axis) -> Option<&LinearScale> {
        match axis {
            Axis::Left => self.left.as_ref(),
            Axis::Right => self.right.as_ref(),
        }
    }
}

/// Min/max over every non-null sample (and band edge) of the given metrics.
fn axis_extent(points: &[ChartPoint], keys: &[MetricKey]) -> Option<(f64, f64)> {
    let mut extent: Option<(f64, f64)> = None;
    let mut include = |v: f64| {
        extent = Some(match extent {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        });
    };
    for point in points {
        for &key in keys {
            if let Some(v) = point.value(key) {
                include(v);
            }
            if let Some(band) = point.band(key) {
                include(band.min);
                include(band.max);
            }
        }
    }
    extent
}

pub fn padded_domain(min: f64, max: f64) -> (f64, f64) {
    let range = max - min;
    if range <= 0.0 {
        return (min - DEGENERATE_PADDING, max + DEGENERATE_PADDING);
    }
    let pad = range * PADDING_RATIO;
    (min - pad, max + pad)
}

fn checked(x: f64, y: f64, key: MetricKey) -> Result<(f64, f64), RenderError> {
    if x.is_finite() && y.is_finite() {
        Ok((x, y))
    } else {
        Err(RenderError::NonFinite(key))
    }
}

/// Line for one metric, split wherever the point source changes. The last
/// point of a finished segment also opens the next, so the line is unbroken.
pub fn build_metric_path(
    points: &[ChartPoint],
    key: MetricKey,
    axis: Axis,
    x_scale: &TimeScale,
    y_scale: &LinearScale,
) -> Result<MetricPath, RenderError> {
    let mut segments = Vec::new();
    let mut current: Option<(PointSource, String)> = None;
    let mut last: Option<(f64, f64)> = None;

    for point in points {
        let Some(value) = point.value(key) else {
            continue;
        };
        let (x, y) = checked(x_scale.x(point.timestamp), y_scale.apply(value), key)?;

        let continues = matches!(&current, Some((source, _)) if *source == point.source);
        if continues {
            if let Some((_, d)) = current.as_mut() {
                d.push_str(&format!(" L{x:.2},{y:.2}"));
            }
        } else {
            let d = match last {
                Some((lx, ly)) => format!("M{lx:.2},{ly:.2} L{x:.2},{y:.2}"),
                None => format!("M{x:.2},{y:.2}"),
            };
            if let Some((source, d)) = current.replace((point.source, d)) {
                segments.push(PathSegment { source, d });
            }
        }
        last = Some((x, y));
    }
    if let Some((source, d)) = current {
        segments.push(PathSegment { source, d });
    }

    Ok(MetricPath {
        key,
        axis,
        color: key.descriptor().color,
        segments,
    })
}

/// Closed polygon along bucket maxima and back along minima.
pub fn build_band_path(
    points: &[ChartPoint],
    key: MetricKey,
    x_scale: &TimeScale,
    y_scale: &LinearScale,
) -> Result<Option<BandPath>, RenderError> {
    let mut upper = Vec::new();
    let mut lower = Vec::new();
    for point in points {
        let Some(band) = point.band(key) else {
            continue;
        };
        let x = x_scale.x(point.timestamp);
        upper.push(checked(x, y_scale.apply(band.max), key)?);
        lower.push(checked(x, y_scale.apply(band.min), key)?);
    }
    if upper.is_empty() {
        return Ok(None);
    }

    let mut d = String::new();
    for (i, (x, y)) in upper.iter().chain(lower.iter().rev()).enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        d.push_str(&format!("{cmd}{x:.2},{y:.2}"));
    }
    d.push_str(" Z");

    Ok(Some(BandPath {
        key,
        color: key.descriptor().color,
        d,
    }))
}

/// Tick labels adapted to the visible time span.
pub fn x_ticks(x_scale: &TimeScale, view: ViewBox, max_ticks: usize) -> Vec<AxisTick> {
    let start = x_scale.time_at(view.x);
    let end = x_scale.time_at(view.right());
    let span = end - start;
    if span <= 0.0 || max_ticks == 0 {
        return Vec::new();
    }

    let interval = TICK_INTERVALS_MS
        .iter()
        .copied()
        .find(|i| span / (*i as f64) < max_ticks as f64)
        .unwrap_or_else(|| month_multiple_above(span / max_ticks as f64));

    let format = if span < DAY_MS as f64 {
        "%H:%M"
    } else if span < 7.0 * DAY_MS as f64 {
        "%b %d %H:%M"
    } else {
        "%b %d"
    };

    let mut ticks = Vec::new();
    let mut t = (start / interval as f64).ceil() as i64 * interval;
    while (t as f64) <= end {
        if let Some(time) = DateTime::from_timestamp_millis(t) {
            ticks.push(AxisTick {
                position: x_scale.x(t),
                label: time.format(format).to_string(),
            });
        }
        t += interval;
    }
    ticks
}

/// Smallest whole number of 30-day months strictly longer than `step_ms`.
fn month_multiple_above(step_ms: f64) -> i64 {
    ((step_ms / MONTH_MS as f64).floor() as i64 + 1) * MONTH_MS
}

fn format_value(v: f64) -> String {
    let magnitude = v.abs();
    if magnitude >= 100.0 {
        format!("{v:.0}")
    } else if magnitude >= 10.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.2}")
    }
}

pub fn y_axis(side: Axis, scale: &LinearScale, config: &MetricConfig, tick_count: usize) -> YAxis {
    let mut units: Vec<&str> = Vec::new();
    for key in config.on_axis(side) {
        let unit = key.descriptor().unit;
        if !units.contains(&unit) {
            units.push(unit);
        }
    }

    YAxis {
        side,
        domain: scale.domain,
        unit: units.join(" / "),
        ticks: scale
            .ticks(tick_count)
            .into_iter()
            .map(|v| AxisTick {
                position: scale.apply(v),
                label: format_value(v),
            })
            .collect(),
    }
}

/// Nearest point to an internal chart x, if it lies within the snap distance.
pub fn find_tooltip(
    points: &[ChartPoint],
    x_scale: &TimeScale,
    view: ViewBox,
    chart_x: f64,
    config: &MetricConfig,
    threshold_ratio: f64,
) -> Option<TooltipHit> {
    let target = x_scale.time_at(chart_x);
    let idx = points.partition_point(|p| (p.timestamp as f64) < target);

    let nearest = [idx.checked_sub(1), Some(idx)]
        .into_iter()
        .flatten()
        .filter_map(|i| points.get(i))
        .min_by(|a, b| {
            let da = (a.timestamp as f64 - target).abs();
            let db = (b.timestamp as f64 - target).abs();
            da.total_cmp(&db)
        })?;

    let visible_span = x_scale.time_at(view.right()) - x_scale.time_at(view.x);
    let distance = (nearest.timestamp as f64 - target).abs();
    if distance >= visible_span * threshold_ratio {
        return None;
    }

    let values = config
        .active()
        .filter_map(|(key, _)| {
            let descriptor = key.descriptor();
            nearest.value(key).map(|value| TooltipValue {
                key,
                label: descriptor.label,
                unit: descriptor.unit,
                value,
            })
        })
        .collect();

    Some(TooltipHit {
        timestamp: nearest.timestamp,
        x: x_scale.x(nearest.timestamp),
        source: nearest.source,
        record_count: nearest.record_count,
        values,
        anomalies: nearest.anomalies.clone(),
    })
}

pub fn anomaly_markers(
    points: &[ChartPoint],
    config: &MetricConfig,
    scales: &AxisScales,
    x_scale: &TimeScale,
    radius: f64,
) -> Vec<AnomalyMarker> {
    let mut markers = Vec::new();
    for point in points {
        for anomaly in &point.anomalies {
            let Some(scale) = config.axis_of(anomaly.key).and_then(|a| scales.get(a)) else {
                continue;
            };
            let Some(value) = point.value(anomaly.key) else {
                continue;
            };
            markers.push(AnomalyMarker {
                key: anomaly.key,
                x: x_scale.x(point.timestamp),
                y: scale.apply(value),
                radius,
                severity: anomaly.severity,
                message: anomaly.message.clone(),
            });
        }
    }
    markers
}

/// Alert guides, only for events inside the visible window.
pub fn annotation_lines(events: &[AlertEvent], x_scale: &TimeScale, view: ViewBox) -> Vec<AnnotationLine> {
    events
        .iter()
        .filter_map(|event| {
            let x = x_scale.x(event.timestamp);
            view.contains(x).then(|| AnnotationLine {
                x,
                timestamp: event.timestamp,
                severity: event.severity,
                label: event.message.clone(),
            })
        })
        .collect()
}

/// Paths, bands and y axes for a set of points drawn against `x_scale`.
pub fn build_series(
    points: &[ChartPoint],
    x_scale: &TimeScale,
    config: &MetricConfig,
    settings: &SceneSettings,
) -> Result<(AxisScales, Vec<MetricPath>, Vec<BandPath>, Vec<YAxis>), RenderError> {
    let scales = AxisScales::build(points, config, settings.height);

    let mut paths = Vec::new();
    let mut bands = Vec::new();
    for (key, axis) in config.active() {
        let Some(y_scale) = scales.get(axis) else {
            continue;
        };
        paths.push(build_metric_path(points, key, axis, x_scale, y_scale)?);
        if let Some(band) = build_band_path(points, key, x_scale, y_scale)? {
            bands.push(band);
        }
    }

    let y_axes = [Axis::Left, Axis::Right]
        .into_iter()
        .filter_map(|side| {
            scales
                .get(side)
                .map(|scale| y_axis(side, scale, config, settings.y_tick_count))
        })
        .collect();

    Ok((scales, paths, bands, y_axes))
}

pub fn build_scene(
    timeline: &TimelineData,
    viewport: &ViewportController,
    config: &MetricConfig,
    alerts: &[AlertEvent],
    settings: &SceneSettings,
) -> Result<ChartScene, RenderError> {
    if viewport.total_width() <= 0.0 {
        return Err(RenderError::ZeroWidth);
    }
    let points = timeline.active_points();
    let x_scale = timeline.x_scale();
    let view = viewport.view_box();

    let (scales, paths, bands, y_axes) = build_series(points, x_scale, config, settings)?;

    Ok(ChartScene {
        total_width: viewport.total_width(),
        height: settings.height,
        view_box: view,
        zoom_percentage: viewport.zoom_percentage(),
        active_bucket: timeline.active_bucket(),
        paths,
        bands,
        x_ticks: x_ticks(x_scale, view, settings.max_x_ticks),
        y_axes,
        markers: anomaly_markers(points, config, &scales, x_scale, settings.marker_radius),
        annotations: annotation_lines(alerts, x_scale, view),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lod_aggregator::build_ladder;
    use crate::domain::metric::Severity;
    use crate::domain::timeline::{AveragingConfig, BucketSize};
    use crate::domain::viewport::ViewportSettings;

    const MINUTE: i64 = 60_000;

    fn point(minute: i64, soc: Option<f64>, source: PointSource) -> ChartPoint {
        let mut p = ChartPoint::new(minute * MINUTE, source);
        p.values[MetricKey::StateOfCharge] = soc;
        p
    }

    fn soc_only() -> MetricConfig {
        let mut config = MetricConfig::empty();
        config.set(MetricKey::StateOfCharge, Axis::Left);
        config
    }

    #[test]
    fn test_scale_pads_ten_percent() {
        let points = vec![
            point(0, Some(0.0), PointSource::Device),
            point(1, Some(100.0), PointSource::Device),
        ];
        let scales = AxisScales::build(&points, &soc_only(), 300.0);
        let left = scales.left.unwrap();
        assert_eq!(left.domain, (-10.0, 110.0));
        assert_eq!(left.range, (300.0, 0.0));
        assert!(scales.right.is_none());
    }

    #[test]
    fn test_degenerate_range_stays_finite() {
        let points = vec![point(0, Some(42.0), PointSource::Device)];
        let scales = AxisScales::build(&points, &soc_only(), 300.0);
        assert_eq!(scales.left.unwrap().domain, (41.0, 43.0));

        let none = AxisScales::build(&[], &soc_only(), 300.0);
        assert!(none.left.unwrap().apply(0.5).is_finite());
    }

    #[test]
    fn test_path_splits_at_source_change_and_stitches() {
        let points = vec![
            point(0, Some(0.0), PointSource::Device),
            point(1, Some(10.0), PointSource::Device),
            point(2, Some(20.0), PointSource::Weather),
            point(3, None, PointSource::Device),
            point(4, Some(40.0), PointSource::Weather),
        ];
        let x_scale = TimeScale::new(0, 4 * MINUTE, 400.0);
        let y_scale = LinearScale::new((0.0, 40.0), (40.0, 0.0));
        let path =
            build_metric_path(&points, MetricKey::StateOfCharge, Axis::Left, &x_scale, &y_scale)
                .unwrap();

        assert_eq!(path.segments.len(), 2);
        assert_eq!(path.segments[0].source, PointSource::Device);
        assert_eq!(path.segments[0].d, "M0.00,40.00 L100.00,30.00");
        assert_eq!(path.segments[1].source, PointSource::Weather);
        assert_eq!(path.segments[1].d, "M100.00,30.00 L200.00,20.00 L400.00,0.00");
    }

    #[test]
    fn test_non_finite_value_is_a_render_error() {
        let points = vec![point(0, Some(f64::NAN), PointSource::Device)];
        let x_scale = TimeScale::new(0, MINUTE, 100.0);
        let y_scale = LinearScale::new((0.0, 1.0), (100.0, 0.0));
        let result =
            build_metric_path(&points, MetricKey::StateOfCharge, Axis::Left, &x_scale, &y_scale);
        assert_eq!(result, Err(RenderError::NonFinite(MetricKey::StateOfCharge)));
    }

    #[test]
    fn test_band_path_only_for_aggregated_points() {
        let raw = vec![
            point(0, Some(80.0), PointSource::Device),
            point(5, Some(40.0), PointSource::Device),
        ];
        let x_scale = TimeScale::new(0, 10 * MINUTE, 100.0);
        let y_scale = LinearScale::new((0.0, 100.0), (100.0, 0.0));
        assert_eq!(
            build_band_path(&raw, MetricKey::StateOfCharge, &x_scale, &y_scale).unwrap(),
            None
        );

        let ladder = build_ladder(raw);
        let band = build_band_path(
            ladder.get(BucketSize::FifteenMinutes),
            MetricKey::StateOfCharge,
            &x_scale,
            &y_scale,
        )
        .unwrap()
        .unwrap();
        assert_eq!(band.d, "M0.00,20.00 L0.00,60.00 Z");
    }

    #[test]
    fn test_x_ticks_adapt_to_span() {
        let x_scale = TimeScale::new(0, 2 * HOUR_MS, 1200.0);
        let ticks = x_ticks(&x_scale, ViewBox::full(1200.0), 8);
        // 2h visible with fewer than 8 steps -> 30 minute steps
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[0].label, "00:00");
        assert_eq!(ticks[1].label, "00:30");
        assert_eq!(ticks[1].position, 300.0);

        let x_scale = TimeScale::new(0, 30 * DAY_MS, 1200.0);
        let ticks = x_ticks(&x_scale, ViewBox::full(1200.0), 8);
        assert_eq!(ticks[0].label, "Jan 01");
        assert!(ticks.len() <= 8);
    }

    #[test]
    fn test_x_ticks_stay_capped_on_multi_year_spans() {
        let x_scale = TimeScale::new(0, 730 * DAY_MS, 1200.0);
        let ticks = x_ticks(&x_scale, ViewBox::full(1200.0), 8);
        // 90 day steps would give 9 ticks, so 180 day steps
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[1].label, "Jun 30");

        // past the yearly step the interval grows in whole months
        let x_scale = TimeScale::new(0, 3650 * DAY_MS, 1200.0);
        let ticks = x_ticks(&x_scale, ViewBox::full(1200.0), 8);
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= 8);
        assert_eq!(month_multiple_above(456.25 * DAY_MS as f64), 16 * MONTH_MS);
    }

    #[test]
    fn test_tooltip_snaps_within_threshold_only() {
        let points = vec![
            point(0, Some(10.0), PointSource::Device),
            point(60, Some(20.0), PointSource::Device),
        ];
        let x_scale = TimeScale::new(0, 100 * MINUTE, 1000.0);
        let view = ViewBox::full(1000.0);
        let config = soc_only();

        let hit = find_tooltip(&points, &x_scale, view, 590.0, &config, 0.05).unwrap();
        assert_eq!(hit.timestamp, 60 * MINUTE);
        assert_eq!(hit.values[0].value, 20.0);

        // 30 minutes from either point, threshold is 5 minutes
        assert!(find_tooltip(&points, &x_scale, view, 300.0, &config, 0.05).is_none());
    }

    #[test]
    fn test_annotations_limited_to_view() {
        let x_scale = TimeScale::new(0, 100 * MINUTE, 1000.0);
        let events = vec![
            AlertEvent { timestamp: 10 * MINUTE, severity: Severity::Warning, message: "a".into() },
            AlertEvent { timestamp: 90 * MINUTE, severity: Severity::Critical, message: "b".into() },
        ];
        let lines = annotation_lines(&events, &x_scale, ViewBox { x: 500.0, width: 500.0 });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label, "b");
        assert_eq!(lines[0].x, 900.0);
    }

    #[test]
    fn test_scene_includes_markers_for_active_metrics() {
        let raw = vec![
            point(0, Some(5.0), PointSource::Device),
            point(30, Some(60.0), PointSource::Device),
        ];
        let mut with_anomaly = raw.clone();
        with_anomaly[0].push_anomaly(crate::domain::chart_point::Anomaly::new(
            Severity::Critical,
            "Critically low state of charge",
            MetricKey::StateOfCharge,
        ));
        let averaging = AveragingConfig { enabled: false, ..AveragingConfig::default() };
        let timeline = TimelineData::new(build_ladder(with_anomaly), 1000.0, averaging).unwrap();
        let viewport = ViewportController::new(1000.0, ViewportSettings::default());

        let scene = build_scene(&timeline, &viewport, &soc_only(), &[], &SceneSettings::default())
            .unwrap();
        assert_eq!(scene.active_bucket, BucketSize::Raw);
        assert_eq!(scene.paths.len(), 1);
        assert!(scene.bands.is_empty());
        assert_eq!(scene.markers.len(), 1);
        assert_eq!(scene.markers[0].x, 0.0);
        assert_eq!(scene.y_axes.len(), 1);
        assert_eq!(scene.y_axes[0].unit, "%");

        let mut other = MetricConfig::empty();
        other.set(MetricKey::Current, Axis::Right);
        let scene = build_scene(&timeline, &viewport, &other, &[], &SceneSettings::default())
            .unwrap();
        assert!(scene.markers.is_empty());
    }
}
