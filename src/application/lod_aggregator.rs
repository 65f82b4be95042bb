// LOD aggregator - time-bucketed averages with min/max bands
use crate::domain::chart_point::{Anomaly, Band, ChartPoint, PointSource};
use crate::domain::metric::{self, MetricKey};
use crate::domain::timeline::{BucketSize, LodLadder};
use enum_map::EnumMap;
use std::collections::BTreeMap;

/// Floor division, so pre-epoch timestamps land in the bucket below them.
pub fn bucket_key(timestamp_ms: i64, bucket_ms: i64) -> i64 {
    timestamp_ms.div_euclid(bucket_ms) * bucket_ms
}

/// Build every level of the ladder from the unified raw points.
pub fn build_ladder(raw: Vec<ChartPoint>) -> LodLadder {
    let mut levels: EnumMap<BucketSize, Vec<ChartPoint>> = EnumMap::default();
    for bucket in BucketSize::LADDER {
        if let Some(bucket_ms) = bucket.duration_ms() {
            levels[bucket] = aggregate(&raw, bucket_ms);
        }
    }
    levels[BucketSize::Raw] = raw;
    LodLadder::new(levels)
}

#[derive(Debug, Clone, Copy, Default)]
struct MetricAccumulator {
    sum: f64,
    count: usize,
    min: f64,
    max: f64,
}

impl MetricAccumulator {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    fn band(&self) -> Option<Band> {
        (self.count > 0).then_some(Band {
            min: self.min,
            max: self.max,
        })
    }
}

struct BucketAccumulator {
    source: PointSource,
    record_count: usize,
    metrics: EnumMap<MetricKey, MetricAccumulator>,
}

impl BucketAccumulator {
    fn new(source: PointSource) -> Self {
        Self {
            source,
            record_count: 0,
            metrics: EnumMap::default(),
        }
    }

    fn push(&mut self, point: &ChartPoint) {
        self.record_count += point.record_count;
        for (key, value) in point.values.iter() {
            if let Some(v) = value {
                self.metrics[key].push(*v);
            }
        }
    }

    fn finish(self, timestamp: i64) -> ChartPoint {
        let mut point = ChartPoint::new(timestamp, self.source);
        point.record_count = self.record_count;
        point.values = EnumMap::from_fn(|key| self.metrics[key].mean());
        point.bands = Some(EnumMap::from_fn(|key| self.metrics[key].band()));

        for descriptor in metric::all() {
            let Some(avg) = point.values[descriptor.key] else {
                continue;
            };
            if let Some((severity, message)) = descriptor.check(avg / descriptor.multiplier) {
                point.push_anomaly(Anomaly::new(severity, message, descriptor.key));
            }
        }
        point
    }
}

/// Average `points` into `bucket_ms` buckets. The bucket's source is taken
/// from its first member, not the majority.
pub fn aggregate(points: &[ChartPoint], bucket_ms: i64) -> Vec<ChartPoint> {
    let mut buckets: BTreeMap<i64, BucketAccumulator> = BTreeMap::new();
    for point in points {
        buckets
            .entry(bucket_key(point.timestamp, bucket_ms))
            .or_insert_with(|| BucketAccumulator::new(point.source))
            .push(point);
    }
    buckets
        .into_iter()
        .map(|(key, acc)| acc.finish(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metric::Severity;
    use proptest::prelude::*;

    const MINUTE: i64 = 60_000;

    fn soc_point(minute: i64, soc: f64, source: PointSource) -> ChartPoint {
        let mut p = ChartPoint::new(minute * MINUTE, source);
        p.values[MetricKey::StateOfCharge] = Some(soc);
        p
    }

    #[test]
    fn test_fifteen_minute_bucket_scenario() {
        let raw = vec![
            soc_point(0, 80.0, PointSource::Device),
            soc_point(5, 60.0, PointSource::Device),
            soc_point(10, 40.0, PointSource::Device),
        ];
        let ladder = build_ladder(raw);
        let buckets = ladder.get(BucketSize::FifteenMinutes);

        assert_eq!(buckets.len(), 1);
        let bucket = &buckets[0];
        assert_eq!(bucket.timestamp, 0);
        assert_eq!(bucket.record_count, 3);
        assert_eq!(bucket.value(MetricKey::StateOfCharge), Some(60.0));
        assert_eq!(
            bucket.band(MetricKey::StateOfCharge),
            Some(Band { min: 40.0, max: 80.0 })
        );
        assert_eq!(bucket.value(MetricKey::Current), None);
        assert_eq!(bucket.band(MetricKey::Current), None);
        assert_eq!(ladder.get(BucketSize::FiveMinutes).len(), 3);
        assert_eq!(ladder.raw().len(), 3);
    }

    #[test]
    fn test_null_samples_are_ignored_in_mean() {
        let mut gap = ChartPoint::new(2 * MINUTE, PointSource::Device);
        gap.values[MetricKey::Current] = Some(4.0);
        let raw = vec![soc_point(0, 50.0, PointSource::Device), gap];

        let buckets = aggregate(&raw, 5 * MINUTE);
        assert_eq!(buckets[0].value(MetricKey::StateOfCharge), Some(50.0));
        assert_eq!(buckets[0].value(MetricKey::Current), Some(4.0));
    }

    #[test]
    fn test_source_is_first_member_not_majority() {
        // One device sample followed by two weather samples still reads as device.
        let raw = vec![
            soc_point(0, 50.0, PointSource::Device),
            soc_point(1, 50.0, PointSource::Weather),
            soc_point(2, 50.0, PointSource::Weather),
        ];
        let buckets = aggregate(&raw, 5 * MINUTE);
        assert_eq!(buckets[0].source, PointSource::Device);
    }

    #[test]
    fn test_anomalies_reevaluated_on_bucket_average() {
        let raw = vec![
            soc_point(0, 5.0, PointSource::Device),
            soc_point(1, 95.0, PointSource::Device),
        ];
        let buckets = aggregate(&raw, 5 * MINUTE);
        assert!(buckets[0].anomalies.is_empty());

        let mut hot = ChartPoint::new(0, PointSource::Device);
        hot.values[MetricKey::CellVoltageDifference] = Some(150.0);
        let buckets = aggregate(&[hot], 5 * MINUTE);
        assert_eq!(buckets[0].anomalies.len(), 1);
        assert_eq!(buckets[0].anomalies[0].severity, Severity::Critical);
    }

    #[test]
    fn test_negative_timestamps_floor() {
        assert_eq!(bucket_key(-1, 5 * MINUTE), -5 * MINUTE);
        assert_eq!(bucket_key(5 * MINUTE, 5 * MINUTE), 5 * MINUTE);
    }

    fn arb_points() -> impl Strategy<Value = Vec<ChartPoint>> {
        prop::collection::vec((0i64..5_000_000, prop::option::of(-100.0..100.0f64)), 1..80)
            .prop_map(|samples| {
                let mut points: Vec<ChartPoint> = samples
                    .into_iter()
                    .map(|(ts, v)| {
                        let mut p = ChartPoint::new(ts, PointSource::Device);
                        p.values[MetricKey::Current] = v;
                        p
                    })
                    .collect();
                points.sort_by_key(|p| p.timestamp);
                points
            })
    }

    proptest! {
        #[test]
        fn prop_band_contains_every_sample(points in arb_points()) {
            let bucket_ms = 15 * MINUTE;
            let buckets = aggregate(&points, bucket_ms);
            for p in &points {
                let Some(v) = p.value(MetricKey::Current) else { continue };
                let key = bucket_key(p.timestamp, bucket_ms);
                let bucket = buckets.iter().find(|b| b.timestamp == key).unwrap();
                let band = bucket.band(MetricKey::Current).unwrap();
                prop_assert!(band.min <= v && v <= band.max);
            }
        }

        #[test]
        fn prop_aggregation_is_deterministic(points in arb_points()) {
            let first = build_ladder(points.clone());
            let second = build_ladder(points);
            for bucket in BucketSize::LADDER {
                let a = first.get(bucket);
                let b = second.get(bucket);
                prop_assert_eq!(a.len(), b.len());
                for (x, y) in a.iter().zip(b) {
                    prop_assert_eq!(x.timestamp, y.timestamp);
                    let xv = x.value(MetricKey::Current).map(f64::to_bits);
                    let yv = y.value(MetricKey::Current).map(f64::to_bits);
                    prop_assert_eq!(xv, yv);
                }
            }
        }

        #[test]
        fn prop_record_counts_are_preserved(points in arb_points()) {
            let total: usize = aggregate(&points, 60 * MINUTE).iter().map(|b| b.record_count).sum();
            prop_assert_eq!(total, points.len());
        }
    }
}
