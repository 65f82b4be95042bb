// Timeline domain model - the LOD ladder and averaging state for one data window
use super::chart_point::ChartPoint;
use super::errors::ParseError;
use super::scale::TimeScale;
use enum_map::{Enum, EnumMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Enum, Serialize, Deserialize,
)]
pub enum BucketSize {
    #[serde(rename = "raw")]
    Raw,
    #[serde(rename = "5")]
    FiveMinutes,
    #[serde(rename = "15")]
    FifteenMinutes,
    #[serde(rename = "60")]
    OneHour,
    #[serde(rename = "240")]
    FourHours,
    #[serde(rename = "1440")]
    OneDay,
}

impl BucketSize {
    /// Finest to coarsest.
    pub const LADDER: [BucketSize; 6] = [
        BucketSize::Raw,
        BucketSize::FiveMinutes,
        BucketSize::FifteenMinutes,
        BucketSize::OneHour,
        BucketSize::FourHours,
        BucketSize::OneDay,
    ];

    pub fn minutes(self) -> Option<i64> {
        match self {
            BucketSize::Raw => None,
            BucketSize::FiveMinutes => Some(5),
            BucketSize::FifteenMinutes => Some(15),
            BucketSize::OneHour => Some(60),
            BucketSize::FourHours => Some(240),
            BucketSize::OneDay => Some(1440),
        }
    }

    pub fn duration_ms(self) -> Option<i64> {
        self.minutes().map(|m| m * 60_000)
    }

    pub fn key(self) -> &'static str {
        match self {
            BucketSize::Raw => "raw",
            BucketSize::FiveMinutes => "5",
            BucketSize::FifteenMinutes => "15",
            BucketSize::OneHour => "60",
            BucketSize::FourHours => "240",
            BucketSize::OneDay => "1440",
        }
    }
}

impl fmt::Display for BucketSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BucketSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BucketSize::LADDER
            .into_iter()
            .find(|b| b.key() == s)
            .ok_or_else(|| ParseError::BucketSize(s.to_string()))
    }
}

/// Precomputed points for every bucket size.
#[derive(Debug, Clone, PartialEq)]
pub struct LodLadder {
    levels: EnumMap<BucketSize, Vec<ChartPoint>>,
}

impl LodLadder {
    pub fn new(levels: EnumMap<BucketSize, Vec<ChartPoint>>) -> Self {
        Self { levels }
    }

    pub fn get(&self, bucket: BucketSize) -> &[ChartPoint] {
        &self.levels[bucket]
    }

    pub fn raw(&self) -> &[ChartPoint] {
        self.get(BucketSize::Raw)
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AveragingConfig {
    pub enabled: bool,
    /// Pinned by the user; overrides the zoom-driven choice.
    pub manual_bucket: Option<BucketSize>,
    pub auto_bucket: BucketSize,
}

impl Default for AveragingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            manual_bucket: None,
            auto_bucket: BucketSize::OneDay,
        }
    }
}

impl AveragingConfig {
    pub fn active_bucket(&self) -> BucketSize {
        if !self.enabled {
            return BucketSize::Raw;
        }
        self.manual_bucket.unwrap_or(self.auto_bucket)
    }
}

/// Everything derived from one (system, date range) selection.
#[derive(Debug, Clone)]
pub struct TimelineData {
    lods: LodLadder,
    x_scale: TimeScale,
    pub averaging: AveragingConfig,
}

impl TimelineData {
    /// `None` when the ladder holds no points.
    pub fn new(lods: LodLadder, total_width: f64, averaging: AveragingConfig) -> Option<Self> {
        let raw = lods.raw();
        let first = raw.first()?.timestamp;
        let last = raw.last()?.timestamp;
        Some(Self {
            x_scale: TimeScale::new(first, last, total_width),
            lods,
            averaging,
        })
    }

    pub fn x_scale(&self) -> &TimeScale {
        &self.x_scale
    }

    pub fn x_min(&self) -> i64 {
        self.x_scale.start_ms()
    }

    pub fn x_max(&self) -> i64 {
        self.x_scale.end_ms()
    }

    pub fn lods(&self) -> &LodLadder {
        &self.lods
    }

    pub fn active_bucket(&self) -> BucketSize {
        self.averaging.active_bucket()
    }

    pub fn active_points(&self) -> &[ChartPoint] {
        self.lods.get(self.active_bucket())
    }

    pub fn raw_points(&self) -> &[ChartPoint] {
        self.lods.raw()
    }

    pub fn set_auto_bucket(&mut self, bucket: BucketSize) {
        self.averaging.auto_bucket = bucket;
    }

    /// Turning averaging off also forgets any pinned bucket.
    pub fn set_averaging_enabled(&mut self, enabled: bool) {
        self.averaging.enabled = enabled;
        if !enabled {
            self.averaging.manual_bucket = None;
        }
    }

    pub fn set_manual_bucket(&mut self, bucket: Option<BucketSize>) {
        self.averaging.manual_bucket = bucket;
    }

    pub fn resize(&mut self, total_width: f64) {
        self.x_scale = self.x_scale.with_width(total_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart_point::PointSource;

    fn ladder_with(raw: Vec<ChartPoint>) -> LodLadder {
        let mut levels: EnumMap<BucketSize, Vec<ChartPoint>> = EnumMap::default();
        levels[BucketSize::Raw] = raw;
        LodLadder::new(levels)
    }

    #[test]
    fn test_bucket_keys_round_trip() {
        for bucket in BucketSize::LADDER {
            assert_eq!(bucket.key().parse::<BucketSize>().unwrap(), bucket);
        }
        assert!("7".parse::<BucketSize>().is_err());
        assert_eq!(serde_json::to_string(&BucketSize::FourHours).unwrap(), "\"240\"");
    }

    #[test]
    fn test_active_bucket_precedence() {
        let mut config = AveragingConfig {
            auto_bucket: BucketSize::OneHour,
            ..AveragingConfig::default()
        };
        assert_eq!(config.active_bucket(), BucketSize::OneHour);

        config.manual_bucket = Some(BucketSize::FiveMinutes);
        assert_eq!(config.active_bucket(), BucketSize::FiveMinutes);

        config.enabled = false;
        assert_eq!(config.active_bucket(), BucketSize::Raw);
    }

    #[test]
    fn test_empty_ladder_yields_no_timeline() {
        let timeline = TimelineData::new(ladder_with(Vec::new()), 1000.0, AveragingConfig::default());
        assert!(timeline.is_none());
    }

    #[test]
    fn test_domain_bounds_follow_raw_points() {
        let raw = vec![
            ChartPoint::new(1_000, PointSource::Device),
            ChartPoint::new(9_000, PointSource::Weather),
        ];
        let mut timeline =
            TimelineData::new(ladder_with(raw), 800.0, AveragingConfig::default()).unwrap();
        assert_eq!(timeline.x_min(), 1_000);
        assert_eq!(timeline.x_max(), 9_000);

        timeline.set_manual_bucket(Some(BucketSize::OneHour));
        timeline.set_averaging_enabled(false);
        assert_eq!(timeline.averaging.manual_bucket, None);
        assert_eq!(timeline.active_points().len(), 2);
    }
}
