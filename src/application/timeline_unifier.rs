// Timeline unifier - merges device and weather streams into one ordered sequence
use crate::application::point_mapper::map_entry;
use crate::domain::chart_point::ChartPoint;
use crate::domain::records::{EntryKind, TimelineEntry};
use chrono::{DateTime, Utc};

/// Inclusive time window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn from_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(start.timestamp_millis(), end.timestamp_millis())
    }

    /// An inverted window contains nothing.
    pub fn is_empty(&self) -> bool {
        self.start_ms > self.end_ms
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }
}

/// Maps and filters the stream; output is sorted by timestamp with ties kept
/// in arrival order. An empty result is valid.
pub fn unify(
    entries: &[TimelineEntry],
    window: TimeWindow,
    rated_capacity: Option<f64>,
) -> Vec<ChartPoint> {
    if window.is_empty() {
        return Vec::new();
    }

    let mut points: Vec<ChartPoint> = entries
        .iter()
        .filter_map(|entry| match map_entry(entry, rated_capacity) {
            Ok(point) => Some(point),
            Err(e) => {
                tracing::debug!("Skipping timeline entry: {}", e);
                None
            }
        })
        .filter(|point| window.contains(point.timestamp))
        .collect();

    points.sort_by_key(|p| p.timestamp);
    points
}

/// Device analysis records inside the window, as handed to analytics.
pub fn records_in_window(entries: &[TimelineEntry], window: TimeWindow) -> Vec<TimelineEntry> {
    if window.is_empty() {
        return Vec::new();
    }
    entries
        .iter()
        .filter(|e| e.kind == EntryKind::Analysis)
        .filter(|e| e.timestamp_ms().is_ok_and(|ts| window.contains(ts)))
        .cloned()
        .collect()
}
