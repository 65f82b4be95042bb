// Collaborator trait for battery history, weather and analytics services
use crate::domain::analytics::AnalyticsReport;
use crate::domain::prediction::PredictionSet;
use crate::domain::records::TimelineEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Full, unfiltered device + weather stream for a system
    async fn fetch_unified_timeline(&self, system_id: &str) -> anyhow::Result<Vec<TimelineEntry>>;

    /// Best-effort refresh of the weather cache covering the window
    async fn sync_weather_cache(
        &self,
        system_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Remote analytics, used when too few records are in the window
    async fn compute_analytics(&self, records: &[TimelineEntry]) -> anyhow::Result<AnalyticsReport>;

    async fn fetch_hourly_predictions(
        &self,
        system_id: &str,
        hours: u32,
    ) -> anyhow::Result<PredictionSet>;
}
