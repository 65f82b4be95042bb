// HTTP collaborator implementation
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::analytics::AnalyticsReport;
use crate::domain::prediction::PredictionSet;
use crate::domain::records::TimelineEntry;
use crate::infrastructure::config::{ApiSettings, EndpointTemplates, prepare_endpoint};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    base_url: String,
    endpoints: EndpointTemplates,
}

/// The history service returns either a bare list or `{ "timeline": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimelineResponse {
    Wrapped { timeline: Vec<TimelineEntry> },
    Bare(Vec<TimelineEntry>),
}

#[derive(Debug, Serialize)]
struct AnalyticsRequest<'a> {
    records: &'a [TimelineEntry],
}

impl HttpTelemetrySource {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            endpoints: settings.endpoints.clone(),
        })
    }

    fn endpoint(&self, template: &str, system_id: Option<&str>) -> String {
        let mut vars = HashMap::new();
        vars.insert("base", self.base_url.clone());
        if let Some(id) = system_id {
            vars.insert("system", urlencoding::encode(id).into_owned());
        }
        prepare_endpoint(template, &vars)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} request failed with status {}: {}", what, status, body);
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_unified_timeline(&self, system_id: &str) -> Result<Vec<TimelineEntry>> {
        let url = self.endpoint(&self.endpoints.timeline, Some(system_id));
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send timeline request")?;

        let entries = match Self::read_json::<TimelineResponse>(response, "Timeline").await? {
            TimelineResponse::Wrapped { timeline } => timeline,
            TimelineResponse::Bare(entries) => entries,
        };
        tracing::debug!("Fetched {} timeline entries for {}", entries.len(), system_id);
        Ok(entries)
    }

    async fn sync_weather_cache(
        &self,
        system_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()> {
        let url = self.endpoint(&self.endpoints.weather_sync, Some(system_id));
        let response = self
            .client
            .post(&url)
            .query(&[
                ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ])
            .send()
            .await
            .context("Failed to send weather sync request")?;

        if !response.status().is_success() {
            anyhow::bail!("Weather sync failed with status {}", response.status());
        }
        Ok(())
    }

    async fn compute_analytics(&self, records: &[TimelineEntry]) -> Result<AnalyticsReport> {
        let url = self.endpoint(&self.endpoints.analytics, None);
        let response = self
            .client
            .post(&url)
            .json(&AnalyticsRequest { records })
            .send()
            .await
            .context("Failed to send analytics request")?;

        Self::read_json(response, "Analytics").await
    }

    async fn fetch_hourly_predictions(&self, system_id: &str, hours: u32) -> Result<PredictionSet> {
        let url = self.endpoint(&self.endpoints.predictions, Some(system_id));
        let response = self
            .client
            .get(&url)
            .query(&[("hours", hours)])
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send predictions request")?;

        Self::read_json(response, "Predictions").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> HttpTelemetrySource {
        let settings = ApiSettings {
            base_url: "http://bms.local/api/".to_string(),
            ..ApiSettings::default()
        };
        HttpTelemetrySource::new(&settings).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_system_id() {
        let source = source();
        assert_eq!(
            source.endpoint(&source.endpoints.timeline, Some("rack 1/a")),
            "http://bms.local/api/systems/rack%201%2Fa/timeline"
        );
        assert_eq!(
            source.endpoint(&source.endpoints.analytics, None),
            "http://bms.local/api/analytics"
        );
    }

    #[test]
    fn test_timeline_response_accepts_both_shapes() {
        let entry = r#"{"type":"weather","timestamp":"2025-03-01T12:00:00Z","data":{"clouds":10}}"#;

        let bare: TimelineResponse = serde_json::from_str(&format!("[{entry}]")).unwrap();
        assert!(matches!(bare, TimelineResponse::Bare(ref e) if e.len() == 1));

        let wrapped: TimelineResponse =
            serde_json::from_str(&format!(r#"{{"timeline":[{entry},{entry}]}}"#)).unwrap();
        assert!(matches!(wrapped, TimelineResponse::Wrapped { ref timeline } if timeline.len() == 2));
    }

    #[test]
    fn test_prediction_set_tolerates_missing_fields() {
        let set: PredictionSet = serde_json::from_str(
            r#"{"predictions":[{"timestamp":"2025-03-02T00:00:00Z","predictedSoc":64.5}]}"#,
        )
        .unwrap();
        assert_eq!(set.predictions[0].predicted_soc, Some(64.5));
        assert_eq!(set.predictions[0].clouds, None);
        assert!(set.metadata.model.is_none());
    }
}
