// Raw records as delivered by the unified history collaborator
use super::chart_point::PointSource;
use super::errors::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Analysis,
    Weather,
}

/// One item of the merged device + weather stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub timestamp: String,
    #[serde(default)]
    pub data: Value,
    /// Overrides the source tag implied by `kind` (cloud, estimated, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PointSource>,
}

impl TimelineEntry {
    pub fn timestamp_ms(&self) -> Result<i64, ParseError> {
        parse_timestamp_ms(&self.timestamp)
    }

    pub fn point_source(&self) -> PointSource {
        self.source.unwrap_or(match self.kind {
            EntryKind::Analysis => PointSource::Device,
            EntryKind::Weather => PointSource::Weather,
        })
    }
}

pub fn parse_timestamp_ms(value: &str) -> Result<i64, ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc).timestamp_millis())
        .map_err(|source| ParseError::Timestamp {
            value: value.to_string(),
            source,
        })
}
