// Refresh controller - fetches a selection and installs it unless a newer request won
use crate::application::analytics::{compute_local, device_points, should_compute_locally};
use crate::application::lod_aggregator::build_ladder;
use crate::application::session::ViewSession;
use crate::application::telemetry_source::TelemetrySource;
use crate::application::timeline_unifier::{TimeWindow, records_in_window, unify};
use crate::domain::errors::RefreshError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// One (system, date range) choice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub system_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Needed to derive state of health.
    #[serde(default)]
    pub rated_capacity_ah: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Installed { points: usize },
    Empty,
    /// Superseded by a newer request; nothing was changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    pub local_min_records: usize,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self { local_min_records: 6 }
    }
}

#[derive(Clone)]
pub struct RefreshController {
    source: Arc<dyn TelemetrySource>,
    session: Arc<Mutex<ViewSession>>,
    latest_request: Arc<AtomicU64>,
    latest_prediction: Arc<AtomicU64>,
    settings: RefreshSettings,
}

impl RefreshController {
    pub fn new(source: Arc<dyn TelemetrySource>, session: ViewSession, settings: RefreshSettings) -> Self {
        Self {
            source,
            session: Arc::new(Mutex::new(session)),
            latest_request: Arc::new(AtomicU64::new(0)),
            latest_prediction: Arc::new(AtomicU64::new(0)),
            settings,
        }
    }

    /// Synchronous access to the session. Never call across an await.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut ViewSession) -> R) -> R {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    fn is_current(&self, request_id: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == request_id
    }

    /// Applies `f` only if `request_id` is still the latest refresh.
    fn commit<R>(&self, request_id: u64, f: impl FnOnce(&mut ViewSession) -> R) -> Option<R> {
        self.with_session(|session| self.is_current(request_id).then(|| f(session)))
    }

    pub async fn refresh(&self, selection: Selection) -> Result<RefreshOutcome, RefreshError> {
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        let system_id = selection.system_id.as_str();
        tracing::info!("Refresh #{} for {} ({} .. {})", request_id, system_id, selection.start, selection.end);

        self.with_session(ViewSession::begin_refresh);

        // (a) best effort
        if let Err(e) = self
            .source
            .sync_weather_cache(system_id, selection.start, selection.end)
            .await
        {
            tracing::warn!("Weather sync failed for {}: {:#}", system_id, e);
        }
        if !self.is_current(request_id) {
            return Ok(self.discard(request_id));
        }

        // (b) whole history, filtered locally
        let entries = match self.source.fetch_unified_timeline(system_id).await {
            Ok(entries) => entries,
            Err(e) => {
                let error = RefreshError::Fetch {
                    system_id: system_id.to_string(),
                    message: format!("{e:#}"),
                };
                return match self.commit(request_id, |s| s.fail(&error)) {
                    Some(()) => {
                        tracing::error!("{}", error);
                        Err(error)
                    }
                    None => Ok(self.discard(request_id)),
                };
            }
        };
        if !self.is_current(request_id) {
            return Ok(self.discard(request_id));
        }

        let window = TimeWindow::from_dates(selection.start, selection.end);
        let raw = unify(&entries, window, selection.rated_capacity_ah);
        let point_count = raw.len();
        let ladder = build_ladder(raw);

        // (c) analytics
        let records = records_in_window(&entries, window);
        let analytics = if ladder.is_empty() {
            None
        } else if should_compute_locally(
            device_points(ladder.raw()).len(),
            self.settings.local_min_records,
        ) {
            Some(compute_local(ladder.raw()))
        } else {
            let remote = self.source.compute_analytics(&records).await;
            if !self.is_current(request_id) {
                return Ok(self.discard(request_id));
            }
            remote
                .inspect_err(|e| tracing::warn!("Remote analytics failed for {}: {:#}", system_id, e))
                .ok()
        };

        let installed = self.commit(request_id, |s| s.install_timeline(ladder, analytics));
        let outcome = match installed {
            None => return Ok(self.discard(request_id)),
            Some(true) => RefreshOutcome::Installed { points: point_count },
            Some(false) => RefreshOutcome::Empty,
        };
        tracing::info!(
            "Refresh #{} done in {:?}: {:?}",
            request_id,
            started.elapsed(),
            outcome
        );
        Ok(outcome)
    }

    fn discard(&self, request_id: u64) -> RefreshOutcome {
        tracing::debug!("Discarding stale refresh #{}", request_id);
        RefreshOutcome::Stale
    }

    /// Predictive mode, guarded by its own request counter.
    pub async fn load_predictions(&self, system_id: &str, hours: u32) -> Result<RefreshOutcome, RefreshError> {
        let request_id = self.latest_prediction.fetch_add(1, Ordering::SeqCst) + 1;
        let is_current = || self.latest_prediction.load(Ordering::SeqCst) == request_id;

        let result = self.source.fetch_hourly_predictions(system_id, hours).await;
        if !is_current() {
            tracing::debug!("Discarding stale prediction request #{}", request_id);
            return Ok(RefreshOutcome::Stale);
        }

        let set = result.map_err(|e| RefreshError::Predictions {
            system_id: system_id.to_string(),
            message: format!("{e:#}"),
        })?;
        let points = set.predictions.len();

        self.with_session(|session| {
            if !is_current() {
                return Ok(RefreshOutcome::Stale);
            }
            match session.install_forecast(&set) {
                Ok(true) => Ok(RefreshOutcome::Installed { points }),
                Ok(false) => Ok(RefreshOutcome::Empty),
                Err(e) => {
                    tracing::warn!("Forecast render failed for {}: {}", system_id, e);
                    Ok(RefreshOutcome::Empty)
                }
            }
        })
    }
}
