// View session - all mutable chart state for one viewer, updated synchronously
use crate::application::predictions::{Forecast, build_forecast};
use crate::application::scale_builder::{SceneSettings, build_scene, find_tooltip};
use crate::domain::analytics::{AlertEvent, AnalyticsReport};
use crate::domain::errors::{RefreshError, RenderError};
use crate::domain::metric::MetricKey;
use crate::domain::metric_config::{Axis, MetricConfig};
use crate::domain::prediction::PredictionSet;
use crate::domain::scene::{ChartScene, TooltipHit};
use crate::domain::timeline::{AveragingConfig, BucketSize, LodLadder, TimelineData};
use crate::domain::viewport::{HitRegion, KeyCommand, ViewportController, ViewportSettings};
use serde::Serialize;
use tracing::{debug, warn};

pub const EMPTY_STATE_MESSAGE: &str = "No data available for the selected range";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Idle,
    Generating,
    Ready,
    Empty,
    Failed,
}

/// Serializable view of the session for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: RefreshStatus,
    pub message: Option<String>,
    pub render_error: Option<String>,
    pub averaging: AveragingConfig,
    pub metrics: MetricConfig,
    pub scene: Option<ChartScene>,
    pub analytics: Option<AnalyticsReport>,
}

#[derive(Debug)]
pub struct ViewSession {
    timeline: Option<TimelineData>,
    viewport: ViewportController,
    metrics: MetricConfig,
    /// User averaging choices, carried across refreshes.
    averaging: AveragingConfig,
    analytics: Option<AnalyticsReport>,
    scene: Option<ChartScene>,
    forecast: Option<Forecast>,
    render_error: Option<RenderError>,
    message: Option<String>,
    status: RefreshStatus,
    settings: SceneSettings,
}

impl ViewSession {
    pub fn new(total_width: f64, viewport: ViewportSettings, settings: SceneSettings) -> Self {
        Self {
            timeline: None,
            viewport: ViewportController::new(total_width, viewport),
            metrics: MetricConfig::default(),
            averaging: AveragingConfig::default(),
            analytics: None,
            scene: None,
            forecast: None,
            render_error: None,
            message: None,
            status: RefreshStatus::Idle,
            settings,
        }
    }

    pub fn timeline(&self) -> Option<&TimelineData> {
        self.timeline.as_ref()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn metrics(&self) -> &MetricConfig {
        &self.metrics
    }

    pub fn averaging(&self) -> AveragingConfig {
        self.averaging
    }

    pub fn analytics(&self) -> Option<&AnalyticsReport> {
        self.analytics.as_ref()
    }

    pub fn scene(&self) -> Option<&ChartScene> {
        self.scene.as_ref()
    }

    pub fn forecast(&self) -> Option<&Forecast> {
        self.forecast.as_ref()
    }

    pub fn render_error(&self) -> Option<&RenderError> {
        self.render_error.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn status(&self) -> RefreshStatus {
        self.status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            message: self.message.clone(),
            render_error: self.render_error.as_ref().map(ToString::to_string),
            averaging: self.averaging,
            metrics: self.metrics.clone(),
            scene: self.scene.clone(),
            analytics: self.analytics.clone(),
        }
    }

    // Interaction

    pub fn pointer_down(&mut self, region: HitRegion, x: f64) {
        self.viewport.pointer_down(region, x);
    }

    pub fn pointer_move(&mut self, x: f64) -> bool {
        let changed = self.viewport.pointer_move(x);
        if changed {
            self.recompute_scene();
        }
        changed
    }

    pub fn pointer_up(&mut self) {
        self.viewport.pointer_up();
    }

    pub fn set_zoom_percentage(&mut self, percentage: f64) {
        self.viewport.set_zoom_percentage(percentage);
        self.recompute_scene();
    }

    pub fn handle_key(&mut self, command: KeyCommand, focus_in_text_input: bool) -> bool {
        let changed = self.viewport.handle_key(command, focus_in_text_input);
        if changed {
            self.recompute_scene();
        }
        changed
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.recompute_scene();
    }

    pub fn resize(&mut self, total_width: f64) {
        self.viewport.set_total_width(total_width);
        let width = self.viewport.total_width();
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.resize(width);
        }
        self.recompute_scene();
    }

    pub fn set_metric(&mut self, key: MetricKey, axis: Axis) {
        self.metrics.set(key, axis);
        self.recompute_scene();
    }

    pub fn remove_metric(&mut self, key: MetricKey) -> bool {
        let removed = self.metrics.remove(key);
        if removed {
            self.recompute_scene();
        }
        removed
    }

    pub fn set_averaging_enabled(&mut self, enabled: bool) {
        self.averaging.enabled = enabled;
        if !enabled {
            self.averaging.manual_bucket = None;
        }
        self.apply_averaging();
    }

    /// `None` returns bucket choice to the zoom level.
    pub fn set_manual_bucket(&mut self, bucket: Option<BucketSize>) {
        self.averaging.manual_bucket = bucket;
        if bucket.is_some() {
            self.averaging.enabled = true;
        }
        self.apply_averaging();
    }

    fn apply_averaging(&mut self) {
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.set_averaging_enabled(self.averaging.enabled);
            timeline.set_manual_bucket(self.averaging.manual_bucket);
        }
        self.recompute_scene();
    }

    /// Screen x inside the main plot, resolved against the active LOD.
    pub fn tooltip(&self, screen_x: f64) -> Option<TooltipHit> {
        let timeline = self.timeline.as_ref()?;
        find_tooltip(
            timeline.active_points(),
            timeline.x_scale(),
            self.viewport.view_box(),
            self.viewport.screen_to_chart_x(screen_x),
            &self.metrics,
            self.settings.tooltip_threshold_ratio,
        )
    }

    /// Rebuilds geometry from the current view, metrics and LOD.
    pub fn recompute_scene(&mut self) {
        let Some(timeline) = self.timeline.as_mut() else {
            self.scene = None;
            return;
        };
        timeline.set_auto_bucket(self.viewport.auto_bucket());
        self.averaging.auto_bucket = timeline.averaging.auto_bucket;

        let alerts: &[AlertEvent] = self
            .analytics
            .as_ref()
            .map(|a| a.alert_analysis.events.as_slice())
            .unwrap_or_default();

        match build_scene(timeline, &self.viewport, &self.metrics, alerts, &self.settings) {
            Ok(scene) => {
                self.scene = Some(scene);
                self.render_error = None;
            }
            Err(e) => {
                warn!("Chart render failed: {}", e);
                self.scene = None;
                self.render_error = Some(e);
            }
        }
    }

    pub fn retry_render(&mut self) {
        self.render_error = None;
        self.recompute_scene();
    }

    pub fn dismiss_message(&mut self) {
        self.message = None;
    }

    // Refresh lifecycle

    /// Analytics are cleared while the previous chart stays visible.
    pub fn begin_refresh(&mut self) {
        self.analytics = None;
        self.message = None;
        self.status = RefreshStatus::Generating;
        self.recompute_scene();
    }

    /// Returns false when the ladder was empty and the empty state was shown.
    pub fn install_timeline(&mut self, ladder: LodLadder, analytics: Option<AnalyticsReport>) -> bool {
        let Some(timeline) = TimelineData::new(ladder, self.viewport.total_width(), self.averaging)
        else {
            self.install_empty();
            return false;
        };
        debug!("Installing timeline with {} raw points", timeline.raw_points().len());
        self.timeline = Some(timeline);
        self.analytics = analytics;
        self.viewport.reset();
        self.status = RefreshStatus::Ready;
        self.recompute_scene();
        true
    }

    pub fn install_empty(&mut self) {
        self.timeline = None;
        self.scene = None;
        self.render_error = None;
        self.status = RefreshStatus::Empty;
        self.message = Some(EMPTY_STATE_MESSAGE.to_string());
    }

    /// Prior chart is kept.
    pub fn fail(&mut self, error: &RefreshError) {
        self.status = RefreshStatus::Failed;
        self.message = Some(error.user_message());
    }

    /// Returns whether a forecast was produced.
    pub fn install_forecast(&mut self, set: &PredictionSet) -> Result<bool, RenderError> {
        let forecast = build_forecast(set, &self.metrics, self.viewport.total_width(), &self.settings)?;
        let installed = forecast.is_some();
        self.forecast = forecast;
        Ok(installed)
    }
}
