// Interaction commands accepted by POST /interaction
use crate::application::session::ViewSession;
use crate::domain::metric::MetricKey;
use crate::domain::metric_config::Axis;
use crate::domain::timeline::BucketSize;
use crate::domain::viewport::{HitRegion, KeyCommand};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionCommand {
    PointerDown { region: HitRegion, x: f64 },
    PointerMove { x: f64 },
    PointerUp,
    SetZoom { percentage: f64 },
    Key {
        command: KeyCommand,
        #[serde(default)]
        focus_in_text_input: bool,
    },
    ResetView,
    Resize { total_width: f64 },
    SetMetric { key: MetricKey, axis: Axis },
    RemoveMetric { key: MetricKey },
    SetAveraging { enabled: bool },
    /// `null` or absent returns to automatic selection.
    SetBucket {
        #[serde(default)]
        bucket: Option<BucketSize>,
    },
    RetryRender,
    DismissMessage,
}

impl InteractionCommand {
    pub fn apply(self, session: &mut ViewSession) {
        match self {
            InteractionCommand::PointerDown { region, x } => session.pointer_down(region, x),
            InteractionCommand::PointerMove { x } => {
                session.pointer_move(x);
            }
            InteractionCommand::PointerUp => session.pointer_up(),
            InteractionCommand::SetZoom { percentage } => session.set_zoom_percentage(percentage),
            InteractionCommand::Key {
                command,
                focus_in_text_input,
            } => {
                session.handle_key(command, focus_in_text_input);
            }
            InteractionCommand::ResetView => session.reset_view(),
            InteractionCommand::Resize { total_width } => session.resize(total_width),
            InteractionCommand::SetMetric { key, axis } => session.set_metric(key, axis),
            InteractionCommand::RemoveMetric { key } => {
                session.remove_metric(key);
            }
            InteractionCommand::SetAveraging { enabled } => session.set_averaging_enabled(enabled),
            InteractionCommand::SetBucket { bucket } => session.set_manual_bucket(bucket),
            InteractionCommand::RetryRender => session.retry_render(),
            InteractionCommand::DismissMessage => session.dismiss_message(),
        }
    }
}
