// Viewport/brush controller - pointer-driven pan, zoom and brush state machine
use super::timeline::BucketSize;
use serde::{Deserialize, Serialize};

/// Visible sub-range of the chart in internal pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub width: f64,
}

impl ViewBox {
    pub fn full(total_width: f64) -> Self {
        Self {
            x: 0.0,
            width: total_width,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.x && x <= self.right()
    }
}

/// Where a pointer-down landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitRegion {
    ChartArea,
    BrushWindow,
    BrushLeftHandle,
    BrushRightHandle,
}

/// Drag state; each variant remembers where the drag started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionMode {
    Idle,
    MainPan { origin: f64, start: ViewBox },
    BrushPan { origin: f64, start: ViewBox },
    BrushResizeLeft { origin: f64, start: ViewBox },
    BrushResizeRight { origin: f64, start: ViewBox },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCommand {
    ZoomIn,
    ZoomOut,
    Reset,
}

/// Zoom ratio thresholds, ascending: below `[0]` selects 1 day, below `[1]`
/// 4 hours, then 1 hour, 15 minutes, 5 minutes; anything above is raw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodThresholds(pub [f64; 5]);

impl Default for LodThresholds {
    fn default() -> Self {
        Self([2.0, 5.0, 15.0, 50.0, 100.0])
    }
}

impl LodThresholds {
    pub fn bucket_for_ratio(&self, zoom_ratio: f64) -> BucketSize {
        const COARSE_TO_FINE: [BucketSize; 5] = [
            BucketSize::OneDay,
            BucketSize::FourHours,
            BucketSize::OneHour,
            BucketSize::FifteenMinutes,
            BucketSize::FiveMinutes,
        ];
        self.0
            .iter()
            .zip(COARSE_TO_FINE)
            .find(|(limit, _)| zoom_ratio < **limit)
            .map(|(_, bucket)| bucket)
            .unwrap_or(BucketSize::Raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSettings {
    pub min_brush_width: f64,
    pub keyboard_zoom_factor: f64,
    pub max_zoom_percentage: f64,
    pub lod_thresholds: LodThresholds,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_brush_width: 10.0,
            keyboard_zoom_factor: 1.5,
            max_zoom_percentage: 10_000.0,
            lod_thresholds: LodThresholds::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    total_width: f64,
    view_box: ViewBox,
    mode: InteractionMode,
    settings: ViewportSettings,
}

impl ViewportController {
    pub fn new(total_width: f64, settings: ViewportSettings) -> Self {
        let total_width = total_width.max(0.0);
        Self {
            total_width,
            view_box: ViewBox::full(total_width),
            mode: InteractionMode::Idle,
            settings,
        }
    }

    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    pub fn total_width(&self) -> f64 {
        self.total_width
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    pub fn zoom_ratio(&self) -> f64 {
        if self.view_box.width <= 0.0 {
            return 1.0;
        }
        self.total_width / self.view_box.width
    }

    pub fn zoom_percentage(&self) -> f64 {
        self.zoom_ratio() * 100.0
    }

    pub fn auto_bucket(&self) -> BucketSize {
        self.settings.lod_thresholds.bucket_for_ratio(self.zoom_ratio())
    }

    pub fn pointer_down(&mut self, region: HitRegion, x: f64) {
        let start = self.view_box;
        self.mode = match region {
            HitRegion::ChartArea => InteractionMode::MainPan { origin: x, start },
            HitRegion::BrushWindow => InteractionMode::BrushPan { origin: x, start },
            HitRegion::BrushLeftHandle => InteractionMode::BrushResizeLeft { origin: x, start },
            HitRegion::BrushRightHandle => InteractionMode::BrushResizeRight { origin: x, start },
        };
    }

    /// Returns true when the view box changed.
    pub fn pointer_move(&mut self, x: f64) -> bool {
        let next = match self.mode {
            InteractionMode::Idle => return false,
            InteractionMode::MainPan { origin, start } => {
                let scale = if self.total_width > 0.0 {
                    start.width / self.total_width
                } else {
                    0.0
                };
                ViewBox {
                    x: start.x - (x - origin) * scale,
                    width: start.width,
                }
            }
            InteractionMode::BrushPan { origin, start } => ViewBox {
                x: start.x + (x - origin),
                width: start.width,
            },
            InteractionMode::BrushResizeLeft { origin, start } => {
                let floor = self.width_floor();
                let right = start.right();
                let left = (start.x + (x - origin)).clamp(0.0, (right - floor).max(0.0));
                ViewBox {
                    x: left,
                    width: right - left,
                }
            }
            InteractionMode::BrushResizeRight { origin, start } => {
                let floor = self.width_floor();
                let max_width = (self.total_width - start.x).max(floor);
                ViewBox {
                    x: start.x,
                    width: (start.width + (x - origin)).clamp(floor, max_width),
                }
            }
        };
        let next = self.clamp(next);
        let changed = next != self.view_box;
        self.view_box = next;
        changed
    }

    /// Ends any drag, wherever the pointer was released.
    pub fn pointer_up(&mut self) {
        self.mode = InteractionMode::Idle;
    }

    pub fn set_zoom_percentage(&mut self, percentage: f64) {
        if !percentage.is_finite() || self.total_width <= 0.0 {
            return;
        }
        let percentage = percentage.clamp(100.0, self.settings.max_zoom_percentage.max(100.0));
        let width = (self.total_width / (percentage / 100.0)).max(self.width_floor());
        let center = self.view_box.x + self.view_box.width / 2.0;
        self.view_box = self.clamp(ViewBox {
            x: center - width / 2.0,
            width,
        });
    }

    /// Keyboard shortcuts are ignored while a text input has focus.
    pub fn handle_key(&mut self, command: KeyCommand, focus_in_text_input: bool) -> bool {
        if focus_in_text_input {
            return false;
        }
        let before = self.view_box;
        match command {
            KeyCommand::ZoomIn => {
                self.set_zoom_percentage(self.zoom_percentage() * self.settings.keyboard_zoom_factor)
            }
            KeyCommand::ZoomOut => {
                self.set_zoom_percentage(self.zoom_percentage() / self.settings.keyboard_zoom_factor)
            }
            KeyCommand::Reset => self.reset(),
        }
        before != self.view_box
    }

    pub fn reset(&mut self) {
        self.mode = InteractionMode::Idle;
        self.view_box = ViewBox::full(self.total_width);
    }

    /// Keeps the same relative window when the chart is resized.
    pub fn set_total_width(&mut self, total_width: f64) {
        let total_width = total_width.max(0.0);
        if self.total_width > 0.0 {
            let factor = total_width / self.total_width;
            self.view_box = ViewBox {
                x: self.view_box.x * factor,
                width: self.view_box.width * factor,
            };
        } else {
            self.view_box = ViewBox::full(total_width);
        }
        self.total_width = total_width;
        self.view_box = self.clamp(self.view_box);
    }

    /// Screen x inside the main plot to internal chart x.
    pub fn screen_to_chart_x(&self, screen_x: f64) -> f64 {
        if self.total_width <= 0.0 {
            return self.view_box.x;
        }
        self.view_box.x + screen_x * self.view_box.width / self.total_width
    }

    fn width_floor(&self) -> f64 {
        self.settings.min_brush_width.min(self.total_width)
    }

    fn clamp(&self, view: ViewBox) -> ViewBox {
        let width = view.width.clamp(self.width_floor(), self.total_width);
        let x = view.x.clamp(0.0, self.total_width - width);
        ViewBox { x, width }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOTAL: f64 = 1000.0;

    fn controller() -> ViewportController {
        ViewportController::new(TOTAL, ViewportSettings::default())
    }

    fn assert_within_domain(c: &ViewportController) {
        let view = c.view_box();
        assert!(view.x >= 0.0, "x below zero: {view:?}");
        assert!(view.right() <= c.total_width() + 1e-9, "overflows domain: {view:?}");
        assert!(view.width >= c.settings().min_brush_width - 1e-9, "below floor: {view:?}");
    }

    #[test]
    fn test_zoom_then_reset_view() {
        let mut c = controller();
        c.set_zoom_percentage(400.0);
        assert_eq!(c.view_box(), ViewBox { x: 375.0, width: 250.0 });
        assert_eq!(c.zoom_percentage(), 400.0);

        c.reset();
        assert_eq!(c.view_box(), ViewBox::full(TOTAL));
        assert_eq!(c.zoom_percentage(), 100.0);
    }

    #[test]
    fn test_main_pan_drag_right_reveals_earlier_time() {
        let mut c = controller();
        c.set_zoom_percentage(400.0);
        c.pointer_down(HitRegion::ChartArea, 500.0);
        assert!(c.pointer_move(600.0));
        // 100 screen px at 4x zoom is 25 internal px
        assert_eq!(c.view_box().x, 350.0);
        c.pointer_up();
        assert_eq!(c.mode(), InteractionMode::Idle);
        assert!(!c.pointer_move(900.0));
    }

    #[test]
    fn test_brush_pan_is_one_to_one_and_clamped() {
        let mut c = controller();
        c.set_zoom_percentage(200.0);
        c.pointer_down(HitRegion::BrushWindow, 10.0);
        c.pointer_move(110.0);
        assert_eq!(c.view_box().x, 350.0);
        c.pointer_move(5_000.0);
        assert_eq!(c.view_box(), ViewBox { x: 500.0, width: 500.0 });
        assert_within_domain(&c);
    }

    #[test]
    fn test_right_handle_clamps_to_floor() {
        let mut c = controller();
        c.set_zoom_percentage(200.0);
        c.pointer_down(HitRegion::BrushRightHandle, 750.0);
        c.pointer_move(-2_000.0);
        let view = c.view_box();
        assert_eq!(view.width, 10.0);
        assert_eq!(view.x, 250.0);
        assert!(view.x <= view.right());
    }

    #[test]
    fn test_left_handle_keeps_right_edge() {
        let mut c = controller();
        c.set_zoom_percentage(200.0);
        c.pointer_down(HitRegion::BrushLeftHandle, 250.0);
        c.pointer_move(100.0);
        assert_eq!(c.view_box(), ViewBox { x: 100.0, width: 650.0 });
        c.pointer_move(2_000.0);
        assert_eq!(c.view_box(), ViewBox { x: 740.0, width: 10.0 });
    }

    #[test]
    fn test_keyboard_suppressed_in_text_input() {
        let mut c = controller();
        assert!(!c.handle_key(KeyCommand::ZoomIn, true));
        assert_eq!(c.zoom_percentage(), 100.0);
        assert!(c.handle_key(KeyCommand::ZoomIn, false));
        assert!((c.zoom_percentage() - 150.0).abs() < 1e-9);
        assert!(c.handle_key(KeyCommand::Reset, false));
        assert_eq!(c.zoom_percentage(), 100.0);
    }

    #[test]
    fn test_zoom_out_never_exceeds_full_width() {
        let mut c = controller();
        c.set_zoom_percentage(20.0);
        assert_eq!(c.view_box(), ViewBox::full(TOTAL));
    }

    #[test]
    fn test_resize_keeps_relative_window() {
        let mut c = controller();
        c.set_zoom_percentage(400.0);
        c.set_total_width(2000.0);
        assert_eq!(c.view_box(), ViewBox { x: 750.0, width: 500.0 });
        assert_eq!(c.zoom_percentage(), 400.0);
    }

    #[test]
    fn test_auto_bucket_ladder() {
        let t = LodThresholds::default();
        assert_eq!(t.bucket_for_ratio(1.0), BucketSize::OneDay);
        assert_eq!(t.bucket_for_ratio(3.0), BucketSize::FourHours);
        assert_eq!(t.bucket_for_ratio(10.0), BucketSize::OneHour);
        assert_eq!(t.bucket_for_ratio(20.0), BucketSize::FifteenMinutes);
        assert_eq!(t.bucket_for_ratio(75.0), BucketSize::FiveMinutes);
        assert_eq!(t.bucket_for_ratio(150.0), BucketSize::Raw);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Down(u8, f64),
        Move(f64),
        Up,
        Zoom(f64),
        Key(bool),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, -500.0..1500.0f64).prop_map(|(r, x)| Op::Down(r, x)),
            (-3000.0..3000.0f64).prop_map(Op::Move),
            Just(Op::Up),
            (1.0..20_000.0f64).prop_map(Op::Zoom),
            any::<bool>().prop_map(Op::Key),
        ]
    }

    proptest! {
        #[test]
        fn prop_view_box_stays_in_domain(ops in prop::collection::vec(op(), 1..60)) {
            let mut c = controller();
            for op in ops {
                match op {
                    Op::Down(r, x) => {
                        let region = [
                            HitRegion::ChartArea,
                            HitRegion::BrushWindow,
                            HitRegion::BrushLeftHandle,
                            HitRegion::BrushRightHandle,
                        ][r as usize];
                        c.pointer_down(region, x);
                    }
                    Op::Move(x) => { c.pointer_move(x); }
                    Op::Up => c.pointer_up(),
                    Op::Zoom(p) => c.set_zoom_percentage(p),
                    Op::Key(zoom_in) => {
                        let cmd = if zoom_in { KeyCommand::ZoomIn } else { KeyCommand::ZoomOut };
                        c.handle_key(cmd, false);
                    }
                }
                assert_within_domain(&c);
            }
        }

        #[test]
        fn prop_auto_bucket_monotonic(a in 0.5..500.0f64, b in 0.5..500.0f64) {
            let t = LodThresholds::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            // Finer buckets sort first, so more zoom must never sort later.
            prop_assert!(t.bucket_for_ratio(hi) <= t.bucket_for_ratio(lo));
        }
    }
}
