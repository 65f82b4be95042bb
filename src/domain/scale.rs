// Linear scales mapping data space to internal chart pixels
use serde::Serialize;

/// Span used when every point shares one timestamp.
const DEGENERATE_SPAN_MS: i64 = 60 * 60 * 1000;

/// Maps epoch milliseconds onto `[0, width]` internal pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeScale {
    start_ms: i64,
    end_ms: i64,
    width: f64,
}

impl TimeScale {
    pub fn new(start_ms: i64, end_ms: i64, width: f64) -> Self {
        let (start_ms, end_ms) = if end_ms > start_ms {
            (start_ms, end_ms)
        } else {
            (
                start_ms - DEGENERATE_SPAN_MS / 2,
                start_ms + DEGENERATE_SPAN_MS / 2,
            )
        };
        Self {
            start_ms,
            end_ms,
            width,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn span_ms(&self) -> f64 {
        (self.end_ms - self.start_ms) as f64
    }

    pub fn x(&self, timestamp_ms: i64) -> f64 {
        (timestamp_ms - self.start_ms) as f64 / self.span_ms() * self.width
    }

    /// Inverse of [`TimeScale::x`].
    pub fn time_at(&self, x: f64) -> f64 {
        if self.width <= 0.0 {
            return self.start_ms as f64;
        }
        self.start_ms as f64 + x / self.width * self.span_ms()
    }

    pub fn with_width(&self, width: f64) -> Self {
        Self { width, ..*self }
    }
}

/// Value scale onto a pixel range; the y axis is inverted (range `[height, 0]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r1 == r0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }

    /// `count` evenly spaced domain values from min to max inclusive.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        match count {
            0 => Vec::new(),
            1 => vec![(d0 + d1) / 2.0],
            n => (0..n)
                .map(|i| d0 + (d1 - d0) * i as f64 / (n - 1) as f64)
                .collect(),
        }
    }
}
