use std::sync::Arc;

use parking_lot::Mutex;
use sunshine_weather::WeatherIcon;

use crate::render::{Frame, Paint, Rect};

/// Where frames end up.
///
/// The engine measures text and icons through the surface while laying out a
/// frame, then hands over the finished frame with [`present`](Self::present).
pub trait DisplaySurface: Send {
    fn bounds(&self) -> Rect;

    /// Width of `text` drawn with `paint`
    fn measure_text(&self, text: &str, paint: &Paint) -> f32;

    /// Intrinsic `(width, height)` of an icon, or `None` if it has no asset
    fn icon_size(&self, icon: WeatherIcon) -> Option<(f32, f32)>;

    fn present(&mut self, frame: Frame);
}

/// Shared record of presented frames
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, frame: Frame) {
        self.frames.lock().push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn last(&self) -> Option<Frame> {
        self.frames.lock().last().cloned()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    pub fn clear(&self) {
        self.frames.lock().clear();
    }
}

/// Headless surface with fixed-pitch text metrics.
///
/// Every glyph is `0.6 * text_size` wide and every icon is square. Presented
/// frames go to a [`FrameLog`].
#[derive(Debug, Clone)]
pub struct MonospaceSurface {
    bounds: Rect,
    icon_edge: f32,
    log: FrameLog,
}

impl MonospaceSurface {
    const GLYPH_WIDTH: f32 = 0.6;

    pub fn new(width: u32, height: u32) -> Self {
        Self::with_log(width, height, FrameLog::new())
    }

    pub fn with_log(width: u32, height: u32, log: FrameLog) -> Self {
        Self {
            bounds: Rect::new(width, height),
            icon_edge: 96.0,
            log,
        }
    }

    pub fn log(&self) -> &FrameLog {
        &self.log
    }
}

impl DisplaySurface for MonospaceSurface {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn measure_text(&self, text: &str, paint: &Paint) -> f32 {
        text.chars().count() as f32 * paint.text_size * Self::GLYPH_WIDTH
    }

    fn icon_size(&self, _icon: WeatherIcon) -> Option<(f32, f32)> {
        Some((self.icon_edge, self.icon_edge))
    }

    fn present(&mut self, frame: Frame) {
        tracing::trace!(commands = frame.commands.len(), "Frame presented");
        self.log.push(frame);
    }
}
