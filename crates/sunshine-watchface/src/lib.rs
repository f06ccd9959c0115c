//! Wearable watch face.
//!
//! Shows the time, the date and the last weather summary received from the
//! phone. Lifecycle callbacks from the platform arrive as [`EngineEvent`]s;
//! drawing goes through a [`DisplaySurface`].

pub mod clock;
pub mod engine;
pub mod format;
pub mod hooks;
pub mod render;
pub mod surface;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{DisplayState, EngineEvent, EngineHandle, WatchFaceEngine};
pub use hooks::{FixedSystemHooks, SystemHooks};
pub use render::{
    compose_frame, Color, DeviceProperties, DisplayMode, DrawCommand, Frame, ModePaints, Paint,
    PaintSet, Rect, RenderState, ScreenShape,
};
pub use surface::{DisplaySurface, FrameLog, MonospaceSurface};
pub use timer::{next_tick_delay, UpdateTimer};
