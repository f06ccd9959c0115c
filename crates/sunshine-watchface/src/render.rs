//! Render state and frame layout.
//!
//! Layout is pure: given the state, paints and a surface to measure text
//! with, [`compose_frame`] returns the list of draw commands for one frame.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sunshine_core::LayoutConfig;
use sunshine_weather::{WeatherIcon, WeatherSummary};

use crate::format::{format_date, format_time};
use crate::surface::DisplaySurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Interactive,
    Ambient,
}

/// Display capabilities reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceProperties {
    pub low_bit_ambient: bool,
    pub burn_in_protection: bool,
}

/// Screen outline reported by the window insets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenShape {
    Round,
    #[default]
    Square,
}

/// ARGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const PRIMARY: Color = Color(0xFF03_A9F4);
    pub const SECONDARY_TEXT_LIGHT: Color = Color(0xB3FF_FFFF);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub bold: bool,
    pub text_size: f32,
    pub anti_alias: bool,
}

impl Paint {
    fn text(color: Color, bold: bool) -> Self {
        Self {
            color,
            bold,
            text_size: 0.0,
            anti_alias: true,
        }
    }

    fn without_anti_alias(mut self) -> Self {
        self.anti_alias = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center_x(&self) -> f32 {
        self.width as f32 / 2.0
    }
}

/// Interactive and ambient paints for every text row
#[derive(Debug, Clone, PartialEq)]
pub struct PaintSet {
    pub background: Color,
    pub time: Paint,
    pub time_ambient: Paint,
    pub date: Paint,
    pub date_ambient: Paint,
    pub high: Paint,
    pub high_ambient: Paint,
    pub low: Paint,
    pub low_ambient: Paint,
}

/// The four paints used for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModePaints {
    pub time: Paint,
    pub date: Paint,
    pub high: Paint,
    pub low: Paint,
    /// Divider line, `None` when it is left out
    pub divider: Option<Paint>,
}

impl Default for PaintSet {
    fn default() -> Self {
        Self {
            background: Color::PRIMARY,
            time: Paint::text(Color::WHITE, true),
            time_ambient: Paint::text(Color::WHITE, false),
            date: Paint::text(Color::SECONDARY_TEXT_LIGHT, false),
            date_ambient: Paint::text(Color::WHITE, false),
            high: Paint::text(Color::WHITE, true),
            high_ambient: Paint::text(Color::WHITE, false),
            low: Paint::text(Color::SECONDARY_TEXT_LIGHT, false),
            low_ambient: Paint::text(Color::WHITE, false),
        }
    }
}

impl PaintSet {
    pub fn new(shape: ScreenShape, layout: &LayoutConfig) -> Self {
        let mut paints = Self::default();
        paints.apply_text_sizes(shape, layout);
        paints
    }

    /// Pick text sizes for the screen shape
    pub fn apply_text_sizes(&mut self, shape: ScreenShape, layout: &LayoutConfig) {
        let (time, date, temp) = match shape {
            ScreenShape::Round => (
                layout.time_text_size_round,
                layout.date_text_size_round,
                layout.temp_text_size_round,
            ),
            ScreenShape::Square => (
                layout.time_text_size,
                layout.date_text_size,
                layout.temp_text_size,
            ),
        };

        self.time.text_size = time;
        self.time_ambient.text_size = time;
        self.date.text_size = date;
        self.date_ambient.text_size = date;
        for paint in [
            &mut self.high,
            &mut self.high_ambient,
            &mut self.low,
            &mut self.low_ambient,
        ] {
            paint.text_size = temp;
        }
    }

    /// Paints for `mode`.
    ///
    /// Ambient on a low-bit display drops anti-aliasing. Ambient with burn-in
    /// protection leaves out the static divider line.
    pub fn for_mode(&self, mode: DisplayMode, properties: &DeviceProperties) -> ModePaints {
        match mode {
            DisplayMode::Interactive => ModePaints {
                time: self.time,
                date: self.date,
                high: self.high,
                low: self.low,
                divider: Some(self.date_ambient),
            },
            DisplayMode::Ambient => {
                let strip = |paint: Paint| {
                    if properties.low_bit_ambient {
                        paint.without_anti_alias()
                    } else {
                        paint
                    }
                };
                ModePaints {
                    time: strip(self.time_ambient),
                    date: strip(self.date_ambient),
                    high: strip(self.high_ambient),
                    low: strip(self.low_ambient),
                    divider: (!properties.burn_in_protection).then(|| strip(self.date_ambient)),
                }
            }
        }
    }
}

/// Everything a frame depends on besides paints and layout
#[derive(Debug, Clone)]
pub struct RenderState {
    pub now: DateTime<Tz>,
    pub time_zone: Tz,
    pub weather: Option<WeatherSummary>,
    pub icon: Option<WeatherIcon>,
    pub mode: DisplayMode,
}

impl RenderState {
    pub fn new(time_zone: Tz, now_millis: i64) -> Self {
        let now = DateTime::<Utc>::from_timestamp_millis(now_millis)
            .unwrap_or_default()
            .with_timezone(&time_zone);
        Self {
            now,
            time_zone,
            weather: None,
            icon: None,
            mode: DisplayMode::Interactive,
        }
    }

    pub fn update_time(&mut self, now_millis: i64) {
        match DateTime::<Utc>::from_timestamp_millis(now_millis) {
            Some(utc) => self.now = utc.with_timezone(&self.time_zone),
            None => tracing::warn!(now_millis, "Clock out of range, keeping previous time"),
        }
    }

    pub fn set_time_zone(&mut self, time_zone: Tz) {
        self.time_zone = time_zone;
        self.now = self.now.with_timezone(&time_zone);
    }

    /// Store a new summary and resolve its icon
    pub fn set_weather(&mut self, summary: WeatherSummary) {
        self.icon = summary.icon();
        if self.icon.is_none() {
            tracing::debug!(code = summary.condition_code, "No icon for condition code");
        }
        self.weather = Some(summary);
    }

    pub fn has_weather(&self) -> bool {
        self.weather.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill(Color),
    Line {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        paint: Paint,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        paint: Paint,
    },
    Icon {
        icon: WeatherIcon,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// One composed frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub bounds: Rect,
    pub mode: DisplayMode,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    /// Text rows in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn icon(&self) -> Option<WeatherIcon> {
        self.commands.iter().find_map(|c| match c {
            DrawCommand::Icon { icon, .. } => Some(*icon),
            _ => None,
        })
    }

    pub fn text_command(&self, text: &str) -> Option<&DrawCommand> {
        self.commands
            .iter()
            .find(|c| matches!(c, DrawCommand::Text { text: t, .. } if t == text))
    }
}

/// Lay out one frame.
///
/// Time and date are centred on their rows. When a summary is present the
/// temperatures are centred as a group beneath the date; interactive mode
/// prefixes them with the icon scaled to the temperature text height.
pub fn compose_frame(
    state: &RenderState,
    paints: &ModePaints,
    background: Color,
    layout: &LayoutConfig,
    use_24_hour: bool,
    surface: &dyn DisplaySurface,
) -> Frame {
    let bounds = surface.bounds();
    let cx = bounds.center_x();
    let ambient = state.mode == DisplayMode::Ambient;
    let mut commands = Vec::new();

    commands.push(DrawCommand::Fill(if ambient {
        Color::BLACK
    } else {
        background
    }));

    let time = format_time(&state.now, use_24_hour);
    let date = format_date(&state.now);

    let time_width = surface.measure_text(&time, &paints.time);
    commands.push(DrawCommand::Text {
        text: time,
        x: cx - time_width / 2.0,
        y: layout.time_y_offset,
        paint: paints.time,
    });

    let date_width = surface.measure_text(&date, &paints.date);
    commands.push(DrawCommand::Text {
        text: date,
        x: cx - date_width / 2.0,
        y: layout.date_y_offset,
        paint: paints.date,
    });

    if let Some(paint) = paints.divider {
        commands.push(DrawCommand::Line {
            x0: cx - layout.divider_half_width,
            y0: layout.divider_y_offset,
            x1: cx + layout.divider_half_width,
            y1: layout.divider_y_offset,
            paint,
        });
    }

    if let Some(weather) = &state.weather {
        let high_width = surface.measure_text(&weather.high, &paints.high);
        let low_width = surface.measure_text(&weather.low, &paints.low);

        // Icon scaled to the temperature text height, aspect preserved
        let icon = if ambient {
            None
        } else {
            state
                .icon
                .and_then(|icon| surface.icon_size(icon).map(|size| (icon, size)))
                .filter(|(_, (_, h))| *h > 0.0)
                .map(|(icon, (w, h))| {
                    let height = paints.high.text_size;
                    (icon, height / h * w, height)
                })
        };

        let x_high = match icon {
            Some((icon, width, height)) => {
                let x_icon =
                    cx - (high_width + low_width + layout.icon_gap + width) / 2.0;
                commands.push(DrawCommand::Icon {
                    icon,
                    x: x_icon,
                    y: layout.weather_y_offset - height,
                    width,
                    height,
                });
                x_icon + layout.icon_gap + width
            }
            None => cx - (high_width + low_width) / 2.0,
        };

        commands.push(DrawCommand::Text {
            text: weather.high.clone(),
            x: x_high,
            y: layout.weather_y_offset,
            paint: paints.high,
        });
        commands.push(DrawCommand::Text {
            text: weather.low.clone(),
            x: x_high + high_width,
            y: layout.weather_y_offset,
            paint: paints.low,
        });
    }

    Frame {
        bounds,
        mode: state.mode,
        commands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MonospaceSurface;

    // Sat 2026-10-17 14:05:09 UTC
    const NOW: i64 = 1_792_245_909_000;

    fn state(mode: DisplayMode, weather: Option<WeatherSummary>) -> RenderState {
        let mut state = RenderState::new(Tz::UTC, NOW);
        state.mode = mode;
        if let Some(w) = weather {
            state.set_weather(w);
        }
        state
    }

    fn compose(state: &RenderState, low_bit: bool) -> Frame {
        let properties = DeviceProperties {
            low_bit_ambient: low_bit,
            burn_in_protection: false,
        };
        compose_with(state, &properties)
    }

    fn compose_with(state: &RenderState, properties: &DeviceProperties) -> Frame {
        let layout = LayoutConfig::default();
        let paints = PaintSet::new(ScreenShape::Square, &layout);
        let surface = MonospaceSurface::new(320, 320);
        compose_frame(
            state,
            &paints.for_mode(state.mode, properties),
            paints.background,
            &layout,
            true,
            &surface,
        )
    }

    #[test]
    fn test_frame_without_weather_has_only_time_and_date() {
        let frame = compose(&state(DisplayMode::Interactive, None), false);
        assert_eq!(frame.texts(), vec!["14:05", "SAT, OCT 17 2026"]);
        assert_eq!(frame.icon(), None);
        assert_eq!(frame.commands[0], DrawCommand::Fill(Color::PRIMARY));
    }

    #[test]
    fn test_interactive_weather_row_has_icon_and_temperatures() {
        let weather = WeatherSummary::new("25°", "14°", 200);
        let frame = compose(&state(DisplayMode::Interactive, Some(weather)), false);

        assert_eq!(frame.texts(), vec!["14:05", "SAT, OCT 17 2026", "25°", "14°"]);
        assert_eq!(frame.icon(), Some(WeatherIcon::Storm));
    }

    #[test]
    fn test_weather_row_is_centred_as_a_group() {
        let layout = LayoutConfig::default();
        let weather = WeatherSummary::new("25°", "14°", 800);
        let frame = compose(&state(DisplayMode::Interactive, Some(weather)), false);

        let Some(DrawCommand::Icon { x: icon_x, width, height, y, .. }) =
            frame.commands.iter().find(|c| matches!(c, DrawCommand::Icon { .. }))
        else {
            panic!("missing icon");
        };
        let Some(DrawCommand::Text { x: low_x, paint, .. }) = frame.text_command("14°") else {
            panic!("missing low");
        };

        let surface = MonospaceSurface::new(320, 320);
        let low_width = surface.measure_text("14°", paint);
        let left_margin = *icon_x;
        let right_margin = 320.0 - (low_x + low_width);
        assert!((left_margin - right_margin).abs() < 0.01);
        assert_eq!(*height, layout.temp_text_size);
        assert!(*width > 0.0);
        assert_eq!(*y, layout.weather_y_offset - layout.temp_text_size);
    }

    #[test]
    fn test_ambient_omits_icon_and_uses_black_background() {
        let weather = WeatherSummary::new("25°", "14°", 200);
        let frame = compose(&state(DisplayMode::Ambient, Some(weather)), false);

        assert_eq!(frame.commands[0], DrawCommand::Fill(Color::BLACK));
        assert_eq!(frame.icon(), None);
        assert_eq!(frame.texts(), vec!["14:05", "SAT, OCT 17 2026", "25°", "14°"]);
    }

    #[test]
    fn test_low_bit_ambient_disables_anti_alias() {
        let weather = WeatherSummary::new("25°", "14°", 200);
        let frame = compose(&state(DisplayMode::Ambient, Some(weather.clone())), true);
        for command in &frame.commands {
            if let DrawCommand::Text { paint, .. } = command {
                assert!(!paint.anti_alias);
                assert_eq!(paint.color, Color::WHITE);
            }
        }

        let frame = compose(&state(DisplayMode::Ambient, Some(weather)), false);
        assert!(frame.commands.iter().all(|c| match c {
            DrawCommand::Text { paint, .. } => paint.anti_alias,
            _ => true,
        }));
    }

    #[test]
    fn test_burn_in_protection_drops_divider_in_ambient_only() {
        let has_line = |frame: &Frame| {
            frame
                .commands
                .iter()
                .any(|c| matches!(c, DrawCommand::Line { .. }))
        };
        let properties = DeviceProperties {
            low_bit_ambient: false,
            burn_in_protection: true,
        };

        assert!(!has_line(&compose_with(&state(DisplayMode::Ambient, None), &properties)));
        assert!(has_line(&compose_with(&state(DisplayMode::Interactive, None), &properties)));
        assert!(has_line(&compose(&state(DisplayMode::Ambient, None), false)));
    }

    #[test]
    fn test_unknown_condition_draws_temperatures_without_icon() {
        let weather = WeatherSummary::new("25°", "14°", 999);
        let frame = compose(&state(DisplayMode::Interactive, Some(weather)), false);
        assert_eq!(frame.icon(), None);
        assert!(frame.text_command("25°").is_some());
    }

    #[test]
    fn test_round_screen_uses_round_sizes() {
        let layout = LayoutConfig::default();
        let paints = PaintSet::new(ScreenShape::Round, &layout);
        assert_eq!(paints.time.text_size, layout.time_text_size_round);
        assert_eq!(paints.low_ambient.text_size, layout.temp_text_size_round);
    }

    #[test]
    fn test_time_zone_change_keeps_instant() {
        let mut state = RenderState::new(Tz::UTC, NOW);
        state.set_time_zone(chrono_tz::Asia::Tokyo);
        assert_eq!(crate::format::format_time(&state.now, true), "23:05");
        assert_eq!(state.now.timestamp_millis(), NOW);
    }
}
