// AccelWatch — Face Renderer
//
// Draws the clock, one bar per averaged axis, the logging status and the
// battery level onto any monochrome embedded-graphics target.
//
// Layout (proportional to the panel, 128x64 on the OLED):
//
//   +----------------------------+
//   |           12:30            |  time
//   |       Sat, Mar 09          |  date
//   |        [-0.05]####         |  x bar  (positive grows right,
//   |   #####[-0.20]             |  y bar   negative grows left)
//   |        [ 0.98]########     |  z bar
//   |   80% (C)   03/09 12:30 :) |  battery / log status
//   +----------------------------+

use std::cell::Cell;

use chrono::NaiveDateTime;
use embedded_graphics::mono_font::ascii::{FONT_4X6, FONT_5X8, FONT_6X10, FONT_9X15_BOLD};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::config::ACCEL_MAX;
use crate::events::{AveragedReading, BatteryState, StatusRecord};
use crate::numeric::format_signed_milli;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub reading: AveragedReading,
    pub status: StatusRecord,
    pub now: NaiveDateTime,
    pub battery: BatteryState,
    pub clock_24h: bool,
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

pub fn time_label(now: &NaiveDateTime, clock_24h: bool) -> String {
    if clock_24h {
        now.format("%H:%M").to_string()
    } else {
        // 12h without the AM/PM suffix.
        now.format("%-I:%M").to_string()
    }
}

pub fn date_label(now: &NaiveDateTime) -> String {
    now.format("%a, %b %d").to_string()
}

pub fn status_label(record: &StatusRecord) -> String {
    let changed = match record.changed_at {
        Some(at) => at.format("%m/%d %H:%M").to_string(),
        None => "--/-- --:--".to_string(),
    };
    format!("{}  {}", changed, record.status.mood())
}

pub fn battery_label(battery: &BatteryState) -> String {
    let pct = battery.charge_percent;
    match (battery.is_charging, battery.is_plugged) {
        (true, true) => format!("{}% (C/P)", pct),
        (false, true) => format!("{}% (P)", pct),
        (true, false) => format!("{}% (C)", pct),
        (false, false) => format!("{}%", pct),
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceLayout {
    pub size: Size,
    pub x_center: i32,
    pub y_center: i32,
    pub bar_height: u32,
    pub max_bar_width: i32,
}

impl FaceLayout {
    pub fn for_size(size: Size) -> Self {
        let x_center = size.width as i32 / 2;
        let y_center = size.height as i32 / 2;
        Self {
            size,
            x_center,
            y_center,
            bar_height: (y_center / 4).max(1) as u32,
            max_bar_width: (x_center - 16).max(0),
        }
    }

    pub fn time_box(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(self.size.width, (self.y_center / 2) as u32))
    }

    pub fn date_box(&self) -> Rectangle {
        let top = self.y_center / 2 + 2;
        Rectangle::new(
            Point::new(0, top),
            Size::new(self.size.width, (self.y_center - top).max(0) as u32),
        )
    }

    /// Top edge of the bar for `axis` (0 = x, 1 = y, 2 = z). Index 3 is the
    /// status row.
    pub fn row_top(&self, axis: usize) -> i32 {
        self.y_center + axis as i32 * self.bar_height as i32
    }

    /// Bar for one axis. Positive values grow right of the label column,
    /// negative ones grow left. Zero draws nothing.
    pub fn bar_rect(&self, value: i32, top: i32) -> Option<Rectangle> {
        if value == 0 {
            return None;
        }
        let max = i64::from(self.max_bar_width);
        let width = (max * i64::from(value).abs() / i64::from(ACCEL_MAX)).min(max) as i32;
        let x = if value > 0 {
            self.max_bar_width + 32
        } else {
            self.max_bar_width - width
        };
        Some(Rectangle::new(Point::new(x, top), Size::new(width as u32, self.bar_height)))
    }

    pub fn label_box(&self, top: i32) -> Rectangle {
        Rectangle::new(Point::new(self.x_center - 14, top + 1), Size::new(26, self.bar_height))
    }

    pub fn status_box(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x_center - 14, self.row_top(3) + 1),
            Size::new((self.max_bar_width + 26) as u32, self.bar_height),
        )
    }

    pub fn battery_box(&self) -> Rectangle {
        Rectangle::new(
            Point::new(0, self.row_top(3) + 1),
            Size::new(self.max_bar_width as u32, self.bar_height),
        )
    }
}

// ---------------------------------------------------------------------------
// Re-entrancy guard
// ---------------------------------------------------------------------------

/// Marks a render as in progress. Only one token can exist at a time.
#[derive(Debug, Default)]
pub struct RenderLock {
    busy: Cell<bool>,
}

impl RenderLock {
    pub fn try_acquire(&self) -> Option<RenderToken<'_>> {
        if self.busy.replace(true) {
            None
        } else {
            Some(RenderToken { lock: self })
        }
    }

    pub fn is_held(&self) -> bool {
        self.busy.get()
    }
}

/// Releases the lock when dropped, including on early returns.
#[must_use]
pub struct RenderToken<'a> {
    lock: &'a RenderLock,
}

impl Drop for RenderToken<'_> {
    fn drop(&mut self) {
        self.lock.busy.set(false);
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

pub struct WatchRenderer {
    layout: FaceLayout,
    lock: RenderLock,
}

impl WatchRenderer {
    pub fn new(size: Size) -> Self {
        Self {
            layout: FaceLayout::for_size(size),
            lock: RenderLock::default(),
        }
    }

    pub fn layout(&self) -> &FaceLayout {
        &self.layout
    }

    pub fn lock(&self) -> &RenderLock {
        &self.lock
    }

    /// Draw `frame`. Returns `Ok(false)` without touching the target when
    /// another render is still in progress.
    pub fn render<D>(&self, target: &mut D, frame: &Frame) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(_token) = self.lock.try_acquire() else {
            log::debug!("Render already in progress, skipping");
            return Ok(false);
        };

        let layout = &self.layout;
        target.clear(BinaryColor::Off)?;

        draw_text(
            target,
            &time_label(&frame.now, frame.clock_24h),
            &FONT_9X15_BOLD,
            layout.time_box(),
            Alignment::Center,
        )?;
        draw_text(target, &date_label(&frame.now), &FONT_6X10, layout.date_box(), Alignment::Center)?;

        let bar_style = PrimitiveStyle::with_fill(BinaryColor::On);
        for (axis, value) in frame.reading.axes().into_iter().enumerate() {
            let top = layout.row_top(axis);
            let Some(bar) = layout.bar_rect(value, top) else {
                continue;
            };
            bar.into_styled(bar_style).draw(target)?;
            draw_text(
                target,
                &format_signed_milli(value),
                &FONT_5X8,
                layout.label_box(top),
                Alignment::Right,
            )?;
        }

        draw_text(target, &status_label(&frame.status), &FONT_4X6, layout.status_box(), Alignment::Right)?;
        draw_text(target, &battery_label(&frame.battery), &FONT_4X6, layout.battery_box(), Alignment::Right)?;

        Ok(true)
    }
}

/// Draw `text` inside `area`, clipped to it.
fn draw_text<D>(
    target: &mut D,
    text: &str,
    font: &MonoFont<'_>,
    area: Rectangle,
    alignment: Alignment,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let anchor_x = match alignment {
        Alignment::Left => area.top_left.x,
        Alignment::Center => area.top_left.x + area.size.width as i32 / 2,
        Alignment::Right => area.top_left.x + area.size.width as i32 - 1,
    };
    let character_style = MonoTextStyle::new(font, BinaryColor::On);
    let text_style = TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Top)
        .build();

    let mut clipped = target.clipped(&area);
    Text::with_text_style(text, Point::new(anchor_x, area.top_left.y), character_style, text_style)
        .draw(&mut clipped)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
    use crate::display::Framebuffer;
    use crate::events::LoggingStatus;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn oled_layout() -> FaceLayout {
        FaceLayout::for_size(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT))
    }

    fn frame(reading: AveragedReading) -> Frame {
        Frame {
            reading,
            status: StatusRecord { status: LoggingStatus::Success, changed_at: Some(at(8, 5)) },
            now: at(21, 7),
            battery: BatteryState::default(),
            clock_24h: true,
        }
    }

    struct FailingTarget;

    impl OriginDimensions for FailingTarget {
        fn size(&self) -> Size {
            Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
        }
    }

    impl DrawTarget for FailingTarget {
        type Color = BinaryColor;
        type Error = ();

        fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            Err(())
        }
    }

    #[test]
    fn test_time_labels() {
        assert_eq!(time_label(&at(21, 7), true), "21:07");
        assert_eq!(time_label(&at(21, 7), false), "9:07");
        assert_eq!(time_label(&at(0, 30), false), "12:30");
        assert_eq!(date_label(&at(21, 7)), "Sat, Mar 09");
    }

    #[test]
    fn test_status_labels() {
        let record = StatusRecord { status: LoggingStatus::Busy, changed_at: Some(at(8, 5)) };
        assert_eq!(status_label(&record), "03/09 08:05  :|");
        assert_eq!(status_label(&StatusRecord::default()), "--/-- --:--  :(");
    }

    #[test]
    fn test_battery_labels() {
        let mut battery = BatteryState { charge_percent: 80, is_charging: true, is_plugged: true };
        assert_eq!(battery_label(&battery), "80% (C/P)");
        battery.is_charging = false;
        assert_eq!(battery_label(&battery), "80% (P)");
        battery.is_plugged = false;
        assert_eq!(battery_label(&battery), "80%");
        battery.is_charging = true;
        assert_eq!(battery_label(&battery), "80% (C)");
    }

    #[test]
    fn test_layout_geometry() {
        let layout = oled_layout();
        assert_eq!(layout.x_center, 64);
        assert_eq!(layout.y_center, 32);
        assert_eq!(layout.bar_height, 8);
        assert_eq!(layout.max_bar_width, 48);
        assert_eq!(layout.row_top(3), 56);
    }

    #[test]
    fn test_bar_rects() {
        let layout = oled_layout();
        assert_eq!(layout.bar_rect(0, 32), None);

        let positive = layout.bar_rect(500, 32).unwrap();
        assert_eq!(positive.top_left, Point::new(80, 32));
        assert_eq!(positive.size, Size::new(24, 8));

        let negative = layout.bar_rect(-1000, 40).unwrap();
        assert_eq!(negative.top_left, Point::new(0, 40));
        assert_eq!(negative.size.width, 48);

        // Readings beyond 1 g are clamped to the full bar.
        assert_eq!(layout.bar_rect(4000, 32).unwrap().size.width, 48);
        assert_eq!(layout.bar_rect(i32::MIN, 32).unwrap().size.width, 48);
    }

    #[test]
    fn test_render_draws_bars_on_correct_side() {
        let renderer = WatchRenderer::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
        let mut fb = Framebuffer::oled();
        assert!(renderer.render(&mut fb, &frame(AveragedReading::new(1000, -1000, 0))).unwrap());

        // x bar fills the right half of row 0, y bar the left half of row 1.
        assert_eq!(fb.lit_in(80, 32, 48, 8), 48 * 8);
        assert_eq!(fb.lit_in(0, 40, 48, 8), 48 * 8);
        // No z bar either side.
        assert_eq!(fb.lit_in(0, 48, 48, 8), 0);
        assert_eq!(fb.lit_in(80, 48, 48, 8), 0);
        // Time text is drawn.
        assert!(fb.lit_in(0, 0, 128, 16) > 0);
        assert!(!renderer.lock().is_held());
    }

    #[test]
    fn test_render_clears_previous_frame() {
        let renderer = WatchRenderer::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
        let mut fb = Framebuffer::oled();
        renderer.render(&mut fb, &frame(AveragedReading::new(1000, 0, 0))).unwrap();
        renderer.render(&mut fb, &frame(AveragedReading::new(-1000, 0, 0))).unwrap();
        assert_eq!(fb.lit_in(80, 32, 48, 8), 0);
        assert_eq!(fb.lit_in(0, 32, 48, 8), 48 * 8);
    }

    #[test]
    fn test_overlapping_render_is_declined() {
        let renderer = WatchRenderer::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
        let mut fb = Framebuffer::oled();

        let token = renderer.lock().try_acquire().unwrap();
        assert!(!renderer.render(&mut fb, &frame(AveragedReading::new(500, 0, 0))).unwrap());
        assert_eq!(fb.lit_pixels(), 0);

        drop(token);
        assert!(renderer.render(&mut fb, &frame(AveragedReading::new(500, 0, 0))).unwrap());
        assert!(fb.lit_pixels() > 0);
    }

    #[test]
    fn test_lock_released_after_draw_error() {
        let renderer = WatchRenderer::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
        assert!(renderer.render(&mut FailingTarget, &frame(AveragedReading::default())).is_err());
        assert!(!renderer.lock().is_held());
        assert!(renderer.lock().try_acquire().is_some());
    }
}
