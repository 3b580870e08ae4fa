//! # Screen Rendering
//!
//! This module turns a [`ScreenDirective`] into pixels on a 128x64
//! monochrome OLED, with an ASCII terminal mode for development without
//! hardware. It is a stateless consumer: the scheduler decides *what* to
//! show, this module only decides *where the ink goes*. Night dimming is
//! not handled here: contrast is a hardware concern, and the `NightClock`
//! layout is just a sparse clock face.

use crate::weather::WeatherSnapshot;
use crate::{ClockReading, ScreenDirective};
use chrono::{Local, TimeZone};
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
};

/// Display width the layouts are designed for
pub const WIDTH: i32 = 128;
/// Display height the layouts are designed for
pub const HEIGHT: i32 = 64;

/// Characters per line in the small font (128 px / 6 px per glyph)
const WRAP_COLUMNS: usize = 21;

/// Render one directive to the display surface.
///
/// Draw errors are ignored: on the buffered OLED target they are
/// effectively infallible, and a dropped glyph is preferable to a dead
/// render loop.
pub fn draw_screen<D>(display: &mut D, directive: &ScreenDirective, clock: &ClockReading)
where
    D: DrawTarget<Color = BinaryColor>,
{
    match directive {
        ScreenDirective::Time => draw_time(display, clock, true),
        ScreenDirective::Date => draw_date(display, clock),
        ScreenDirective::Weather(snapshot) => draw_weather(display, snapshot),
        ScreenDirective::StaticQuote(text) => draw_quote(display, text, false),
        ScreenDirective::HydrationReminder { elapsed_fraction } => {
            draw_hydration(display, *elapsed_fraction)
        }
        ScreenDirective::RandomQuote(text) => draw_quote(display, text, true),
        ScreenDirective::NightClock => draw_time(display, clock, false),
    }
}

/// Large centered clock face. The full layout adds the date line underneath;
/// the night layout leaves it off.
fn draw_time<D>(display: &mut D, clock: &ClockReading, with_date: bool)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

    let y = if with_date { 32 } else { 38 };
    Text::with_alignment(&time_string(clock), Point::new(WIDTH / 2, y), large, Alignment::Center)
        .draw(display)
        .ok();

    if with_date {
        let (_, date) = date_strings(clock);
        Text::with_alignment(&date, Point::new(WIDTH / 2, 54), small, Alignment::Center)
            .draw(display)
            .ok();
    }
}

/// Weekday over the full date.
fn draw_date<D>(display: &mut D, clock: &ClockReading)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

    let (weekday, date) = date_strings(clock);
    Text::with_alignment(&weekday, Point::new(WIDTH / 2, 26), large, Alignment::Center)
        .draw(display)
        .ok();
    Text::with_alignment(&date, Point::new(WIDTH / 2, 48), small, Alignment::Center)
        .draw(display)
        .ok();
}

/// Temperature large, condition underneath, icon code in the corner slot.
fn draw_weather<D>(display: &mut D, snapshot: &WeatherSnapshot)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

    let temperature = match snapshot.temperature {
        Some(t) => format!("{:.0}'", t),
        None => "--".to_string(),
    };
    Text::with_alignment(&temperature, Point::new(WIDTH / 2, 28), large, Alignment::Center)
        .draw(display)
        .ok();

    if !snapshot.icon.is_empty() {
        Text::new(&snapshot.icon, Point::new(WIDTH - 22, 10), small)
            .draw(display)
            .ok();
    }

    for (line_index, line) in wrap_text(&snapshot.description, WRAP_COLUMNS)
        .iter()
        .take(2)
        .enumerate()
    {
        Text::with_alignment(
            line,
            Point::new(WIDTH / 2, 44 + line_index as i32 * 12),
            small,
            Alignment::Center,
        )
        .draw(display)
        .ok();
    }
}

/// Word-wrapped quote text; random quotes get a distinguishing frame.
fn draw_quote<D>(display: &mut D, text: &str, framed: bool)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

    if framed {
        Rectangle::new(Point::new(0, 0), Size::new(WIDTH as u32, HEIGHT as u32))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(display)
            .ok();
    }

    let lines = wrap_text(text, if framed { WRAP_COLUMNS - 2 } else { WRAP_COLUMNS });
    let shown = lines.len().min(4) as i32;
    let mut y = HEIGHT / 2 - (shown - 1) * 6;
    for line in lines.iter().take(4) {
        Text::with_alignment(line, Point::new(WIDTH / 2, y), small, Alignment::Center)
            .draw(display)
            .ok();
        y += 12;
    }
}

/// Hydration reminder: caption plus a drain bar that empties as the
/// reminder ages. `elapsed_fraction` of 0.0 is a full bar.
fn draw_hydration<D>(display: &mut D, elapsed_fraction: f32)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);

    Text::with_alignment("DRINK", Point::new(WIDTH / 2, 20), large, Alignment::Center)
        .draw(display)
        .ok();
    Text::with_alignment("WATER", Point::new(WIDTH / 2, 40), large, Alignment::Center)
        .draw(display)
        .ok();

    // Bar outline with an inner fill that drains left to right
    let bar = Rectangle::new(Point::new(14, 48), Size::new(100, 10));
    bar.into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(display)
        .ok();

    let remaining = (1.0 - elapsed_fraction.clamp(0.0, 1.0)) * 96.0;
    if remaining >= 1.0 {
        Rectangle::new(Point::new(16, 50), Size::new(remaining as u32, 6))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(display)
            .ok();
    }
}

/// Render one directive as a terminal line (development `--stdout` mode).
pub fn draw_ascii(directive: &ScreenDirective, clock: &ClockReading) {
    match directive {
        ScreenDirective::Time => {
            println!("[time ] {}", time_string(clock));
        }
        ScreenDirective::Date => {
            let (weekday, date) = date_strings(clock);
            println!("[date ] {} {}", weekday, date);
        }
        ScreenDirective::Weather(snapshot) => {
            let temperature = snapshot
                .temperature
                .map(|t| format!("{:.0}'", t))
                .unwrap_or_else(|| "--".to_string());
            println!("[wthr ] {} {}", temperature, snapshot.description);
        }
        ScreenDirective::StaticQuote(text) => {
            println!("[quote] {}", text);
        }
        ScreenDirective::HydrationReminder { elapsed_fraction } => {
            let full = ((1.0 - elapsed_fraction.clamp(0.0, 1.0)) * 10.0).round() as usize;
            println!("[hydr ] drink water [{}{}]", "#".repeat(full), "-".repeat(10 - full));
        }
        ScreenDirective::RandomQuote(text) => {
            println!("[rquot] \"{}\"", text);
        }
        ScreenDirective::NightClock => {
            println!("[night] {} (dim)", time_string(clock));
        }
    }
}

// -- Formatting helpers --

/// "HH:MM" from the tick's clock reading; dashes when the epoch does not
/// resolve to a local timestamp.
fn time_string(clock: &ClockReading) -> String {
    match Local.timestamp_opt(clock.epoch_seconds, 0).single() {
        Some(local) => local.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// ("Monday", "16 Jun 2024") from the tick's clock reading.
fn date_strings(clock: &ClockReading) -> (String, String) {
    match Local.timestamp_opt(clock.epoch_seconds, 0).single() {
        Some(local) => (
            local.format("%A").to_string(),
            local.format("%d %b %Y").to_string(),
        ),
        None => ("---".to_string(), "-- --- ----".to_string()),
    }
}

/// Greedy word wrap; words longer than a line are hard-split.
fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > columns {
            // Hard split for pathological words
            let (head, tail) = word.split_at(columns);
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(head.to_string());
            word = tail;
        }
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= columns {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;

    fn clock() -> ClockReading {
        ClockReading {
            epoch_seconds: 1_718_546_700,
            hour: 14,
            synced: true,
        }
    }

    fn display() -> MockDisplay<BinaryColor> {
        let mut display = MockDisplay::new();
        // The layouts target 128x64; MockDisplay is 64x64 and strict.
        display.set_allow_out_of_bounds_drawing(true);
        display.set_allow_overdraw(true);
        display
    }

    fn pixels_drawn(directive: &ScreenDirective) -> usize {
        let mut target = display();
        draw_screen(&mut target, directive, &clock());
        target
            .bounding_box()
            .points()
            .filter(|p| target.get_pixel(*p) == Some(BinaryColor::On))
            .count()
    }

    #[test]
    fn test_every_directive_draws_something() {
        let directives = [
            ScreenDirective::Time,
            ScreenDirective::Date,
            ScreenDirective::Weather(WeatherSnapshot::placeholder()),
            ScreenDirective::StaticQuote("Stay curious.".to_string()),
            ScreenDirective::HydrationReminder { elapsed_fraction: 0.3 },
            ScreenDirective::RandomQuote("The obstacle is the way.".to_string()),
            ScreenDirective::NightClock,
        ];
        for directive in directives {
            assert!(
                pixels_drawn(&directive) > 0,
                "no pixels drawn for {:?}",
                directive
            );
        }
    }

    #[test]
    fn test_drain_bar_shrinks_with_elapsed_fraction() {
        let fresh = pixels_drawn(&ScreenDirective::HydrationReminder { elapsed_fraction: 0.0 });
        let old = pixels_drawn(&ScreenDirective::HydrationReminder { elapsed_fraction: 0.95 });
        assert!(
            fresh > old,
            "drain bar should lose pixels as the reminder ages ({} vs {})",
            fresh,
            old
        );
    }

    #[test]
    fn test_time_string_formats() {
        let time = time_string(&clock());
        assert_eq!(time.len(), 5);
        assert_eq!(time.as_bytes()[2], b':');
    }

    #[test]
    fn test_date_strings_format() {
        let (weekday, date) = date_strings(&clock());
        assert!(!weekday.is_empty());
        // "16 Jun 2024" shape
        assert_eq!(date.split(' ').count(), 3);
    }

    #[test]
    fn test_wrap_text_respects_columns() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.len() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_text_hard_splits_long_words() {
        let lines = wrap_text("antidisestablishmentarianism", 10);
        assert!(lines.len() >= 3);
        assert!(lines.iter().all(|l| l.len() <= 10));
    }

    #[test]
    fn test_wrap_text_empty_input() {
        assert!(wrap_text("", 10).is_empty());
    }
}
