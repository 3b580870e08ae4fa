//! # Deskclock Core Library
//!
//! This library provides the scheduling logic and data structures for a small
//! always-on OLED desk clock. It's designed for low, predictable resource
//! usage on embedded systems like the Raspberry Pi Zero W (512 MB RAM total).
//!
//! ## Design Philosophy
//!
//! ### One directive per tick
//! The heart of the crate is [`scheduler::Scheduler`]: a deterministic state
//! machine driven by an outer loop at a fixed cadence. Every tick consumes a
//! [`ClockReading`] plus a connectivity flag and produces exactly one
//! [`ScreenDirective`] (never zero, never two). Everything the renderer needs
//! travels inside the directive (or alongside it, for wall-clock text), so
//! rendering stays a stateless consumer.
//!
//! ### Monotonic time for durations, wall time for hours
//! All elapsed-time comparisons (screen rotation, special-screen expiry,
//! weather staleness) use monotonic milliseconds supplied by the driver loop.
//! Wall-clock time is consulted only for hour-of-day decisions (night window,
//! hourly hydration reminder), so NTP step corrections cannot double-fire or
//! starve a timer.
//!
//! ### Degrade, never die
//! Network loss, fetch failures and an unsynced clock each disable exactly
//! the features that depend on them. The schedule itself always produces a
//! directive, falling back to cached or placeholder data.
//!
//! ## Data Flow
//! 1. **Tick**: driver reads the clock, probes connectivity, refreshes the
//!    weather cache if due
//! 2. **Schedule**: `Scheduler::tick` resolves night mode, special screens
//!    and rotation into one directive
//! 3. **Render**: the directive is drawn to the OLED (or ASCII terminal in
//!    development mode)

use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod quotes;
pub mod renderer;
pub mod scheduler;
pub mod weather;

#[cfg(feature = "hardware")]
pub mod oled;

use crate::weather::WeatherSnapshot;

/// Seconds since epoch below which the system clock is assumed unsynced.
///
/// A Pi without a battery-backed RTC boots in 1970 until NTP catches up;
/// anything before 2021 is treated as "clock not yet valid".
pub const SYNC_EPOCH_FLOOR: i64 = 1_609_459_200; // 2021-01-01T00:00:00Z

/// A single observation of the wall clock, taken once per tick.
///
/// The scheduler never calls into `chrono` itself; the driver loop samples
/// the clock source once and hands the reading in. This keeps the tick
/// function deterministic and lets tests construct arbitrary readings.
///
/// # Example
/// ```
/// use deskclock_lib::ClockReading;
///
/// // 2024-06-16 14:05:00 UTC, hour already resolved to local time
/// let reading = ClockReading { epoch_seconds: 1_718_546_700, hour: 14, synced: true };
/// assert!(reading.synced);
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ClockReading {
    /// Seconds since the Unix epoch
    pub epoch_seconds: i64,
    /// Local hour of day, 0-23
    pub hour: u32,
    /// True once the clock source reports a plausible (NTP-synced) time
    pub synced: bool,
}

impl ClockReading {
    /// Sample the local wall clock.
    ///
    /// Sync detection is a plausibility check: epochs before
    /// [`SYNC_EPOCH_FLOOR`] mean NTP has not corrected the clock yet.
    pub fn now() -> Self {
        use chrono::{Local, Timelike};
        let now = Local::now();
        let epoch_seconds = now.timestamp();
        ClockReading {
            epoch_seconds,
            hour: now.hour(),
            synced: epoch_seconds >= SYNC_EPOCH_FLOOR,
        }
    }
}

/// The one value the scheduler emits per tick: which screen to render,
/// with the data that screen needs.
///
/// `Time`, `Date` and `NightClock` carry no payload; the renderer formats
/// the current [`ClockReading`] itself. The remaining variants freeze their
/// payload at emission time: a hydration reminder carries the fraction of
/// its display window already elapsed (for the drain-bar animation), and a
/// random quote carries the text picked at trigger time, held fixed for the
/// whole display duration.
#[derive(Clone, Debug, PartialEq)]
pub enum ScreenDirective {
    /// Large clock face
    Time,
    /// Weekday and date
    Date,
    /// Cached weather snapshot (possibly a marked placeholder)
    Weather(WeatherSnapshot),
    /// The configured static quote text shown in the regular rotation
    StaticQuote(String),
    /// Hydration reminder with elapsed display fraction in `0.0..=1.0`
    HydrationReminder { elapsed_fraction: f32 },
    /// Flavor-text quote frozen at trigger time
    RandomQuote(String),
    /// Night mode: time only, rendered for reduced intensity
    NightClock,
}
