//! # Screen Scheduling and Interruption State Machine
//!
//! This module decides, once per tick, which screen owns the display. It is
//! the one part of the system with real invariants, so it is written as a
//! self-contained state machine with no I/O: the driver loop samples the
//! clock and connectivity, and the scheduler turns that plus its own
//! [`ScheduleState`] into exactly one [`ScreenDirective`].
//!
//! ## Priority order
//!
//! Evaluated strictly top-down every tick:
//! 1. **Night gate**: inside the configured night window nothing else runs;
//!    the directive is always [`ScreenDirective::NightClock`]
//! 2. **Special-screen expiry**: an active special past its duration is
//!    deactivated, and the rotation baseline resets so the regular screen
//!    underneath gets a full fresh duration
//! 3. **Hydration reminder**: fires on the first synced tick of a new hour
//! 4. **Random quote**: fires on a 1-in-N draw once WiFi is up and the
//!    minimum trigger-to-trigger interval has passed, and only if the
//!    hydration reminder did not fire this tick
//! 5. **Rotation advancement**: the cyclic time/date/weather/quote sequence
//!    advances only while no special screen is active
//!
//! At most one special screen exists at a time, and at most one new special
//! starts per tick.
//!
//! ## Timing model
//!
//! Every baseline in [`ScheduleState`] is a monotonic millisecond stamp
//! (`now_ms` in [`TickInput`], supplied by the driver from `Instant`).
//! Wall-clock input is used only for hour-of-day decisions, so an NTP step
//! cannot stretch or collapse a running screen's duration.
//!
//! ## Randomness
//!
//! The random generator is a capability passed into [`Scheduler::tick`], not
//! a hidden global. Tests drive the machine with seeded [`rand::rngs::StdRng`]
//! sequences and get fully deterministic schedules. The 1-in-N quote draw is
//! evaluated once per eligible tick, so the effective trigger rate scales
//! with the tick cadence.

use crate::config::Config;
use crate::quotes;
use crate::weather::WeatherSnapshot;
use crate::ScreenDirective;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One screen of the regular cyclic rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegularScreen {
    Time,
    Date,
    Weather,
    Quote,
}

/// An active interruption of the regular rotation.
///
/// The start stamp is written exactly once, at trigger time, and is only
/// ever read to compute this screen's own expiry. A random quote freezes
/// its text at trigger time; it is never re-rolled mid-display.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialScreen {
    HydrationReminder { started_ms: u64 },
    RandomQuote { started_ms: u64, text: String },
}

impl SpecialScreen {
    fn started_ms(&self) -> u64 {
        match self {
            SpecialScreen::HydrationReminder { started_ms } => *started_ms,
            SpecialScreen::RandomQuote { started_ms, .. } => *started_ms,
        }
    }

    fn duration_ms(&self, config: &Config) -> u64 {
        match self {
            SpecialScreen::HydrationReminder { .. } => config.hydration.duration_ms,
            SpecialScreen::RandomQuote { .. } => config.random_quote.duration_ms,
        }
    }
}

/// Everything the scheduler needs to know about the outside world for one
/// tick. The driver loop builds one of these per iteration.
#[derive(Clone, Copy, Debug)]
pub struct TickInput {
    /// Monotonic milliseconds since process start
    pub now_ms: u64,
    /// Local hour of day, 0-23 (wall clock enters only through this)
    pub hour: u32,
    /// True once the clock source is NTP-synced
    pub synced: bool,
    /// True while the network is reachable
    pub wifi_connected: bool,
}

/// The aggregate mutable schedule state.
///
/// Fields are public so tests can construct arbitrary mid-flight states
/// directly instead of replaying tick histories.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleState {
    /// Index into the configured rotation order
    pub rotation_index: usize,
    /// Monotonic stamp of when the current regular screen became active
    pub screen_since_ms: u64,
    /// The active special screen, if any (mutual exclusion by construction)
    pub special: Option<SpecialScreen>,
    /// Hour that last fired a hydration reminder; `None` until the first one
    pub last_reminder_hour: Option<u32>,
    /// Monotonic stamp of the last random-quote trigger
    pub last_quote_trigger_ms: Option<u64>,
    /// True while the night gate holds the display
    pub night: bool,
}

impl ScheduleState {
    /// Boot state: start of the rotation, no special screen, no history.
    /// The night flag settles on the first tick via the night gate.
    pub fn new() -> Self {
        ScheduleState {
            rotation_index: 0,
            screen_since_ms: 0,
            special: None,
            last_reminder_hour: None,
            last_quote_trigger_ms: None,
            night: false,
        }
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new()
    }
}

/// The screen scheduler. Owns its configuration and state; mutated only by
/// [`Scheduler::tick`].
pub struct Scheduler {
    config: Config,
    state: ScheduleState,
}

impl Scheduler {
    pub fn new(mut config: Config) -> Self {
        // An empty rotation order would leave no screen to fall back to.
        if config.screens.order.is_empty() {
            config.screens.order.push(RegularScreen::Time);
        }
        Scheduler {
            config,
            state: ScheduleState::new(),
        }
    }

    /// Build a scheduler in a specific mid-flight state (tests).
    pub fn with_state(config: Config, state: ScheduleState) -> Self {
        let mut scheduler = Self::new(config);
        scheduler.state = state;
        scheduler
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// The regular screen currently underneath any special screen.
    pub fn current_screen(&self) -> RegularScreen {
        let order = &self.config.screens.order;
        order[self.state.rotation_index % order.len()]
    }

    /// Advance the state machine one tick and emit the render directive.
    ///
    /// The weather snapshot is the cache maintained by the driver loop; it
    /// is only cloned into the directive on weather-screen ticks.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        input: &TickInput,
        weather: &WeatherSnapshot,
        rng: &mut R,
    ) -> ScreenDirective {
        let now = input.now_ms;

        // 1. Night gate: highest priority, short-circuits every other rule.
        // Repeated night ticks must not touch any timer baseline.
        if self.config.night.enabled
            && is_night_hour(input.hour, self.config.night.start_hour, self.config.night.end_hour)
        {
            if !self.state.night {
                info!("entering night mode at hour {}", input.hour);
                self.state.night = true;
                // A special held frozen across the night window would replay
                // stale content at dawn; drop it on the entry edge.
                self.state.special = None;
            }
            return ScreenDirective::NightClock;
        }
        if self.state.night {
            info!("leaving night mode at hour {}", input.hour);
            self.state.night = false;
            // Current regular screen gets a full fresh duration.
            self.state.screen_since_ms = now;
        }

        // 2. Special-screen expiry. The rotation baseline resets so the
        // interrupted screen does not inherit elapsed time.
        if let Some(special) = &self.state.special {
            if now.saturating_sub(special.started_ms()) > special.duration_ms(&self.config) {
                debug!("special screen expired: {:?}", special);
                self.state.special = None;
                self.state.screen_since_ms = now;
            }
        }

        // 3a. Hydration reminder: first synced tick of a new hour, never on
        // top of an active special. Unsynced clock disables only this path.
        let mut hydration_fired = false;
        if self.state.special.is_none()
            && self.config.hydration.enabled
            && input.synced
            && self.state.last_reminder_hour != Some(input.hour)
        {
            info!("hydration reminder fired at hour {}", input.hour);
            self.state.last_reminder_hour = Some(input.hour);
            self.state.special = Some(SpecialScreen::HydrationReminder { started_ms: now });
            hydration_fired = true;
        }

        // 3b. Random quote: loses the tie against hydration, needs network,
        // respects the trigger-to-trigger interval, then rolls the dice.
        if !hydration_fired
            && self.state.special.is_none()
            && self.config.random_quote.enabled
            && input.wifi_connected
            && self.quote_interval_elapsed(now)
            && rng.random_ratio(1, self.config.random_quote.one_in.max(1))
        {
            let text = quotes::pick(&self.config.random_quote.pool, rng);
            info!("random quote fired: {}", text);
            self.state.last_quote_trigger_ms = Some(now);
            self.state.special = Some(SpecialScreen::RandomQuote {
                started_ms: now,
                text,
            });
        }

        // 4. Rotation advancement, only while nothing special is showing.
        if self.state.special.is_none() {
            let duration = self.config.screen_duration_ms(self.current_screen());
            if now.saturating_sub(self.state.screen_since_ms) > duration {
                self.state.rotation_index =
                    (self.state.rotation_index + 1) % self.config.screens.order.len();
                self.state.screen_since_ms = now;
                debug!("rotation advanced to {:?}", self.current_screen());
            }
        }

        // 5. Directive emission: exactly one, every tick.
        match &self.state.special {
            Some(SpecialScreen::HydrationReminder { started_ms }) => {
                let duration = self.config.hydration.duration_ms.max(1);
                let elapsed_fraction =
                    now.saturating_sub(*started_ms) as f32 / duration as f32;
                ScreenDirective::HydrationReminder {
                    elapsed_fraction: elapsed_fraction.clamp(0.0, 1.0),
                }
            }
            Some(SpecialScreen::RandomQuote { text, .. }) => {
                ScreenDirective::RandomQuote(text.clone())
            }
            None => match self.current_screen() {
                RegularScreen::Time => ScreenDirective::Time,
                RegularScreen::Date => ScreenDirective::Date,
                RegularScreen::Weather => ScreenDirective::Weather(weather.clone()),
                RegularScreen::Quote => {
                    ScreenDirective::StaticQuote(self.config.screens.static_quote.clone())
                }
            },
        }
    }

    /// Interval is measured trigger-to-trigger; an unset baseline counts
    /// as elapsed so quotes are eligible as soon as WiFi is up.
    fn quote_interval_elapsed(&self, now_ms: u64) -> bool {
        match self.state.last_quote_trigger_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.random_quote.min_interval_ms,
        }
    }
}

/// Night-window membership. A window with `start > end` wraps midnight
/// (23..7 covers 23:00 through 06:59); `start <= end` is a plain range;
/// `start == end` is empty.
pub fn is_night_hour(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}
