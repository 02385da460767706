//! Rate-limited feedback event dispatch
//!
//! Derives discrete feedback events (alignment, cardinal crossings, rotation
//! ticks, calibration) from the continuous heading signal and debounces them
//! so sensor-rate noise never reaches the haptic layer as "buzzing".
//!
//! # Rules
//!
//! - One cooldown window is shared by every event type
//! - `AlignedEntered` fires at most once per entry into the aligned zone; the
//!   reported alignment only flips back after `AlignedExited` was reported
//! - Alignment and calibration changes blocked by the cooldown are delivered
//!   once it expires; cardinal crossings and rotation ticks are dropped

use heapless::Vec;

use crate::alignment::ZoneTransition;
use crate::navigation::{circular_delta, wrap_360};

/// Maximum events a single dispatch can produce
pub const EVENT_BUFFER_CAPACITY: usize = 4;

/// Events produced by one dispatch call
pub type EventBuffer = Vec<DispatchedEvent, EVENT_BUFFER_CAPACITY>;

/// Cardinal compass points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinal {
    North,
    East,
    South,
    West,
}

impl Cardinal {
    const ALL: [Cardinal; 4] = [Cardinal::North, Cardinal::East, Cardinal::South, Cardinal::West];

    /// Heading of this cardinal point
    pub fn degrees(&self) -> f32 {
        match self {
            Cardinal::North => 0.0,
            Cardinal::East => 90.0,
            Cardinal::South => 180.0,
            Cardinal::West => 270.0,
        }
    }

    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinal::North => "North",
            Cardinal::East => "East",
            Cardinal::South => "South",
            Cardinal::West => "West",
        }
    }

    /// Cardinal point within `window_deg` of `heading`, if any
    pub fn within(heading: f32, window_deg: f32) -> Option<Cardinal> {
        Self::ALL
            .into_iter()
            .find(|c| libm::fabsf(circular_delta(heading, c.degrees())) <= window_deg)
    }

    /// Cardinal point passed when moving from `from` to `to` along the
    /// shortest path, if any
    pub fn crossed_between(from: f32, to: f32) -> Option<Cardinal> {
        let step = circular_delta(to, from);
        if step == 0.0 {
            return None;
        }
        Self::ALL.into_iter().find(|c| {
            let offset = circular_delta(c.degrees(), from);
            if step > 0.0 {
                offset > 0.0 && offset <= step
            } else {
                offset < 0.0 && offset >= step
            }
        })
    }
}

/// Discrete feedback for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    AlignedEntered,
    AlignedExited,
    CardinalCrossed(Cardinal),
    RotationTick,
    CalibrationAchieved,
}

impl FeedbackEvent {
    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackEvent::AlignedEntered => "AlignedEntered",
            FeedbackEvent::AlignedExited => "AlignedExited",
            FeedbackEvent::CardinalCrossed(_) => "CardinalCrossed",
            FeedbackEvent::RotationTick => "RotationTick",
            FeedbackEvent::CalibrationAchieved => "CalibrationAchieved",
        }
    }
}

/// An event with the sample timestamp that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub event: FeedbackEvent,
    pub timestamp_ms: u64,
}

/// Dispatcher configuration
#[derive(Debug, Clone, Copy)]
pub struct FeedbackConfig {
    /// Minimum spacing between any two emitted events (ms)
    pub cooldown_ms: u64,
    /// Half-width of the window around each cardinal point (degrees)
    pub cardinal_window_deg: f32,
    /// Accumulated rotation per tick (degrees)
    pub rotation_tick_deg: f32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 90,
            cardinal_window_deg: 2.0,
            rotation_tick_deg: 15.0,
        }
    }
}

/// Signals sampled after one heading update
#[derive(Debug, Clone, Copy)]
pub struct FeedbackInput {
    pub timestamp_ms: u64,
    /// Authoritative heading in `[0, 360)`
    pub heading: f32,
    /// Unbounded needle rotation (degrees), `None` while there is no target
    pub cumulative_rotation: Option<f32>,
    /// Zone change produced by this update, if any
    pub transition: Option<ZoneTransition>,
    /// The heading filter became calibrated on this update
    pub calibration_achieved: bool,
}

/// Detects entries into the window around a cardinal point.
///
/// Fast rotation can step over a window between two samples; passing the
/// cardinal point itself counts as a crossing too.
#[derive(Debug, Clone)]
pub struct CardinalDetector {
    window_deg: f32,
    prev_heading: Option<f32>,
    latched: Option<Cardinal>,
}

impl CardinalDetector {
    pub fn new(window_deg: f32) -> Self {
        Self {
            window_deg: window_deg.max(0.0),
            prev_heading: None,
            latched: None,
        }
    }

    /// Returns the cardinal point crossed by this heading update.
    ///
    /// The first heading only arms the detector.
    pub fn update(&mut self, heading: f32) -> Option<Cardinal> {
        let heading = wrap_360(heading);
        let in_window = Cardinal::within(heading, self.window_deg);
        let Some(prev) = self.prev_heading.replace(heading) else {
            self.latched = in_window;
            return None;
        };
        let crossed = Cardinal::crossed_between(prev, heading);

        let hit = in_window.or(crossed);
        let fired = if hit.is_some() && hit != self.latched {
            hit
        } else {
            None
        };
        self.latched = in_window.or(fired);
        fired
    }
}

/// Emits a tick each time the rotation moves a full step from the last tick.
#[derive(Debug, Clone)]
pub struct RotationTicker {
    step_deg: f32,
    anchor: Option<f32>,
}

impl RotationTicker {
    pub fn new(step_deg: f32) -> Self {
        Self {
            step_deg: step_deg.max(f32::EPSILON),
            anchor: None,
        }
    }

    /// Returns true when a tick is due
    pub fn update(&mut self, cumulative_rotation: f32) -> bool {
        match self.anchor {
            None => {
                self.anchor = Some(cumulative_rotation);
                false
            }
            Some(anchor) => {
                if libm::fabsf(cumulative_rotation - anchor) >= self.step_deg {
                    self.anchor = Some(cumulative_rotation);
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Debounces feedback events behind a shared cooldown.
pub struct FeedbackDispatcher {
    config: FeedbackConfig,
    last_emit_ms: Option<u64>,
    in_aligned_zone: bool,
    aligned_reported: bool,
    calibration_pending: bool,
    cardinal: CardinalDetector,
    ticker: RotationTicker,
}

impl FeedbackDispatcher {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            last_emit_ms: None,
            in_aligned_zone: false,
            aligned_reported: false,
            calibration_pending: false,
            cardinal: CardinalDetector::new(config.cardinal_window_deg),
            ticker: RotationTicker::new(config.rotation_tick_deg),
        }
    }

    /// Replace tuning values; detector positions are kept
    pub fn set_config(&mut self, config: FeedbackConfig) {
        self.config = config;
        self.cardinal.window_deg = config.cardinal_window_deg.max(0.0);
        self.ticker.step_deg = config.rotation_tick_deg.max(f32::EPSILON);
    }

    /// Timestamp of the last emitted event
    pub fn last_emit_ms(&self) -> Option<u64> {
        self.last_emit_ms
    }

    /// Process one update and append the events to emit.
    pub fn process(&mut self, input: &FeedbackInput, out: &mut EventBuffer) {
        let now = input.timestamp_ms;
        let cardinal = self.cardinal.update(input.heading);
        let tick = input
            .cumulative_rotation
            .is_some_and(|rotation| self.ticker.update(rotation));

        if input.calibration_achieved {
            self.calibration_pending = true;
        }
        if let Some(transition) = input.transition {
            if transition.entered_aligned() {
                self.in_aligned_zone = true;
            } else if transition.exited_aligned() {
                self.in_aligned_zone = false;
            }
        }

        if self.calibration_pending && self.try_emit(FeedbackEvent::CalibrationAchieved, now, out)
        {
            self.calibration_pending = false;
        }

        if self.in_aligned_zone != self.aligned_reported {
            let event = if self.in_aligned_zone {
                FeedbackEvent::AlignedEntered
            } else {
                FeedbackEvent::AlignedExited
            };
            if self.try_emit(event, now, out) {
                self.aligned_reported = self.in_aligned_zone;
            }
        }

        if let Some(cardinal) = cardinal {
            self.try_emit(FeedbackEvent::CardinalCrossed(cardinal), now, out);
        }

        if tick {
            self.try_emit(FeedbackEvent::RotationTick, now, out);
        }
    }

    fn cooldown_elapsed(&self, now: u64) -> bool {
        match self.last_emit_ms {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.config.cooldown_ms,
        }
    }

    fn try_emit(&mut self, event: FeedbackEvent, now: u64, out: &mut EventBuffer) -> bool {
        if !self.cooldown_elapsed(now) {
            return false;
        }
        if out
            .push(DispatchedEvent {
                event,
                timestamp_ms: now,
            })
            .is_err()
        {
            return false;
        }
        self.last_emit_ms = Some(now);
        true
    }
}
