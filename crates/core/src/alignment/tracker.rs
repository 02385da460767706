//! Alignment against the target bearing
//!
//! Converts a heading into the needle rotation toward the target and a
//! discrete zone (aligned / close / off).
//!
//! The rotation is accumulated from shortest-path steps rather than taken
//! from the wrapped relative angle, so a rendered needle can spin through any
//! number of revolutions without snapping back at the ±180° boundary.

use crate::navigation::{circular_delta, wrap_180, Bearing};

/// Alignment zone of the device relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Within the aligned threshold
    Aligned,
    /// Within the close threshold
    Close,
    /// Anything else
    Off,
}

impl Zone {
    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Aligned => "Aligned",
            Zone::Close => "Close",
            Zone::Off => "Off",
        }
    }

    /// Compact encoding for published state
    pub fn to_u8(self) -> u8 {
        match self {
            Zone::Aligned => 0,
            Zone::Close => 1,
            Zone::Off => 2,
        }
    }

    /// Decode from [`Zone::to_u8`]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Zone::Aligned),
            1 => Some(Zone::Close),
            2 => Some(Zone::Off),
            _ => None,
        }
    }
}

/// A change of zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneTransition {
    pub from: Zone,
    pub to: Zone,
    pub timestamp_ms: u64,
}

impl ZoneTransition {
    /// True if this transition enters the aligned zone
    pub fn entered_aligned(&self) -> bool {
        self.to == Zone::Aligned && self.from != Zone::Aligned
    }

    /// True if this transition leaves the aligned zone
    pub fn exited_aligned(&self) -> bool {
        self.from == Zone::Aligned && self.to != Zone::Aligned
    }
}

/// Zone thresholds
#[derive(Debug, Clone, Copy)]
pub struct AlignmentConfig {
    /// `|relative|` below this is aligned (degrees)
    pub aligned_zone_deg: f32,
    /// `|relative|` below this is close (degrees)
    pub close_zone_deg: f32,
    /// Extra margin required to leave a zone (degrees, 0 = none)
    pub zone_hysteresis_deg: f32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            aligned_zone_deg: 5.0,
            close_zone_deg: 15.0,
            zone_hysteresis_deg: 0.0,
        }
    }
}

/// Output of the tracker after an update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentState {
    /// Total signed rotation toward the target, unbounded (degrees)
    pub cumulative_relative_angle: f32,
    /// `target - heading` in `(-180, 180]`
    pub relative_angle: f32,
    pub current_zone: Zone,
    pub last_zone_change_timestamp_ms: u64,
}

impl Default for AlignmentState {
    fn default() -> Self {
        Self {
            cumulative_relative_angle: 0.0,
            relative_angle: 0.0,
            current_zone: Zone::Off,
            last_zone_change_timestamp_ms: 0,
        }
    }
}

/// Result of one tracker update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentUpdate {
    pub state: AlignmentState,
    pub transition: Option<ZoneTransition>,
}

/// Tracks relative rotation and zone against a target bearing.
pub struct AlignmentTracker {
    config: AlignmentConfig,
    state: AlignmentState,
    prev_relative: Option<f32>,
    target: Option<Bearing>,
}

impl AlignmentTracker {
    /// Create a new tracker
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            config: sanitize(config),
            state: AlignmentState::default(),
            prev_relative: None,
            target: None,
        }
    }

    /// Latest state
    pub fn state(&self) -> &AlignmentState {
        &self.state
    }

    /// Target bearing used by the last update
    pub fn target(&self) -> Option<Bearing> {
        self.target
    }

    /// Replace zone thresholds; the current zone is re-evaluated on the next update
    pub fn set_config(&mut self, config: AlignmentConfig) {
        self.config = sanitize(config);
    }

    /// Update with the current heading and target bearing.
    ///
    /// A changed target only affects the relative angle from here on; the
    /// accumulated rotation is never reset.
    pub fn update(&mut self, heading: f32, target: Bearing, timestamp_ms: u64) -> AlignmentUpdate {
        let relative = wrap_180(target.degrees() - heading);

        match self.prev_relative {
            None => self.state.cumulative_relative_angle = relative,
            Some(prev) => self.state.cumulative_relative_angle += circular_delta(relative, prev),
        }
        self.prev_relative = Some(relative);
        self.target = Some(target);
        self.state.relative_angle = relative;

        let zone = self.classify(libm::fabsf(relative));
        let transition = if zone != self.state.current_zone {
            let transition = ZoneTransition {
                from: self.state.current_zone,
                to: zone,
                timestamp_ms,
            };
            self.state.current_zone = zone;
            self.state.last_zone_change_timestamp_ms = timestamp_ms;
            Some(transition)
        } else {
            None
        };

        AlignmentUpdate {
            state: self.state,
            transition,
        }
    }

    fn classify(&self, abs_relative: f32) -> Zone {
        let current = self.state.current_zone;
        let margin = self.config.zone_hysteresis_deg;

        let aligned_limit = if current == Zone::Aligned {
            self.config.aligned_zone_deg + margin
        } else {
            self.config.aligned_zone_deg
        };
        if abs_relative < aligned_limit {
            return Zone::Aligned;
        }

        let close_limit = if current == Zone::Off {
            self.config.close_zone_deg
        } else {
            self.config.close_zone_deg + margin
        };
        if abs_relative < close_limit {
            Zone::Close
        } else {
            Zone::Off
        }
    }
}

fn sanitize(config: AlignmentConfig) -> AlignmentConfig {
    let aligned = config.aligned_zone_deg.max(0.0);
    AlignmentConfig {
        aligned_zone_deg: aligned,
        close_zone_deg: config.close_zone_deg.max(aligned),
        zone_hysteresis_deg: config.zone_hysteresis_deg.max(0.0),
    }
}
