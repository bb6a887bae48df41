//! Device — a node in a room's wire graph.
//!
//! The original component hierarchy (lights, sensors, appliances, the
//! source) collapses into the [`DeviceKind`] tag plus a small lookup table
//! of per-kind behavior — no inheritance tree, no presence-based duck
//! typing for sensor state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::DeviceId;

/// The kind of electrical component a device represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    Lamp,
    Bulb,
    DeskLamp,
    Tv,
    Radio,
    Computer,
    HeatSensor,
    MotionSensor,
    VoltageSource,
}

impl DeviceKind {
    /// Every kind, in menu order.
    pub const ALL: [Self; 9] = [
        Self::Lamp,
        Self::Bulb,
        Self::DeskLamp,
        Self::Tv,
        Self::Radio,
        Self::Computer,
        Self::HeatSensor,
        Self::MotionSensor,
        Self::VoltageSource,
    ];

    /// Human-readable display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Lamp => "Lamp",
            Self::Bulb => "Bulb",
            Self::DeskLamp => "Desk Lamp",
            Self::Tv => "TV",
            Self::Radio => "Radio",
            Self::Computer => "Computer",
            Self::HeatSensor => "Heat Sensor",
            Self::MotionSensor => "Motion Sensor",
            Self::VoltageSource => "Voltage Source",
        }
    }

    /// Rating above which the component breaks: volts for lights and
    /// sensors, watts for appliances. The source has no limit.
    #[must_use]
    pub fn overload_limit(self) -> Option<u32> {
        match self {
            Self::Lamp | Self::Bulb | Self::DeskLamp => Some(5),
            Self::HeatSensor | Self::MotionSensor => Some(10),
            Self::Tv | Self::Radio | Self::Computer => Some(120),
            Self::VoltageSource => None,
        }
    }

    /// Whether this kind powers a room rather than drawing from it.
    #[must_use]
    pub fn is_source(self) -> bool {
        matches!(self, Self::VoltageSource)
    }

    /// Heat and motion sensors.
    #[must_use]
    pub fn is_sensor(self) -> bool {
        matches!(self, Self::HeatSensor | Self::MotionSensor)
    }

    /// Appliances with an audible running state — the presentation layer
    /// starts/stops playback on their power transitions.
    #[must_use]
    pub fn is_audible(self) -> bool {
        matches!(self, Self::Tv | Self::Radio | Self::Computer)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse failure for [`DeviceKind`].
#[derive(Debug, thiserror::Error)]
#[error("unknown device kind '{0}'")]
pub struct UnknownKindError(String);

impl FromStr for DeviceKind {
    type Err = UnknownKindError;

    /// Accepts the display label or a compact lowercase alias
    /// (`"desk-lamp"`, `"tv"`, `"motion-sensor"`, `"source"`, …).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "lamp" => Ok(Self::Lamp),
            "bulb" => Ok(Self::Bulb),
            "desklamp" => Ok(Self::DeskLamp),
            "tv" => Ok(Self::Tv),
            "radio" => Ok(Self::Radio),
            "computer" | "pc" => Ok(Self::Computer),
            "heatsensor" | "heat" => Ok(Self::HeatSensor),
            "motionsensor" | "motion" => Ok(Self::MotionSensor),
            "voltagesource" | "source" => Ok(Self::VoltageSource),
            _ => Err(UnknownKindError(s.to_string())),
        }
    }
}

/// A single electrical component placed in a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: DeviceId,
    pub kind: DeviceKind,
    /// Physically wired in — distinct from receiving power.
    pub connected: bool,
    /// Cached propagation result; for the source, its own switch state.
    pub powered_on: bool,
    /// Debounced arming state; `Some` only on motion sensors.
    pub armed: Option<bool>,
    /// Placement on the room background, presentation-only.
    pub x: i32,
    pub y: i32,
}

impl Device {
    /// A freshly added device: wired in, unpowered, disarmed.
    #[must_use]
    pub fn new(id: DeviceId, kind: DeviceKind) -> Self {
        Self {
            id,
            kind,
            connected: true,
            powered_on: false,
            armed: (kind == DeviceKind::MotionSensor).then_some(false),
            x: 0,
            y: 0,
        }
    }

    /// Whether this motion sensor is armed. `false` for every other kind.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed == Some(true)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `powered_on` holds without
    /// `connected`, when an armed sensor is unpowered, or when arming state
    /// is present on a non-sensor.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.powered_on && !self.connected {
            return Err(ValidationError::PoweredWhileDisconnected(self.id));
        }
        if self.armed.is_some() && self.kind != DeviceKind::MotionSensor {
            return Err(ValidationError::ArmedStateOnNonSensor(self.id));
        }
        if self.is_armed() && !self.powered_on {
            return Err(ValidationError::ArmedWhileUnpowered(self.id));
        }
        Ok(())
    }
}
