//! Logical DIO pins and their `{group, pin}` assignments.
//!
//! The controller exposes four output groups (`DO_G0`..`DO_G3`) and four input
//! groups (`DI_G0`..`DI_G3`) of four pins each. The winch uses four outputs and
//! three inputs; [`PinSet`] maps each logical name to its physical address and
//! is immutable once loaded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::{DIO_GROUP_COUNT, DIO_PINS_PER_GROUP};

/// Logical level of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Token used by the controller's `dio set` command.
    #[inline]
    pub const fn as_wire(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }

    /// The opposite level.
    #[inline]
    pub const fn inverted(&self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Parse a `dio get` readback (`"0"` or `"1"`).
    pub fn from_readback(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" => Some(Self::Low),
            "1" => Some(Self::High),
            _ => None,
        }
    }
}

/// Whether a logical pin drives or senses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Output,
    Input,
}

/// Logical winch signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    /// Motor stop (output).
    MotorStop,
    /// Pay cable out (output).
    Downcast,
    /// Haul cable in (output).
    Upcast,
    /// Latch actuator (output).
    LatchRelease,
    /// Latch proximity sensor (input, edge counted).
    LatchSensor,
    /// First sheave payout sensor (input, edge counted).
    Payout1,
    /// Second sheave payout sensor (input, edge counted).
    Payout2,
}

impl Pin {
    pub const OUTPUTS: [Pin; 4] = [Pin::MotorStop, Pin::Downcast, Pin::Upcast, Pin::LatchRelease];
    pub const INPUTS: [Pin; 3] = [Pin::LatchSensor, Pin::Payout1, Pin::Payout2];

    #[inline]
    pub const fn direction(&self) -> PinDirection {
        match self {
            Self::MotorStop | Self::Downcast | Self::Upcast | Self::LatchRelease => {
                PinDirection::Output
            }
            Self::LatchSensor | Self::Payout1 | Self::Payout2 => PinDirection::Input,
        }
    }

    /// Configuration key of this pin.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MotorStop => "motor_stop",
            Self::Downcast => "downcast",
            Self::Upcast => "upcast",
            Self::LatchRelease => "latch_release",
            Self::LatchSensor => "latch_sensor",
            Self::Payout1 => "payout1",
            Self::Payout2 => "payout2",
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical address of a DIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinAssignment {
    pub group: u8,
    pub pin: u8,
}

impl PinAssignment {
    pub const fn new(group: u8, pin: u8) -> Self {
        Self { group, pin }
    }

    /// Whether the address exists on the controller.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.group < DIO_GROUP_COUNT && self.pin < DIO_PINS_PER_GROUP
    }
}

impl fmt::Display for PinAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}:{}", self.group, self.pin)
    }
}

/// Pin table for the winch. Every entry is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinSet {
    pub motor_stop: PinAssignment,
    pub downcast: PinAssignment,
    pub upcast: PinAssignment,
    pub latch_release: PinAssignment,
    pub latch_sensor: PinAssignment,
    pub payout1: PinAssignment,
    pub payout2: PinAssignment,
}

impl PinSet {
    /// Address of a logical pin.
    #[inline]
    pub const fn get(&self, pin: Pin) -> PinAssignment {
        match pin {
            Pin::MotorStop => self.motor_stop,
            Pin::Downcast => self.downcast,
            Pin::Upcast => self.upcast,
            Pin::LatchRelease => self.latch_release,
            Pin::LatchSensor => self.latch_sensor,
            Pin::Payout1 => self.payout1,
            Pin::Payout2 => self.payout2,
        }
    }

    /// Check address ranges and that no two pins of the same direction collide.
    pub fn validate(&self) -> Result<(), String> {
        let all = Pin::OUTPUTS.iter().chain(Pin::INPUTS.iter());
        for pin in all {
            let addr = self.get(*pin);
            if !addr.is_valid() {
                return Err(format!(
                    "pin '{pin}' at {addr} is outside the controller range (group < {DIO_GROUP_COUNT}, pin < {DIO_PINS_PER_GROUP})"
                ));
            }
        }

        for bank in [&Pin::OUTPUTS[..], &Pin::INPUTS[..]] {
            for (i, a) in bank.iter().enumerate() {
                for b in &bank[i + 1..] {
                    if self.get(*a) == self.get(*b) {
                        return Err(format!(
                            "pins '{a}' and '{b}' share address {}",
                            self.get(*a)
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
