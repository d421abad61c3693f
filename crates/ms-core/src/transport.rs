//! Transport modes shared across the network, routing and mobsim crates.
//!
//! Whether a mode is simulated on the network or teleported is not a
//! property of the mode itself; it is decided by `QSimConfig::network_modes`
//! and `RoutingConfig::teleported_modes`.

use std::str::FromStr;

use crate::CoreError;

/// The means by which a leg is travelled.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransportMode {
    /// Private vehicle.
    Car,
    /// Public transport (teleported unless a transit engine is added).
    Pt,
    /// On foot.
    Walk,
    /// Bicycle.
    Bike,
    /// Passenger in a private vehicle.
    Ride,
}

impl TransportMode {
    /// Every mode, in declaration order.  `ALL[m.index()] == m`.
    pub const ALL: [TransportMode; 5] = [
        TransportMode::Car,
        TransportMode::Pt,
        TransportMode::Walk,
        TransportMode::Bike,
        TransportMode::Ride,
    ];

    /// Dense index for per-mode arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable label, used in events and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Car  => "car",
            TransportMode::Pt   => "pt",
            TransportMode::Walk => "walk",
            TransportMode::Bike => "bike",
            TransportMode::Ride => "ride",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransportMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CoreError::Parse(format!("unknown transport mode {s:?}")))
    }
}

// ── ModeSet ───────────────────────────────────────────────────────────────────

/// A compact set of transport modes (one bit per mode).
///
/// Stored per link to say which modes may use it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeSet(u8);

impl ModeSet {
    pub const EMPTY: ModeSet = ModeSet(0);

    pub fn of(modes: &[TransportMode]) -> Self {
        modes.iter().fold(Self::EMPTY, |set, &m| set.with(m))
    }

    #[inline]
    pub fn with(self, mode: TransportMode) -> Self {
        ModeSet(self.0 | (1 << mode.index()))
    }

    #[inline]
    pub fn contains(self, mode: TransportMode) -> bool {
        self.0 & (1 << mode.index()) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = TransportMode> {
        TransportMode::ALL.into_iter().filter(move |&m| self.contains(m))
    }
}

impl FromIterator<TransportMode> for ModeSet {
    fn from_iter<I: IntoIterator<Item = TransportMode>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |set, m| set.with(m))
    }
}
