//! Interconnection policies which decide how margins are shared between two areas.
use anyhow::{Result, anyhow, ensure};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// The rule used to decide how much power flows over the interconnector
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum SharingPolicy {
    /// An area only exports spare capacity; it never takes on part of another area's shortfall
    #[string = "veto"]
    Veto,
    /// A system-wide shortfall is shared between areas in proportion to their demand
    #[default]
    #[string = "share"]
    Share,
}

/// An interconnector between two areas, operated under a given policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interconnection {
    /// Spare capacity only, see [`SharingPolicy::Veto`]
    Veto {
        /// Maximum power flow in either direction
        capacity: f64,
    },
    /// Demand-proportional shortfall sharing, see [`SharingPolicy::Share`]
    Share {
        /// Maximum power flow in either direction
        capacity: f64,
    },
}

impl Interconnection {
    /// Create a new [`Interconnection`].
    ///
    /// # Arguments
    ///
    /// * `policy` - How margins are shared
    /// * `capacity` - Maximum power flow, which must be finite and non-negative
    pub fn new(policy: SharingPolicy, capacity: f64) -> Result<Self> {
        ensure!(
            capacity.is_finite() && capacity >= 0.0,
            "Interconnector capacity must be a finite number greater than or equal to zero"
        );

        Ok(match policy {
            SharingPolicy::Veto => Self::Veto { capacity },
            SharingPolicy::Share => Self::Share { capacity },
        })
    }

    /// Create a new [`Interconnection`] from the text form of a policy
    pub fn from_policy_str(policy: &str, capacity: f64) -> Result<Self> {
        let policy = policy.parse().map_err(|_| {
            anyhow!("Policy not recognised: '{policy}'. Valid policies are 'veto' and 'share'")
        })?;

        Self::new(policy, capacity)
    }

    /// The interconnector capacity
    pub fn capacity(&self) -> f64 {
        match self {
            Self::Veto { capacity } | Self::Share { capacity } => *capacity,
        }
    }

    /// The policy the interconnector is operated under
    pub fn policy(&self) -> SharingPolicy {
        match self {
            Self::Veto { .. } => SharingPolicy::Veto,
            Self::Share { .. } => SharingPolicy::Share,
        }
    }
}
