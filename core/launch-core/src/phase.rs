//! The six-phase GLA launch lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PhaseError;

/// Launch phases in strict lifecycle order.
///
/// The GLA contract only ever advances forward through this sequence; the
/// dashboard reads the code fresh on every refresh and never caches it
/// across actions that may advance it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    BeforeWhitelist,
    Whitelist,
    PublicOffering,
    Initializing,
    Initialized,
    Unlock,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::BeforeWhitelist,
        Phase::Whitelist,
        Phase::PublicOffering,
        Phase::Initializing,
        Phase::Initialized,
        Phase::Unlock,
    ];

    /// Resolve the integer code returned by `getPhase` into a phase.
    ///
    /// Total on `0..=5`; anything else is [`PhaseError::UnknownPhase`] and
    /// must be treated by callers as a refresh failure, never a default.
    pub fn from_code(code: u8) -> Result<Self, PhaseError> {
        match code {
            0 => Ok(Phase::BeforeWhitelist),
            1 => Ok(Phase::Whitelist),
            2 => Ok(Phase::PublicOffering),
            3 => Ok(Phase::Initializing),
            4 => Ok(Phase::Initialized),
            5 => Ok(Phase::Unlock),
            other => Err(PhaseError::UnknownPhase(other)),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Display name used by the dashboard listing.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::BeforeWhitelist => "Before Whitelist Phase",
            Phase::Whitelist => "Whitelist Phase",
            Phase::PublicOffering => "Public Offering Phase",
            Phase::Initializing => "Initializing Phase",
            Phase::Initialized => "Initialized Phase",
            Phase::Unlock => "Unlock Phase",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_known_codes_in_order() {
        for (code, expected) in Phase::ALL.iter().enumerate() {
            assert_eq!(Phase::from_code(code as u8).unwrap(), *expected);
        }
    }

    #[test]
    fn code_round_trips() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_code(phase.code()).unwrap(), phase);
        }
    }

    #[test]
    fn code_two_is_public_offering() {
        assert_eq!(Phase::from_code(2).unwrap(), Phase::PublicOffering);
    }

    #[test]
    fn rejects_codes_outside_the_lifecycle() {
        assert_eq!(Phase::from_code(6), Err(PhaseError::UnknownPhase(6)));
        assert_eq!(Phase::from_code(42), Err(PhaseError::UnknownPhase(42)));
        assert_eq!(Phase::from_code(u8::MAX), Err(PhaseError::UnknownPhase(u8::MAX)));
    }

    #[test]
    fn phases_order_by_lifecycle() {
        assert!(Phase::BeforeWhitelist < Phase::Whitelist);
        assert!(Phase::PublicOffering < Phase::Initializing);
        assert!(Phase::Initialized < Phase::Unlock);
    }
}
