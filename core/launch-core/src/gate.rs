//! The action gate: which launch/trade actions a project currently admits.
//!
//! An action is enabled iff its required phase matches exactly, no global
//! refresh is in flight, the `(project, action)` pending flag is clear, and
//! the action's input requirement (amount or address) is satisfied.
//! [`is_action_enabled`] is a pure function of its arguments.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::amount::{is_valid_amount, WEUSD_DECIMALS};
use crate::phase::Phase;

/// On-chain project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The mutually exclusive user actions the dashboard can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    AddWhitelist,
    WhitelistBuy,
    PublicOfferingBuy,
    Initialize,
    Withdraw,
    Claim,
    Buy,
    Sell,
}

/// What an action needs from the form before it may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    None,
    Amount,
    Address,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::AddWhitelist,
        ActionKind::WhitelistBuy,
        ActionKind::PublicOfferingBuy,
        ActionKind::Initialize,
        ActionKind::Withdraw,
        ActionKind::Claim,
        ActionKind::Buy,
        ActionKind::Sell,
    ];

    /// The single phase in which this action is permitted.
    pub fn required_phase(self) -> Phase {
        match self {
            ActionKind::AddWhitelist => Phase::BeforeWhitelist,
            ActionKind::WhitelistBuy => Phase::Whitelist,
            ActionKind::PublicOfferingBuy => Phase::PublicOffering,
            ActionKind::Initialize => Phase::Initializing,
            ActionKind::Withdraw => Phase::Unlock,
            ActionKind::Claim | ActionKind::Buy | ActionKind::Sell => Phase::Initialized,
        }
    }

    pub fn input(self) -> InputKind {
        match self {
            ActionKind::AddWhitelist => InputKind::Address,
            ActionKind::WhitelistBuy
            | ActionKind::PublicOfferingBuy
            | ActionKind::Buy
            | ActionKind::Sell => InputKind::Amount,
            ActionKind::Initialize | ActionKind::Withdraw | ActionKind::Claim => InputKind::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::AddWhitelist => "add-whitelist",
            ActionKind::WhitelistBuy => "whitelist-buy",
            ActionKind::PublicOfferingBuy => "public-offering-buy",
            ActionKind::Initialize => "initialize",
            ActionKind::Withdraw => "withdraw",
            ActionKind::Claim => "claim",
            ActionKind::Buy => "buy",
            ActionKind::Sell => "sell",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One in-flight flag per `(project, action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagKey {
    pub project: ProjectId,
    pub action: ActionKind,
}

/// Pending-action registry.
///
/// Flags are created clear, set immediately before a mutating call is
/// submitted, and cleared by [`PendingGuard`] on drop no matter how the
/// call ends. Updates replace the whole map atomically (read, clone with
/// one key changed, swap) so concurrent toggles of different keys never
/// lose each other's writes.
#[derive(Debug, Default)]
pub struct PendingFlags {
    map: RwLock<Arc<HashMap<FlagKey, bool>>>,
}

impl PendingFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, key: FlagKey) -> bool {
        self.snapshot().get(&key).copied().unwrap_or(false)
    }

    /// The current flag map as an immutable snapshot.
    pub fn snapshot(&self) -> Arc<HashMap<FlagKey, bool>> {
        Arc::clone(&self.map.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Mark `key` in flight. Returns `None` when it already is, so the same
    /// action on the same project cannot be submitted twice concurrently.
    pub fn begin(self: &Arc<Self>, key: FlagKey) -> Option<PendingGuard> {
        {
            let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
            if map.get(&key).copied().unwrap_or(false) {
                return None;
            }
            let mut next: HashMap<FlagKey, bool> = (**map).clone();
            next.insert(key, true);
            *map = Arc::new(next);
        }
        Some(PendingGuard {
            flags: Arc::clone(self),
            key,
        })
    }

    fn clear(&self, key: FlagKey) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: HashMap<FlagKey, bool> = (**map).clone();
        next.insert(key, false);
        *map = Arc::new(next);
    }
}

/// Clears its flag when dropped — the guaranteed-cleanup half of the
/// pending-flag contract, covering success, failure, and early return.
#[derive(Debug)]
pub struct PendingGuard {
    flags: Arc<PendingFlags>,
    key: FlagKey,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.flags.clear(self.key);
    }
}

/// `true` when `s` parses as an EVM address.
pub fn is_valid_address(s: &str) -> bool {
    s.parse::<Address>().is_ok()
}

/// Decide whether `action` may currently fire for `project`.
///
/// `input` is the sanitized form field tied to the action: an amount for
/// the buy/sell family, an address for add-whitelist, ignored otherwise.
pub fn is_action_enabled(
    action: ActionKind,
    phase: Phase,
    project: ProjectId,
    flags: &PendingFlags,
    global_loading: bool,
    input: Option<&str>,
) -> bool {
    if global_loading || phase != action.required_phase() {
        return false;
    }
    if flags.is_pending(FlagKey { project, action }) {
        return false;
    }
    match action.input() {
        InputKind::None => true,
        InputKind::Amount => input.is_some_and(|s| is_valid_amount(s, WEUSD_DECIMALS)),
        InputKind::Address => input.is_some_and(is_valid_address),
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "0x1111111111111111111111111111111111111111";

    fn valid_input(action: ActionKind) -> Option<&'static str> {
        match action.input() {
            InputKind::None => None,
            InputKind::Amount => Some("12.5"),
            InputKind::Address => Some(USER),
        }
    }

    #[test]
    fn exactly_the_phase_matching_actions_are_enabled() {
        let flags = Arc::new(PendingFlags::new());
        let project = ProjectId(1);
        for phase in Phase::ALL {
            for action in ActionKind::ALL {
                let enabled = is_action_enabled(
                    action,
                    phase,
                    project,
                    &flags,
                    false,
                    valid_input(action),
                );
                assert_eq!(
                    enabled,
                    action.required_phase() == phase,
                    "{action} in {phase}"
                );
            }
        }
    }

    #[test]
    fn public_offering_gate_scenario() {
        let flags = Arc::new(PendingFlags::new());
        let phase = Phase::from_code(2).unwrap();
        assert_eq!(phase, Phase::PublicOffering);
        let project = ProjectId(7);
        assert!(!is_action_enabled(
            ActionKind::WhitelistBuy,
            phase,
            project,
            &flags,
            false,
            Some("10")
        ));
        assert!(is_action_enabled(
            ActionKind::PublicOfferingBuy,
            phase,
            project,
            &flags,
            false,
            Some("10")
        ));
    }

    #[test]
    fn global_loading_disables_everything() {
        let flags = Arc::new(PendingFlags::new());
        for action in ActionKind::ALL {
            assert!(!is_action_enabled(
                action,
                action.required_phase(),
                ProjectId(1),
                &flags,
                true,
                valid_input(action),
            ));
        }
    }

    #[test]
    fn pending_flag_blocks_only_its_own_pair() {
        let flags = Arc::new(PendingFlags::new());
        let key = FlagKey {
            project: ProjectId(1),
            action: ActionKind::Claim,
        };
        let guard = flags.begin(key).unwrap();

        assert!(!is_action_enabled(
            ActionKind::Claim,
            Phase::Initialized,
            ProjectId(1),
            &flags,
            false,
            None
        ));
        // Same action, different project: untouched.
        assert!(is_action_enabled(
            ActionKind::Claim,
            Phase::Initialized,
            ProjectId(2),
            &flags,
            false,
            None
        ));
        // Different action, same project: untouched.
        assert!(is_action_enabled(
            ActionKind::Buy,
            Phase::Initialized,
            ProjectId(1),
            &flags,
            false,
            Some("1")
        ));

        drop(guard);
        assert!(!flags.is_pending(key));
    }

    #[test]
    fn begin_refuses_a_second_start() {
        let flags = Arc::new(PendingFlags::new());
        let key = FlagKey {
            project: ProjectId(3),
            action: ActionKind::Buy,
        };
        let guard = flags.begin(key).unwrap();
        assert!(flags.begin(key).is_none());
        drop(guard);
        assert!(flags.begin(key).is_some());
    }

    #[test]
    fn guard_clears_on_early_exit() {
        let flags = Arc::new(PendingFlags::new());
        let key = FlagKey {
            project: ProjectId(9),
            action: ActionKind::Sell,
        };
        let attempt = || -> Result<(), ()> {
            let _guard = flags.begin(key).ok_or(())?;
            Err(())
        };
        assert!(attempt().is_err());
        assert!(!flags.is_pending(key));
    }

    #[test]
    fn amount_actions_require_a_valid_amount() {
        let flags = Arc::new(PendingFlags::new());
        let project = ProjectId(1);
        for input in [None, Some(""), Some("0"), Some("1.2345678"), Some("abc")] {
            assert!(!is_action_enabled(
                ActionKind::Buy,
                Phase::Initialized,
                project,
                &flags,
                false,
                input
            ));
        }
        assert!(is_action_enabled(
            ActionKind::Buy,
            Phase::Initialized,
            project,
            &flags,
            false,
            Some("0.000001")
        ));
    }

    #[test]
    fn add_whitelist_requires_a_parseable_address() {
        let flags = Arc::new(PendingFlags::new());
        let project = ProjectId(1);
        for input in [None, Some(""), Some("0x1234"), Some("not-an-address")] {
            assert!(!is_action_enabled(
                ActionKind::AddWhitelist,
                Phase::BeforeWhitelist,
                project,
                &flags,
                false,
                input
            ));
        }
        assert!(is_action_enabled(
            ActionKind::AddWhitelist,
            Phase::BeforeWhitelist,
            project,
            &flags,
            false,
            Some(USER)
        ));
    }

    #[test]
    fn action_names_round_trip() {
        for action in ActionKind::ALL {
            assert_eq!(ActionKind::parse(action.as_str()), Some(action));
        }
        assert_eq!(ActionKind::parse("transfer"), None);
    }
}
