//! # Launch Core
//!
//! Pure, I/O-free logic shared by the RWA launch dashboard backend:
//!
//! | Concern            | Module      |
//! |--------------------|-------------|
//! | Decimal sanitizing | [`amount`]  |
//! | Fixed-point codec  | [`amount`]  |
//! | Phase resolution   | [`phase`]   |
//! | Action gating      | [`gate`]    |
//!
//! Every on-chain amount travels through [`amount::to_base_units`] /
//! [`amount::to_decimal_string`] as exact integer arithmetic — no floating
//! point ever touches the path from user input to a transaction.

pub mod amount;
pub mod errors;
pub mod gate;
pub mod phase;

pub use amount::{
    is_valid_amount, sanitize_decimal_input, to_base_units, to_decimal_string, MAX_AMOUNT,
    WEUSD_DECIMALS,
};
pub use errors::{AmountError, PhaseError};
pub use gate::{
    is_action_enabled, is_valid_address, ActionKind, FlagKey, InputKind, PendingFlags,
    PendingGuard, ProjectId,
};
pub use phase::Phase;
