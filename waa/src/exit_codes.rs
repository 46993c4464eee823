//! Stable exit codes for `waa run`.

use crate::core::types::TerminationReason;

/// The model terminated the run explicitly (or `waa init` succeeded).
pub const OK: i32 = 0;
/// Initialization failed or another fatal error occurred.
pub const INVALID: i32 = 1;
/// `max_turns` was reached without a termination marker.
pub const TURN_LIMIT: i32 = 2;
/// The model failed to produce a response.
pub const EMPTY_RESPONSE: i32 = 3;

pub fn for_reason(reason: TerminationReason) -> i32 {
    match reason {
        TerminationReason::Explicit => OK,
        TerminationReason::TurnLimit => TURN_LIMIT,
        TerminationReason::EmptyResponse => EMPTY_RESPONSE,
    }
}
