//! Mutual compatibility between two pending requests.
//!
//! Two requests can swap when each side's held assignment is one of the
//! other side's acceptable targets: the `(date, slot)` pair must appear in
//! the counterpart's desired list and the held venue must satisfy that
//! entry's venue choice (wildcard accepts any roster venue). Both
//! directions must hold.

use super::assignment::{Assignment, DesiredAssignment};
use super::request::ExchangeRequest;

/// Returns `true` when `held` satisfies at least one desired triple.
#[must_use]
pub fn accepts(desired: &[DesiredAssignment], held: &Assignment) -> bool {
    desired
        .iter()
        .any(|d| d.date == held.date && d.slot == held.slot && d.place.accepts(&held.place))
}

/// Returns `true` when the two requests satisfy each other in both
/// directions. Requests of the same owner never match.
#[must_use]
pub fn mutually_compatible(a: &ExchangeRequest, b: &ExchangeRequest) -> bool {
    if a.owner == b.owner {
        return false;
    }
    accepts(&a.desired, &b.original) && accepts(&b.desired, &a.original)
}
