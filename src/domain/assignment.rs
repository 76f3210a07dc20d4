//! Assignment value types: event date, time slot, venue.
//!
//! All three wrap the canonical string form produced by the `validate`
//! module. Equality on the canonical form is the basis of match
//! compatibility, so values are only constructed from validated input.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical event date (`month/day` or `year/month/day` per deployment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventDate(String);

impl EventDate {
    /// Wraps an already-canonical date string.
    #[must_use]
    pub fn from_canonical(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the canonical form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical time slot (`HH:MM~HH:MM`, start strictly before end).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSlot(String);

impl TimeSlot {
    /// Wraps an already-canonical slot string.
    #[must_use]
    pub fn from_canonical(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the canonical form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A venue from the deployment's enumerated roster, in its canonical
/// roster spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Place(String);

impl Place {
    /// Wraps a canonical roster name.
    #[must_use]
    pub fn from_canonical(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the canonical roster name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A desired-side venue: either a specific roster venue or the wildcard
/// accepting any enumerated venue. The wildcard is never legal on the
/// original side of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceChoice {
    /// Any enumerated venue is acceptable.
    Any,
    /// Exactly this venue.
    Exactly(Place),
}

impl PlaceChoice {
    /// Returns `true` when `place` satisfies this choice.
    #[must_use]
    pub fn accepts(&self, place: &Place) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(p) => p == place,
        }
    }
}

impl fmt::Display for PlaceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Exactly(p) => write!(f, "{p}"),
        }
    }
}

/// A held assignment: the `(date, time slot, venue)` triple a requester
/// currently owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Event date.
    pub date: EventDate,
    /// Time slot within the date.
    pub slot: TimeSlot,
    /// Venue.
    pub place: Place,
}

/// One acceptable swap target: a `(date, time slot, venue-or-wildcard)`
/// triple on the desired side of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredAssignment {
    /// Acceptable event date.
    pub date: EventDate,
    /// Acceptable time slot.
    pub slot: TimeSlot,
    /// Acceptable venue, possibly the wildcard.
    pub place: PlaceChoice,
}
