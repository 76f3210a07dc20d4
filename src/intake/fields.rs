//! The intake field flow: keys, labels, prompts, and the form template.

use crate::validate::form::canonical_label;

/// One collectable field of an exchange request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// Contact name.
    Contact,
    /// 9-digit order number.
    OrderNo,
    /// Contact phone.
    Phone,
    /// Contact email.
    Email,
    /// Date of the held assignment.
    OriginalDate,
    /// Time slot of the held assignment.
    OriginalSlot,
    /// Venue of the held assignment.
    OriginalPlace,
    /// Acceptable dates (list).
    DesiredDates,
    /// Acceptable time slots (list, paired with the dates).
    DesiredSlots,
    /// Acceptable venue or wildcard.
    DesiredPlace,
}

/// Collection order for the step-by-step mode and for picking "the first
/// missing/broken field" in fix mode.
pub const FIELD_FLOW: [FieldKey; 10] = [
    FieldKey::Contact,
    FieldKey::OrderNo,
    FieldKey::Phone,
    FieldKey::Email,
    FieldKey::OriginalDate,
    FieldKey::OriginalSlot,
    FieldKey::OriginalPlace,
    FieldKey::DesiredDates,
    FieldKey::DesiredSlots,
    FieldKey::DesiredPlace,
];

impl FieldKey {
    /// Template label, hints included.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Contact => "Contact name",
            Self::OrderNo => "Order number (9 digits)",
            Self::Phone => "Phone",
            Self::Email => "Email",
            Self::OriginalDate => "Current date (MM/DD)",
            Self::OriginalSlot => "Current time slot (HH:MM~HH:MM)",
            Self::OriginalPlace => "Current venue (name or number)",
            Self::DesiredDates => "Desired dates (comma separated)",
            Self::DesiredSlots => "Desired time slots (comma separated)",
            Self::DesiredPlace => "Desired venue (name, number, or \"any\")",
        }
    }

    /// Short lowercase name used in error text.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Contact => "contact name",
            Self::OrderNo => "order number",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::OriginalDate => "current date",
            Self::OriginalSlot => "current time slot",
            Self::OriginalPlace => "current venue",
            Self::DesiredDates => "desired dates",
            Self::DesiredSlots => "desired time slots",
            Self::DesiredPlace => "desired venue",
        }
    }

    /// Maps a raw submitted label back to its key, via hint-stripping
    /// canonicalization. Unknown labels yield `None`.
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        let canonical = canonical_label(raw);
        FIELD_FLOW
            .iter()
            .copied()
            .find(|key| canonical_label(key.label()) == canonical)
    }

    /// 1-based position in the field flow.
    #[must_use]
    pub fn position(self) -> usize {
        FIELD_FLOW
            .iter()
            .position(|k| *k == self)
            .map_or(0, |i| i + 1)
    }
}

/// Renders the numbered form template sent on `register` and re-emitted
/// on bulk retry.
#[must_use]
pub fn template() -> String {
    let mut out = String::from("Reply with every line filled in:\n");
    for (i, key) in FIELD_FLOW.iter().enumerate() {
        out.push_str(&format!("{}. {}: \n", i + 1, key.label()));
    }
    out
}
