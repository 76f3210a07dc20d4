//! Per-owner conversational session: collection state plus the draft
//! request being assembled.

use std::time::{Duration, Instant};

use crate::domain::{
    Assignment, DesiredAssignment, EventDate, NewRequest, OwnerId, Place, PlaceChoice, TimeSlot,
};
use crate::intake::fields::{FIELD_FLOW, FieldKey};
use crate::validate::{self, FieldError, FieldRules};

/// Where the conversation stands. `Idle` is the absence of a session
/// entry in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the bulk multi-line form.
    AwaitForm,
    /// Waiting for a corrected value for one specific field.
    AwaitFix(FieldKey),
    /// Waiting for the value of `FIELD_FLOW[index]` in step mode.
    AwaitStep(usize),
}

/// The partially collected request.
///
/// Each field is `None` until a value passes validation. Cross-field
/// rules (desired date/slot pairing) are enforced at assignment time, so
/// whatever is present is always internally consistent.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    contact: Option<String>,
    order_no: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    original_date: Option<EventDate>,
    original_slot: Option<TimeSlot>,
    original_place: Option<Place>,
    desired_dates: Option<Vec<EventDate>>,
    desired_slots: Option<Vec<TimeSlot>>,
    desired_place: Option<PlaceChoice>,
}

impl Draft {
    /// Validates `raw` for `key` and stores the canonical value.
    ///
    /// # Errors
    ///
    /// Returns the field's [`FieldError`] and leaves the draft untouched.
    /// Assigning a desired list whose length disagrees with the other,
    /// already-known desired list fails with a count-mismatch error.
    pub fn apply(&mut self, key: FieldKey, raw: &str, rules: &FieldRules) -> Result<(), FieldError> {
        match key {
            FieldKey::Contact => self.contact = Some(validate::normalize_text(raw)?),
            FieldKey::OrderNo => self.order_no = Some(validate::normalize_order_no(raw)?),
            FieldKey::Phone => self.phone = Some(validate::normalize_text(raw)?),
            FieldKey::Email => self.email = Some(validate::normalize_text(raw)?),
            FieldKey::OriginalDate => {
                self.original_date = Some(validate::normalize_date(raw, rules)?);
            }
            FieldKey::OriginalSlot => self.original_slot = Some(validate::normalize_slot(raw)?),
            FieldKey::OriginalPlace => {
                self.original_place = Some(validate::resolve_place(raw, rules)?);
            }
            FieldKey::DesiredDates => {
                let dates = validate::normalize_date_list(raw, rules)?;
                if let Some(slots) = &self.desired_slots {
                    validate::check_paired(dates.len(), slots.len())?;
                }
                self.desired_dates = Some(dates);
            }
            FieldKey::DesiredSlots => {
                let slots = validate::normalize_slot_list(raw)?;
                if let Some(dates) = &self.desired_dates {
                    validate::check_paired(dates.len(), slots.len())?;
                }
                self.desired_slots = Some(slots);
            }
            FieldKey::DesiredPlace => {
                self.desired_place = Some(validate::resolve_desired_place(raw, rules)?);
            }
        }
        Ok(())
    }

    /// The normalized order number, once known.
    #[must_use]
    pub fn order_no(&self) -> Option<&str> {
        self.order_no.as_deref()
    }

    /// First field in flow order that has no value yet.
    #[must_use]
    pub fn first_missing(&self) -> Option<FieldKey> {
        FIELD_FLOW.iter().copied().find(|key| !self.has(*key))
    }

    /// Whether `key` already holds a validated value.
    #[must_use]
    pub fn has(&self, key: FieldKey) -> bool {
        match key {
            FieldKey::Contact => self.contact.is_some(),
            FieldKey::OrderNo => self.order_no.is_some(),
            FieldKey::Phone => self.phone.is_some(),
            FieldKey::Email => self.email.is_some(),
            FieldKey::OriginalDate => self.original_date.is_some(),
            FieldKey::OriginalSlot => self.original_slot.is_some(),
            FieldKey::OriginalPlace => self.original_place.is_some(),
            FieldKey::DesiredDates => self.desired_dates.is_some(),
            FieldKey::DesiredSlots => self.desired_slots.is_some(),
            FieldKey::DesiredPlace => self.desired_place.is_some(),
        }
    }

    /// Builds the insertable request once every field is present. Returns
    /// `None` while any field is missing.
    #[must_use]
    pub fn into_new_request(self, owner: OwnerId) -> Option<NewRequest> {
        let contact = self.contact?;
        let order_no = self.order_no?;
        let phone = self.phone?;
        let email = self.email?;
        let original = Assignment {
            date: self.original_date?,
            slot: self.original_slot?,
            place: self.original_place?,
        };
        let dates = self.desired_dates?;
        let slots = self.desired_slots?;
        let place = self.desired_place?;
        if dates.len() != slots.len() {
            return None;
        }
        let desired = dates
            .into_iter()
            .zip(slots)
            .map(|(date, slot)| DesiredAssignment {
                date,
                slot,
                place: place.clone(),
            })
            .collect();
        Some(NewRequest {
            owner,
            contact,
            order_no,
            phone,
            email,
            original,
            desired,
        })
    }
}

/// One owner's live intake conversation.
#[derive(Debug)]
pub struct IntakeSession {
    /// Current collection state.
    pub state: SessionState,
    /// The request assembled so far.
    pub draft: Draft,
    last_activity: Instant,
}

impl IntakeSession {
    /// Opens a session in the given starting state.
    #[must_use]
    pub fn new(state: SessionState) -> Self {
        Self {
            state,
            draft: Draft::default(),
            last_activity: Instant::now(),
        }
    }

    /// Records activity, resetting the idle clock.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Time since the last activity; drives TTL eviction.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}
