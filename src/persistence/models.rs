//! Database row model for the `exchange_requests` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Assignment, DesiredAssignment, EventDate, ExchangeRequest, Place, PlaceChoice, RequestId,
    RequestStatus, TimeSlot,
};
use crate::error::ExchangeError;

/// Column value marking the desired-venue wildcard.
pub const WILDCARD_COLUMN: &str = "*";

/// A row from the `exchange_requests` table.
///
/// Desired dates and slots are stored as parallel text arrays; their
/// lengths are equal for every row the service has written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRow {
    /// Auto-increment row id.
    pub id: i64,
    /// Messaging-platform user id of the requester.
    pub owner_id: String,
    /// Contact name.
    pub contact: String,
    /// Normalized 9-digit order number.
    pub order_no: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// Canonical date of the held assignment.
    pub orig_date: String,
    /// Canonical slot of the held assignment.
    pub orig_slot: String,
    /// Canonical venue of the held assignment.
    pub orig_place: String,
    /// Canonical desired dates, paired with `desired_slots` by position.
    pub desired_dates: Vec<String>,
    /// Canonical desired slots.
    pub desired_slots: Vec<String>,
    /// Desired venue, or [`WILDCARD_COLUMN`].
    pub desired_place: String,
    /// Owner-proof token.
    pub verification_code: String,
    /// `"pending"` or `"matched"`.
    pub status: String,
    /// Shared pair id once matched.
    pub match_group: Option<i64>,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl RequestRow {
    /// Converts the row into the domain entity.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] when the row carries an
    /// unknown status or mismatched desired arrays; both indicate a
    /// write this service never performs.
    pub fn into_domain(self) -> Result<ExchangeRequest, ExchangeError> {
        let status = RequestStatus::parse(&self.status).ok_or_else(|| {
            ExchangeError::Persistence(format!("row {}: unknown status {:?}", self.id, self.status))
        })?;
        if self.desired_dates.len() != self.desired_slots.len() {
            return Err(ExchangeError::Persistence(format!(
                "row {}: desired arrays of different length",
                self.id
            )));
        }

        let place_choice = if self.desired_place == WILDCARD_COLUMN {
            PlaceChoice::Any
        } else {
            PlaceChoice::Exactly(Place::from_canonical(self.desired_place))
        };
        let desired = self
            .desired_dates
            .into_iter()
            .zip(self.desired_slots)
            .map(|(date, slot)| DesiredAssignment {
                date: EventDate::from_canonical(date),
                slot: TimeSlot::from_canonical(slot),
                place: place_choice.clone(),
            })
            .collect();

        Ok(ExchangeRequest {
            id: RequestId::new(self.id),
            owner: self.owner_id.into(),
            contact: self.contact,
            order_no: self.order_no,
            phone: self.phone,
            email: self.email,
            original: Assignment {
                date: EventDate::from_canonical(self.orig_date),
                slot: TimeSlot::from_canonical(self.orig_slot),
                place: Place::from_canonical(self.orig_place),
            },
            desired,
            verification_code: self.verification_code,
            status,
            match_group: self.match_group.map(RequestId::new),
            created_at: self.created_at,
        })
    }
}

/// Renders a desired venue choice into its column value.
#[must_use]
pub fn place_choice_column(choice: &PlaceChoice) -> String {
    match choice {
        PlaceChoice::Any => WILDCARD_COLUMN.to_string(),
        PlaceChoice::Exactly(place) => place.as_str().to_string(),
    }
}
