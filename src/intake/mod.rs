//! Intake layer: the field flow, per-owner session state, and the
//! session registry.
//!
//! The conversational *policy* (command dispatch, which reply to send)
//! lives in the service layer; this module owns the data the policy
//! operates on.

pub mod fields;
pub mod registry;
pub mod session;

pub use fields::{FIELD_FLOW, FieldKey, template};
pub use registry::SessionRegistry;
pub use session::{Draft, IntakeSession, SessionState};
