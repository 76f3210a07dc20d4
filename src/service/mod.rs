//! Service layer: business logic orchestration.
//!
//! [`IntakeService`] drives the conversational state machine and
//! owner-facing lookups; [`MatchEngine`] owns the serialized
//! search-and-commit that pairs compatible requests.

pub mod intake_service;
pub mod match_engine;

pub use intake_service::IntakeService;
pub use match_engine::MatchEngine;
