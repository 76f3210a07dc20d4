//! # slotswap
//!
//! Conversational matchmaking service for pairwise time-slot exchange.
//!
//! Two parties each hold a reserved time-slot/venue assignment and each
//! want a different one. A party registers a request over the messaging
//! channel describing their held assignment and the set of assignments
//! they would accept; when a counterpart's holdings and wishes cross,
//! both requests are paired atomically and both parties are notified.
//!
//! ## Architecture
//!
//! ```text
//! Messaging platform (webhook, signed)
//!     │
//!     ├── Webhook handler (api/)
//!     │
//!     ├── IntakeService (service/)     ── conversation state machine
//!     ├── MatchEngine (service/)       ── serialized search + commit
//!     │
//!     ├── Field validation (validate/)
//!     ├── Sessions (intake/)
//!     │
//!     ├── RequestStore (persistence/)  ── PostgreSQL / in-memory
//!     └── Notifier (notify/)           ── reply + push delivery
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod intake;
pub mod notify;
pub mod persistence;
pub mod service;
pub mod validate;
