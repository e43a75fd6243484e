//! Session core for the job-processing dashboard client.
//!
//! ARCHITECTURE
//! ============
//! The dashboard itself is view wiring over a REST backend. This crate owns
//! the one stateful piece: who is logged in. Leaves first:
//!
//! - [`store`] persists the signed credential in a single durable slot.
//! - [`session`] holds the in-memory view of the current credential.
//! - [`token`] decodes credential claims (unverified) and checks expiry.
//! - [`manager`] orchestrates login, registration, logout, forced password
//!   update and the navigation guard.
//!
//! Transport and navigation are collaborators behind the [`net::HttpClient`]
//! and [`nav::Navigator`] traits so hosts (the bundled CLI, a browser shell,
//! tests) can plug in their own.
//!
//! TRUST
//! =====
//! Decoded claims are display hints. Every privileged decision is re-checked
//! by the backend; nothing here skips a server call because of a role claim.

pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod nav;
pub mod net;
pub mod route;
pub mod session;
pub mod store;
pub mod token;

#[cfg(test)]
pub mod test_helpers;

pub use error::{AuthError, ErrorCode};
pub use manager::{GuardDecision, LoginOutcome, Phase, SessionContext, SessionManager};
pub use route::Route;
pub use session::SessionState;
