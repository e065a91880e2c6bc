//! Waitlist sign-up service for Insights, plus a thin proxy in front of the
//! analysis backend (uploads, chat, chart cleanup).
//!
//! Everything except the entrypoint lives here, so that `tests/` can spin up
//! the whole app.

pub mod backend_client;
pub mod configuration;
pub mod domain;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod waitlist;
