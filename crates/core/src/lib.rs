//! Domain types and pure logic for CrashAlert.
//!
//! Everything in this crate is synchronous and side-effect free: the
//! accident model, the field normalizer, the predicate filter, the
//! statistics aggregator, and the realtime wire messages shared by the
//! server and the client.

pub mod accident;
pub mod auth_log;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod realtime;
pub mod roles;
pub mod statistics;
pub mod types;
