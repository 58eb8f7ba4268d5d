//! Reactive pipeline from the stored collection to what the view shows.
//!
//! `aggregate` and `projection` are pure functions over a snapshot;
//! `session` wires them to the store subscription and the query inputs.

pub mod aggregate;
pub mod projection;
pub mod session;
