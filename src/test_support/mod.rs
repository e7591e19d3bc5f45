//! Helpers shared by unit tests across modules.

pub mod fixtures;
pub mod socket_guard;
