// src/status/mod.rs

//! Status registry: the only state shared between the lifecycle component
//! and the status server.
//!
//! - [`model`] defines the `Status` record and its JSON shape.
//! - [`registry`] owns the records behind a mutex and hands out a read-only
//!   [`StatusView`] for the server.

pub mod model;
pub mod registry;

pub use model::{Attempt, Status, UNKNOWN_EXIT_CODE};
pub use registry::{RecordId, Shape, Snapshot, StatusRegistry, StatusView};
