//! Domain types and pure logic shared by the imagine-relay crates.
//!
//! Nothing in here performs I/O: job records and statuses, provider
//! payload normalization, request validation, the WebSocket wire protocol
//! and the on-disk generation metadata format.

pub mod error;
pub mod generation;
pub mod job;
pub mod payload;
pub mod protocol;
pub mod types;
pub mod validation;
