//! Reusable building blocks powering the services
//!
//! Everything in here is written against traits at the I/O seams so that the
//! core logic can be exercised without a live broker or database connection.

pub mod helpers;
pub mod inbox;
pub mod outbound;
pub mod tracing;

/// Generic error type
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result with no value and a [`BoxedError`]
pub type EmptyResult = Result<(), BoxedError>;
