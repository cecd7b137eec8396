//! This library crate contains all the necessities to run the wsrelay event distribution core.
//!
//! It is split into two halves: the [`libraries`] module holds the reusable building blocks
//! (stream consumption, outbound publishing, tracing) while the [`services`] module bundles
//! them into runnable units with a unified configuration surface.

pub mod libraries;
pub mod services;
