//! Concurrency utilities for the relay routing core.
//!
//! The routing engine is called from any number of worker threads without external
//! coordination, so the primitives here convert excess concurrent demand into bounded
//! latency rather than unbounded queueing:
//!
//! - [`admission`] limits simultaneous in-flight operations per logical resource,
//!   retrying with a sleep backoff before rejecting outright.
//!
//! Once admitted, work runs to completion; there is no cancellation primitive. Failures
//! are propagated to the caller only after the in-flight accounting has been released.

pub mod admission;
