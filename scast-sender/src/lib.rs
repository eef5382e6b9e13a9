//! # scast-sender
//!
//! Captures the local screen, scales it down, compresses it with zstd and
//! streams it to a scast receiver over a single TCP connection. Lost
//! connections are retried forever with a fixed backoff.

pub mod config;
pub mod source;
