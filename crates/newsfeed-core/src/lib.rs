//! Core types and trait definitions for the newsfeed preference subsystem.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod fields;
pub mod filters;
pub mod outcome;
pub mod preferences;
pub mod session;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
