//! Core types and trait definitions for the Ruty habit tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The [`stats`] module holds the statistics engine. It is pure: every
//! function takes already-fetched data plus an explicit "today" and never
//! fails.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod achievement;
pub mod character;
pub mod error;
pub mod habit;
pub mod session;
pub mod stats;
pub mod store;
pub mod sync;
pub mod user;

pub use error::{Error, Result};
