#![forbid(unsafe_code)]

//! Shared pieces of the Learnoverse video catalog.
//!
//! The binaries (`backend`, `seed_ids`) are thin; configuration, the
//! identifier store, the YouTube client and the aggregation loop live here so
//! they can be tested on their own.

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod youtube;
