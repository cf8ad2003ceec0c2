//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs` — Normalized domain types, identical across exchanges
//! - `wire.rs` — Raw serde structs matching exchange responses
//! - `convert.rs` — Wire → domain normalization
//! - `state.rs` — State containers updated from the stream (trades only)

pub mod market;
pub mod order;
pub mod trade;
