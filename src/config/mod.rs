//! # Configuration Module
//!
//! This module centralizes the wire-format and reader-tuning constants for the
//! crate. Constants are grouped by functional area and their interdependencies
//! are documented and enforced through compile-time assertions.
//!
//! ## Why Centralization?
//!
//! The record header size, the FAR sniff length, and the seek-window limits
//! all depend on each other. Scattering them across the codec, reader, and
//! writer invites mismatch bugs; co-locating them with compile-time checks
//! prevents that.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric format values with dependency documentation

pub mod constants;
pub use constants::*;
