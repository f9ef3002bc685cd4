//! # Ghostwire Support
//!
//! Shared utilities for the Ghostwire container crates.
//!
//! This crate provides:
//! - Text rendering for error messages
//! - Suggestion helpers for "did you mean?" hints

pub mod rendering;
