//! Core module tests
//!
//! Tests for:
//! - Pearson correlation against a shifted reference
//! - Resampling and gap filling
//! - Lag search and ranking
//! - Chart selection and rendering
//! - Settings persistence

pub mod correlate_tests;
pub mod search_tests;
pub mod settings_tests;
