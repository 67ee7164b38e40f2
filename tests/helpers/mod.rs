//! Shared test helpers.

pub mod document_fixtures;
pub mod trigger_helpers;
