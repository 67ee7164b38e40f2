//! Foundation types for the MSBuild language core.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`TextRange`], [`TextSize`] - Absolute source positions (byte offsets)
//! - [`text_utils`] - Name and word character classification
//!
//! This module has NO dependencies on other crate modules.

pub mod text_utils;

pub use text_size::{TextRange, TextSize};

/// Convert a byte offset inside a string to a [`TextSize`], saturating on
/// texts larger than 4 GiB.
#[inline]
pub fn text_size(offset: usize) -> TextSize {
    TextSize::new(u32::try_from(offset).unwrap_or(u32::MAX))
}

