//! IDE features: High-level APIs for editor integrations.
//!
//! Pure functions over text and resolved documents. Both run on every
//! keystroke against possibly broken input, so neither returns parse
//! errors: the classifier degrades to [`TriggerState::None`] and the
//! collector skips values it cannot parse.
//!
//! ## Usage
//!
//! ```ignore
//! use msbuild::ide::{TriggerOptions, TriggerState, classify};
//!
//! let result = classify("$(Conf", TriggerOptions::explicit());
//! assert_eq!(result.state, TriggerState::PropertyName);
//! assert_eq!(result.length, 4);
//! ```

mod references;
mod trigger;

pub use references::{
    CollectorError, FunctionTypeProvider, Reference, ReferenceCollector, ReferenceTarget,
    ReferenceUsage, SymbolKind, UnknownFunctionTypes, find_references,
};
pub use trigger::{TriggerOptions, TriggerResult, TriggerState, classify};
