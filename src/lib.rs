//! dict-replacer Library
//!
//! Dictionary-driven key/value substitution for build outputs. Keys found in
//! source buffers or emitted HTML pages are rewritten into configured values
//! (API endpoints, feature flags, version strings) without templating the
//! original sources.

pub mod config;
pub mod engine;
pub mod error;
pub mod markup;
pub mod normalize;
pub mod replacer;
pub mod source;
pub mod strategy;

// Re-export main types for convenience
pub use config::{Entry, HostConfig, KeyMode, PathPattern, RawEntry, ReplacerConfig, ReplacerOptions};
pub use engine::apply_dictionary;
pub use error::{ReplacerError, Result};
pub use markup::{ArtifactOutcome, CompiledAsset, WriteBackReport};
pub use normalize::normalize_value;
pub use replacer::Replacer;
pub use source::SourceFile;
pub use strategy::{RegexStrategy, ReplaceStrategy};
