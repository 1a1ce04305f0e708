//! In-memory source transformation.

use std::path::PathBuf;

use crate::config::Entry;
use crate::engine::apply_dictionary;
use crate::error::Result;
use crate::strategy::ReplaceStrategy;

/// A source file flowing through the host pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub data: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, data: impl Into<String>) -> Self {
        Self { path: path.into(), data: Some(data.into()) }
    }

    /// A descriptor the host has not loaded any content for
    pub fn without_data(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), data: None }
    }
}

/// Rewrite the file's data through the dictionary.
///
/// A missing file, missing data or empty data comes back untouched and the
/// strategy is never called. The pattern is not checked here: the host
/// only sends files it already considers eligible.
pub fn transform(
    file: Option<SourceFile>,
    dictionary: &[Entry],
    strategy: &dyn ReplaceStrategy,
) -> Result<Option<SourceFile>> {
    let Some(mut file) = file else {
        return Ok(None);
    };

    match file.data.take() {
        Some(data) if !data.is_empty() => {
            file.data = Some(apply_dictionary(&data, dictionary, strategy, Some(&file.path))?);
        }
        untouched => file.data = untouched,
    }
    Ok(Some(file))
}
