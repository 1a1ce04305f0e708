//! The substitution engine shared by the markup and source paths.

use std::path::Path;

use tracing::trace;

use crate::config::Entry;
use crate::error::Result;
use crate::strategy::ReplaceStrategy;

/// Apply every dictionary entry to `text`, in declaration order.
///
/// Each entry sees the output of the previous one, so `[A→B, B→C]` turns
/// `"A"` into `"C"`. There is exactly one pass over the dictionary; entries
/// are never revisited. The first strategy error stops the pass and is
/// returned as is.
pub fn apply_dictionary(
    text: &str,
    dictionary: &[Entry],
    strategy: &dyn ReplaceStrategy,
    path_hint: Option<&Path>,
) -> Result<String> {
    let mut working = text.to_string();
    for entry in dictionary {
        working = strategy.replace(&working, &entry.key, &entry.value, path_hint)?;
        trace!(key = %entry.key, "applied dictionary entry");
    }
    Ok(working)
}
