//! Markup write-back.
//!
//! After the host has emitted its final documents, every HTML artifact is
//! rewritten through the dictionary and written back to its destination.
//! Artifacts are independent: each one succeeds or fails on its own and
//! the batch never returns an error.
//!
//! # Failure stages
//!
//! | Stage            | Error variant                        |
//! |------------------|--------------------------------------|
//! | substitution     | whatever the strategy returned       |
//! | issuing a write  | [`ReplacerError::WriteIssuance`]     |
//! | completing it    | [`ReplacerError::WriteCompletion`]   |
//!
//! All three are logged with the destination path and recorded in the
//! [`WriteBackReport`].

use std::borrow::Cow;
use std::future::Future;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::config::Entry;
use crate::engine::apply_dictionary;
use crate::error::{ReplacerError, Result};
use crate::strategy::ReplaceStrategy;

/// Marker searched for in destination paths to recognize markup documents.
pub const MARKUP_MARKER: &str = ".html";

/// Whether a destination path identifies a markup document.
///
/// Matches anywhere in the path, so `index.html.tmp` counts as markup.
pub fn is_markup_path(path: &Path) -> bool {
    path.to_string_lossy().contains(MARKUP_MARKER)
}

/// A compiled build output, as handed over by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAsset {
    pub destination_path: PathBuf,
    pub compiled: Vec<u8>,
}

impl CompiledAsset {
    pub fn new(destination_path: impl Into<PathBuf>, compiled: impl Into<Vec<u8>>) -> Self {
        Self { destination_path: destination_path.into(), compiled: compiled.into() }
    }

    pub fn is_markup(&self) -> bool {
        is_markup_path(&self.destination_path)
    }

    /// Compiled bytes as text. Invalid UTF-8 is replaced, never rejected.
    pub fn materialize(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.compiled)
    }
}

/// What happened to one markup artifact.
#[derive(Debug)]
pub struct ArtifactOutcome {
    pub path: PathBuf,
    pub result: Result<()>,
}

impl ArtifactOutcome {
    pub fn is_written(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of one write-back batch.
#[derive(Debug, Default)]
pub struct WriteBackReport {
    /// One entry per markup artifact, in input order
    pub outcomes: Vec<ArtifactOutcome>,
    /// Assets that were not markup and were left alone
    pub skipped: usize,
}

impl WriteBackReport {
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.written()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ReplacerError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.path.as_path(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Rewrite and persist every markup artifact in `assets`.
///
/// Writes are issued concurrently on the calling task. No ordering holds
/// between artifacts; entries are still applied in order within each one.
pub async fn write_back(
    assets: &[CompiledAsset],
    dictionary: &[Entry],
    strategy: &dyn ReplaceStrategy,
) -> WriteBackReport {
    let (markup, other): (Vec<&CompiledAsset>, Vec<&CompiledAsset>) =
        assets.iter().partition(|asset| asset.is_markup());

    let outcomes = join_all(
        markup
            .into_iter()
            .map(|asset| rewrite_asset(asset, dictionary, strategy)),
    )
    .await;

    let report = WriteBackReport { outcomes, skipped: other.len() };
    info!(
        "Markup write-back finished: {} written, {} failed, {} skipped",
        report.written(),
        report.failed(),
        report.skipped
    );
    report
}

async fn rewrite_asset(
    asset: &CompiledAsset,
    dictionary: &[Entry],
    strategy: &dyn ReplaceStrategy,
) -> ArtifactOutcome {
    let path = asset.destination_path.as_path();
    let result = substitute_and_write(asset, dictionary, strategy).await;

    match &result {
        Ok(()) => debug!("Rewrote {}", path.display()),
        Err(e) => error!("Key value rewriting for {} failed: {}", path.display(), e),
    }

    ArtifactOutcome { path: path.to_path_buf(), result }
}

async fn substitute_and_write(
    asset: &CompiledAsset,
    dictionary: &[Entry],
    strategy: &dyn ReplaceStrategy,
) -> Result<()> {
    let path = asset.destination_path.as_path();
    let rewritten = apply_dictionary(&asset.materialize(), dictionary, strategy, Some(path))?;
    issue_write(path, rewritten.into_bytes())?.await
}

/// Validate the destination and hand back the pending write.
///
/// Anything that fails here never reaches the filesystem.
fn issue_write(path: &Path, bytes: Vec<u8>) -> Result<impl Future<Output = Result<()>> + use<>> {
    if path.as_os_str().is_empty() {
        return Err(ReplacerError::write_issuance(path, "destination path is empty"));
    }
    if path.file_name().is_none() {
        return Err(ReplacerError::write_issuance(path, "destination path does not name a file"));
    }

    let destination = path.to_path_buf();
    Ok(async move {
        tokio::fs::write(&destination, bytes)
            .await
            .map_err(|e| ReplacerError::write_completion(&destination, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_detection() {
        assert!(is_markup_path(Path::new("public/index.html")));
        assert!(is_markup_path(Path::new("public/page.html.tmp")));
        assert!(!is_markup_path(Path::new("public/app.js")));
        assert!(!is_markup_path(Path::new("public/htmlfile.txt")));
    }

    #[test]
    fn test_materialize_is_lossy() {
        let asset = CompiledAsset::new("index.html", vec![b'o', b'k', 0xff]);
        assert_eq!(asset.materialize(), "ok\u{fffd}");
    }

    #[test]
    fn test_issue_write_rejects_bad_destinations() {
        let err = issue_write(Path::new(""), Vec::new()).err().unwrap();
        assert!(matches!(err, ReplacerError::WriteIssuance { .. }));

        let err = issue_write(Path::new("public/.."), Vec::new()).err().unwrap();
        assert!(matches!(err, ReplacerError::WriteIssuance { .. }));
    }

    #[test]
    fn test_report_counts() {
        let report = WriteBackReport {
            outcomes: vec![
                ArtifactOutcome { path: "a.html".into(), result: Ok(()) },
                ArtifactOutcome {
                    path: "b.html".into(),
                    result: Err(ReplacerError::write_issuance(Path::new("b.html"), "nope")),
                },
            ],
            skipped: 3,
        };
        assert_eq!(report.written(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        let failures: Vec<_> = report.failures().map(|(p, _)| p.to_path_buf()).collect();
        assert_eq!(failures, vec![PathBuf::from("b.html")]);
    }
}
