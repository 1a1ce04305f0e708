//! The plugin facade hosts talk to.
//!
//! A [`Replacer`] is built once per build from the host configuration and
//! then serves two entry points:
//!
//! - [`Replacer::compile`] for source files, one at a time, in memory
//! - [`Replacer::on_compile`] for the emitted HTML pages, written to disk
//!
//! Both are async so they slot into an async host pipeline, even though
//! only the disk writes actually suspend.

use std::path::Path;

use tracing::{debug, info};

use crate::config::{Entry, HostConfig, PathPattern, ReplacerConfig, ReplacerOptions};
use crate::error::Result;
use crate::markup::{self, CompiledAsset, WriteBackReport};
use crate::source::{self, SourceFile};

#[derive(Debug, Clone)]
pub struct Replacer {
    config: ReplacerConfig,
}

impl Replacer {
    /// Hosts look for this marker before treating a component as a plugin.
    pub const IS_PLUGIN: bool = true;
    /// Kind of artifact the source entry point handles.
    pub const TARGET_KIND: &'static str = "javascript";
    /// Build environments the plugin runs in (`*` = all of them).
    pub const DEFAULT_SCOPE: &'static str = "*";

    /// Build from the host configuration's `plugins.replacer` block.
    pub fn new(host: HostConfig) -> Result<Self> {
        Self::from_options(host.into_replacer_options())
    }

    pub fn from_options(options: ReplacerOptions) -> Result<Self> {
        let config = ReplacerConfig::from_options(options)?;
        info!("Replacer configured with {} dictionary entries", config.dictionary().len());
        match config.key_mode() {
            Some(mode) => debug!("Source pattern {}, key mode {}", config.pattern(), mode),
            None => debug!("Source pattern {}, custom replace strategy", config.pattern()),
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReplacerConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &[Entry] {
        self.config.dictionary()
    }

    /// The effective source pattern (configured or default).
    pub fn pattern(&self) -> &PathPattern {
        self.config.pattern()
    }

    /// Whether the host should route this source path through [`Replacer::compile`].
    pub fn is_eligible(&self, path: &Path) -> bool {
        self.config.pattern().matches(path)
    }

    /// Rewrite and persist every HTML artifact. Never fails as a whole;
    /// per-artifact failures are logged and reported.
    pub async fn on_compile(&self, assets: &[CompiledAsset]) -> WriteBackReport {
        markup::write_back(assets, self.config.dictionary(), self.config.strategy()).await
    }

    /// Rewrite one source file in memory. Strategy errors are returned to
    /// the host, which decides whether they fail the build.
    pub async fn compile(&self, file: Option<SourceFile>) -> Result<Option<SourceFile>> {
        source::transform(file, self.config.dictionary(), self.config.strategy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyMode;

    #[test]
    fn test_static_metadata() {
        assert!(Replacer::IS_PLUGIN);
        assert_eq!(Replacer::TARGET_KIND, "javascript");
        assert_eq!(Replacer::DEFAULT_SCOPE, "*");
    }

    #[test]
    fn test_default_replacer_has_empty_dictionary() {
        let replacer = Replacer::new(HostConfig::default()).unwrap();
        assert!(replacer.dictionary().is_empty());
        assert!(replacer.is_eligible(Path::new("src/app.jsx")));
        assert!(!replacer.is_eligible(Path::new("src/app.css")));
    }

    #[test]
    fn test_custom_pattern_replaces_default() {
        let replacer = Replacer::from_options(
            ReplacerOptions::new().with_pattern(PathPattern::suffix(".ts")),
        )
        .unwrap();
        assert!(replacer.is_eligible(Path::new("src/app.ts")));
        assert!(!replacer.is_eligible(Path::new("src/app.js")));
    }

    #[tokio::test]
    async fn test_compile_uses_configured_key_mode() {
        let replacer = Replacer::from_options(
            ReplacerOptions::new()
                .with_entry("a.b", "X")
                .with_key_mode(KeyMode::Literal),
        )
        .unwrap();

        let out = replacer
            .compile(Some(SourceFile::new("src/app.js", "a.b axb")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.data.as_deref(), Some("X axb"));
    }
}
