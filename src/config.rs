//! Replacer configuration.
//!
//! The host hands over an untyped options block, usually found under
//! `plugins.replacer` in its JSON configuration. This module turns it into
//! a [`ReplacerConfig`]: a strongly typed, fully normalized and read-only
//! structure that every artifact operation shares.
//!
//! # Example
//!
//! ```json
//! {
//!   "plugins": {
//!     "replacer": {
//!       "dict": [
//!         { "key": "__API_URL__", "value": "https://api.example.com" },
//!         { "key": "__FEATURES__", "value": { "beta": true } },
//!         { "key": "__EMPTY__" }
//!       ],
//!       "pattern": "\\.(ts|js)$",
//!       "key_mode": "literal"
//!     }
//!   }
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};
use tracing::warn;

use crate::error::{ReplacerError, Result};
use crate::normalize::normalize_value;
use crate::strategy::{RegexStrategy, ReplaceStrategy};

/// Extensions matched by the default source pattern.
pub const DEFAULT_PATTERN: &str = r"\.(js|svelte|jsx)$";

static DEFAULT_PATTERN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_PATTERN).expect("default pattern is a valid regex"));

/// How dictionary keys are interpreted by the default strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyMode {
    /// Keys are regular expression source, used unescaped
    #[default]
    Pattern,
    /// Keys match only their own literal text
    Literal,
}

/// Decides which source artifacts are eligible for transformation.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawPathPattern")]
pub enum PathPattern {
    /// The path ends with this string
    Suffix(String),
    /// The path (lossily converted to UTF-8) matches this regex
    Regex(Regex),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPathPattern {
    Regex(String),
    Suffix { suffix: String },
}

impl TryFrom<RawPathPattern> for PathPattern {
    type Error = ReplacerError;

    fn try_from(raw: RawPathPattern) -> Result<Self> {
        match raw {
            RawPathPattern::Regex(source) => Self::regex(&source),
            RawPathPattern::Suffix { suffix } => Ok(Self::Suffix(suffix)),
        }
    }
}

impl PathPattern {
    /// Build a regex pattern, reporting an invalid source as a configuration error
    pub fn regex(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Self::Regex)
            .map_err(|e| ReplacerError::config(format!("invalid pattern `{source}`: {e}")))
    }

    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self::Suffix(suffix.into())
    }

    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        match self {
            Self::Suffix(suffix) => path.ends_with(suffix.as_str()),
            Self::Regex(re) => re.is_match(&path),
        }
    }
}

impl Default for PathPattern {
    fn default() -> Self {
        Self::Regex(DEFAULT_PATTERN_RE.clone())
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suffix(suffix) => write!(f, "*{suffix}"),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// A dictionary entry exactly as it appears in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEntry {
    #[serde(default)]
    pub key: Option<String>,
    /// `None` only when the field is missing; an explicit `null` is kept
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl RawEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { key: Some(key.into()), value: Some(value.into()) }
    }
}

/// A normalized dictionary entry. The value is always a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// Options recognized in the `plugins.replacer` block.
///
/// Unknown fields are rejected. The replacement strategy is code and can
/// only be attached programmatically through [`ReplacerOptions::with_strategy`].
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplacerOptions {
    #[serde(default)]
    pub dict: Option<Vec<RawEntry>>,
    #[serde(default)]
    pub pattern: Option<PathPattern>,
    #[serde(default)]
    pub key_mode: KeyMode,
    #[serde(skip)]
    pub replace: Option<Arc<dyn ReplaceStrategy>>,
}

impl fmt::Debug for ReplacerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplacerOptions")
            .field("dict", &self.dict)
            .field("pattern", &self.pattern)
            .field("key_mode", &self.key_mode)
            .field("replace", &self.replace.as_ref().map(|_| "<strategy>"))
            .finish()
    }
}

impl ReplacerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry to the dictionary
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.dict.get_or_insert_with(Vec::new).push(RawEntry::new(key, value));
        self
    }

    pub fn with_pattern(mut self, pattern: PathPattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_key_mode(mut self, mode: KeyMode) -> Self {
        self.key_mode = mode;
        self
    }

    /// Replace the default regex strategy
    pub fn with_strategy(mut self, strategy: impl ReplaceStrategy + 'static) -> Self {
        self.replace = Some(Arc::new(strategy));
        self
    }

    /// Parse a bare `replacer` options block
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The plugin section of a host configuration. Other plugins' blocks are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plugins {
    #[serde(default)]
    pub replacer: Option<ReplacerOptions>,
}

/// The subset of a host build configuration this crate reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub plugins: Plugins,
}

impl HostConfig {
    /// Parse either a full host configuration (`{"plugins": {...}}`) or a
    /// bare replacer options block.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if value.get("plugins").is_some() {
            Ok(serde_json::from_value(value)?)
        } else {
            let options: ReplacerOptions = serde_json::from_value(value)?;
            Ok(Self { plugins: Plugins { replacer: Some(options) } })
        }
    }

    /// Load a configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    /// The replacer options, or defaults when the host has none
    pub fn into_replacer_options(self) -> ReplacerOptions {
        self.plugins.replacer.unwrap_or_default()
    }
}

/// Normalized, read-only configuration shared by every artifact operation.
#[derive(Clone)]
pub struct ReplacerConfig {
    dictionary: Arc<[Entry]>,
    strategy: Arc<dyn ReplaceStrategy>,
    pattern: PathPattern,
    key_mode: Option<KeyMode>,
}

impl fmt::Debug for ReplacerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplacerConfig")
            .field("dictionary", &self.dictionary)
            .field("strategy", &"<strategy>")
            .field("pattern", &self.pattern)
            .field("key_mode", &self.key_mode)
            .finish()
    }
}

impl ReplacerConfig {
    /// Consume host options and normalize every entry eagerly.
    ///
    /// Fails when an entry has no `key`, or when the built-in strategy is
    /// used and a key does not compile.
    pub fn from_options(options: ReplacerOptions) -> Result<Self> {
        let ReplacerOptions { dict, pattern, key_mode, replace } = options;

        let dictionary = dict
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, raw)| -> Result<Entry> {
                let key = raw
                    .key
                    .ok_or_else(|| ReplacerError::config(format!("dictionary entry {index} has no `key`")))?;
                Ok(Entry { key, value: normalize_value(raw.value.as_ref()) })
            })
            .collect::<Result<Vec<_>>>()?;

        let (strategy, key_mode): (Arc<dyn ReplaceStrategy>, _) = match replace {
            Some(custom) => {
                if key_mode != KeyMode::default() {
                    warn!("key_mode `{key_mode}` is ignored: a custom replace strategy is configured");
                }
                (custom, None)
            }
            None => {
                let default: Arc<dyn ReplaceStrategy> =
                    Arc::new(RegexStrategy::for_dictionary(key_mode, &dictionary)?);
                (default, Some(key_mode))
            }
        };

        Ok(Self {
            dictionary: dictionary.into(),
            strategy,
            pattern: pattern.unwrap_or_default(),
            key_mode,
        })
    }

    pub fn dictionary(&self) -> &[Entry] {
        &self.dictionary
    }

    pub fn strategy(&self) -> &dyn ReplaceStrategy {
        self.strategy.as_ref()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Key mode of the built-in strategy; `None` when a custom strategy is in use
    pub fn key_mode(&self) -> Option<KeyMode> {
        self.key_mode
    }

    pub fn has_custom_strategy(&self) -> bool {
        self.key_mode.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_host_config() {
        let json = r#"{
            "plugins": {
                "replacer": {
                    "dict": [
                        { "key": "__API__", "value": "https://api.local" },
                        { "key": "__PORT__", "value": 8080 },
                        { "key": "__FLAGS__", "value": { "beta": true, "alpha": false } },
                        { "key": "__NULL__", "value": null },
                        { "key": "__EMPTY__" }
                    ],
                    "pattern": { "suffix": ".ts" }
                },
                "sass": { "mode": "native" }
            }
        }"#;

        let options = HostConfig::from_json_str(json).unwrap().into_replacer_options();
        let config = ReplacerConfig::from_options(options).unwrap();

        assert_eq!(
            config.dictionary(),
            &[
                Entry::new("__API__", "https://api.local"),
                Entry::new("__PORT__", "8080"),
                Entry::new("__FLAGS__", r#"{"beta":true,"alpha":false}"#),
                Entry::new("__NULL__", "null"),
                Entry::new("__EMPTY__", ""),
            ]
        );
        assert!(config.pattern().matches(Path::new("src/app.ts")));
        assert!(!config.pattern().matches(Path::new("src/app.js")));
    }

    #[test]
    fn test_bare_options_block() {
        let json = r#"{ "dict": [{ "key": "A", "value": "B" }], "key_mode": "literal" }"#;
        let options = HostConfig::from_json_str(json).unwrap().into_replacer_options();
        assert_eq!(options.key_mode, KeyMode::Literal);
        assert_eq!(options.dict.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_missing_replacer_block_defaults() {
        let options = HostConfig::from_json_str(r#"{ "plugins": {} }"#)
            .unwrap()
            .into_replacer_options();
        let config = ReplacerConfig::from_options(options).unwrap();
        assert!(config.dictionary().is_empty());
        assert_eq!(config.key_mode(), Some(KeyMode::Pattern));
        assert!(!config.has_custom_strategy());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ReplacerOptions::from_json_str(r#"{ "dictionary": [] }"#).unwrap_err();
        assert!(matches!(err, ReplacerError::Json(_)));
    }

    #[test]
    fn test_entry_without_key_rejected() {
        let options = ReplacerOptions::from_json_str(r#"{ "dict": [{ "key": "A" }, { "value": 1 }] }"#).unwrap();
        let err = ReplacerConfig::from_options(options).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: dictionary entry 1 has no `key`");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = ReplacerOptions::from_json_str(r#"{ "pattern": "(unclosed" }"#).unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_default_pattern() {
        let pattern = PathPattern::default();
        assert!(pattern.matches(Path::new("app/main.js")));
        assert!(pattern.matches(Path::new("app/App.svelte")));
        assert!(pattern.matches(Path::new("app/view.jsx")));
        assert!(!pattern.matches(Path::new("app/styles.css")));
        assert!(!pattern.matches(Path::new("app/main.json")));
        assert_eq!(pattern.to_string(), r"/\.(js|svelte|jsx)$/");
    }

    #[test]
    fn test_pattern_is_promoted_out_of_options() {
        let options = ReplacerOptions::new()
            .with_entry("A", json!("B"))
            .with_pattern(PathPattern::suffix(".mjs"));
        let config = ReplacerConfig::from_options(options).unwrap();
        assert!(config.pattern().matches(Path::new("x.mjs")));
    }

    #[test]
    fn test_invalid_key_fails_construction() {
        let options = ReplacerOptions::new().with_entry("[unterminated", "x");
        let err = ReplacerConfig::from_options(options).unwrap_err();
        assert!(matches!(err, ReplacerError::Config(_)));
        assert!(err.to_string().contains("[unterminated"));

        let options = ReplacerOptions::new()
            .with_entry("[unterminated", "x")
            .with_key_mode(KeyMode::Literal);
        assert!(ReplacerConfig::from_options(options).is_ok());
    }

    #[test]
    fn test_custom_strategy_drops_key_mode() {
        let options = ReplacerOptions::new()
            .with_entry("[unterminated", "x")
            .with_key_mode(KeyMode::Literal)
            .with_strategy(|text: &str, _k: &str, _v: &str, _p: Option<&Path>| -> Result<String> {
                Ok(text.to_string())
            });
        let config = ReplacerConfig::from_options(options).unwrap();
        assert!(config.has_custom_strategy());
        assert_eq!(config.key_mode(), None);
    }

    #[test]
    fn test_key_mode_parses_from_str() {
        assert_eq!("literal".parse::<KeyMode>().unwrap(), KeyMode::Literal);
        assert_eq!(KeyMode::Pattern.to_string(), "pattern");
    }
}
