//! Replacement strategies.
//!
//! A strategy performs one key/value substitution over a text buffer. The
//! engine calls it once per dictionary entry, in order. Hosts can plug in
//! their own strategy (any closure with the right shape works) to do
//! path-aware substitution; otherwise [`RegexStrategy`] is used.

use std::collections::HashMap;
use std::path::Path;

use regex::{Captures, NoExpand, Regex};

use crate::config::{Entry, KeyMode};
use crate::error::{ReplacerError, Result};

/// One key/value substitution over a text buffer.
///
/// # Contract
///
/// - Must not mutate anything visible to other artifacts; the same
///   strategy is shared by every concurrent write-back.
/// - `path` is the destination path of a markup artifact or the source
///   path of a source artifact, when the host supplied one.
/// - Errors halt the remaining entries for the current artifact only.
pub trait ReplaceStrategy: Send + Sync {
    fn replace(&self, text: &str, key: &str, value: &str, path: Option<&Path>) -> Result<String>;
}

impl<F> ReplaceStrategy for F
where
    F: Fn(&str, &str, &str, Option<&Path>) -> Result<String> + Send + Sync,
{
    fn replace(&self, text: &str, key: &str, value: &str, path: Option<&Path>) -> Result<String> {
        self(text, key, value, path)
    }
}

/// The built-in strategy: compile the key as a regular expression and
/// replace every non-overlapping match with the value.
///
/// In [`KeyMode::Pattern`] (the default) keys are used as regex source
/// without escaping, so `API.URL` also matches `API_URL` and `API-URL`.
/// Values go through ECMAScript replacement expansion: `$$`, `$&`,
/// `` $` ``, `$'`, `$1`..`$99` and `$<name>`. Configurations that rely on
/// either keep working; everything else should opt into
/// [`KeyMode::Literal`], where keys match only themselves and values are
/// inserted verbatim.
///
/// Keys of the configured dictionary are compiled once, up front, by
/// [`RegexStrategy::for_dictionary`]. Any other key is compiled on use.
#[derive(Debug, Clone, Default)]
pub struct RegexStrategy {
    mode: KeyMode,
    compiled: HashMap<String, Regex>,
}

impl RegexStrategy {
    pub fn new(mode: KeyMode) -> Self {
        Self { mode, compiled: HashMap::new() }
    }

    /// Compile every key of `dictionary`. An invalid key is a configuration error.
    pub fn for_dictionary(mode: KeyMode, dictionary: &[Entry]) -> Result<Self> {
        let mut strategy = Self::new(mode);
        for entry in dictionary {
            if strategy.compiled.contains_key(&entry.key) {
                continue;
            }
            let re = compile_key(mode, &entry.key).map_err(|e| {
                ReplacerError::config(format!("invalid dictionary key `{}`: {e}", entry.key))
            })?;
            strategy.compiled.insert(entry.key.clone(), re);
        }
        Ok(strategy)
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }
}

fn compile_key(mode: KeyMode, key: &str) -> std::result::Result<Regex, regex::Error> {
    match mode {
        KeyMode::Pattern => Regex::new(key),
        KeyMode::Literal => Regex::new(&regex::escape(key)),
    }
}

impl ReplaceStrategy for RegexStrategy {
    fn replace(&self, text: &str, key: &str, value: &str, _path: Option<&Path>) -> Result<String> {
        let compiled;
        let re = match self.compiled.get(key) {
            Some(re) => re,
            None => {
                compiled = compile_key(self.mode, key)
                    .map_err(|e| ReplacerError::strategy(key, e.to_string()))?;
                &compiled
            }
        };

        if self.mode == KeyMode::Literal || !value.contains('$') {
            return Ok(re.replace_all(text, NoExpand(value)).into_owned());
        }

        let named = re.capture_names().flatten().next().is_some();
        let out = re.replace_all(text, |caps: &Captures<'_>| {
            let mut dst = String::with_capacity(value.len());
            expand_value(value, caps, text, named, &mut dst);
            dst
        });
        Ok(out.into_owned())
    }
}

/// Expand `$` patterns in `value` for one match, following ECMAScript's
/// `GetSubstitution`. Unrecognized patterns are kept as written.
fn expand_value(value: &str, caps: &Captures<'_>, haystack: &str, named: bool, dst: &mut String) {
    let Some(whole) = caps.get(0) else {
        dst.push_str(value);
        return;
    };

    let mut rest = value;
    while let Some(at) = rest.find('$') {
        dst.push_str(&rest[..at]);
        let tail = &rest[at + 1..];
        let consumed = match tail.as_bytes().first() {
            Some(b'$') => {
                dst.push('$');
                1
            }
            Some(b'&') => {
                dst.push_str(whole.as_str());
                1
            }
            Some(b'`') => {
                dst.push_str(&haystack[..whole.start()]);
                1
            }
            Some(b'\'') => {
                dst.push_str(&haystack[whole.end()..]);
                1
            }
            Some(d) if d.is_ascii_digit() => expand_group(tail.as_bytes(), caps, dst),
            Some(b'<') if named => match tail.find('>') {
                Some(close) => {
                    if let Some(m) = caps.name(&tail[1..close]) {
                        dst.push_str(m.as_str());
                    }
                    close + 1
                }
                None => {
                    dst.push('$');
                    0
                }
            },
            _ => {
                dst.push('$');
                0
            }
        };
        rest = &tail[consumed..];
    }
    dst.push_str(rest);
}

/// `$n` / `$nn`: the two-digit form wins when that group exists. Returns
/// the number of digits consumed.
fn expand_group(digits: &[u8], caps: &Captures<'_>, dst: &mut String) -> usize {
    let groups = caps.len() - 1;
    let first = usize::from(digits[0] - b'0');

    if let Some(second) = digits.get(1).filter(|b| b.is_ascii_digit()) {
        let index = first * 10 + usize::from(*second - b'0');
        if (1..=groups).contains(&index) {
            dst.push_str(caps.get(index).map_or("", |m| m.as_str()));
            return 2;
        }
    }
    if (1..=groups).contains(&first) {
        dst.push_str(caps.get(first).map_or("", |m| m.as_str()));
        return 1;
    }
    dst.push('$');
    0
}
