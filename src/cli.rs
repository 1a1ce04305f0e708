use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dict_replacer::KeyMode;

/// dict-replacer - inject configured values into build outputs
#[derive(Parser)]
#[command(name = "dict-replacer")]
#[command(about = "Rewrite dictionary keys into configured values in source files and HTML pages")]
#[command(version)]
pub struct Cli {
    /// Override the key mode from the configuration file.
    ///
    /// `pattern` treats keys as regular expressions, `literal` matches
    /// them as plain text.
    #[arg(long, global = true)]
    pub key_mode: Option<KeyMode>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and normalize a configuration, then print its dictionary
    Check {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Rewrite source files matching the configured pattern
    Source {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Write results back instead of printing them
        #[arg(short, long)]
        in_place: bool,

        /// Source files to rewrite (files not matching the pattern are skipped)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Rewrite HTML pages in place
    Markup {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Pages to rewrite (non-HTML paths are skipped)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_key_mode_override_parses() {
        let cli = Cli::try_parse_from([
            "dict-replacer",
            "--key-mode",
            "literal",
            "markup",
            "--config",
            "brunch.json",
            "public/index.html",
        ])
        .unwrap();
        assert_eq!(cli.key_mode, Some(KeyMode::Literal));
        assert!(matches!(cli.command, Commands::Markup { ref paths, .. } if paths.len() == 1));
    }
}
