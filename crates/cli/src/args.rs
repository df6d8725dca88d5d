//! Command-line arguments.

use std::fmt;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "favicon")]
#[command(about = "Prefix outbound links with their site's favicon", long_about = None)]
pub struct Cli {
    /// TOML configuration file (overrides FAVICON_PREFIXER_CONFIG_FILE)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clear the favicon cache
    #[command(name = "cache_clear")]
    CacheClear,
    /// Show cache statistics
    #[command(name = "cache_status")]
    CacheStatus,
    /// List all cached favicons
    #[command(name = "cache_list")]
    CacheList {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Run an end-to-end test against a URL
    Autotest {
        /// The full URL to test (e.g. https://example.com)
        url: String,

        /// Show detailed debugging information
        #[arg(long)]
        debug: bool,
    },
    /// Rewrite an HTML fragment read from a file or stdin
    Process {
        /// Apply the enabled post type filter for this category
        #[arg(long)]
        post_type: Option<String>,

        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Update and show the persisted settings
    Settings {
        /// Comma-separated post types to enable
        #[arg(long, value_delimiter = ',')]
        post_types: Option<Vec<String>>,

        /// Skip links pointing at the site itself
        #[arg(long, action = ArgAction::Set)]
        ignore_internal: Option<bool>,

        /// Log the silent failure paths at debug level
        #[arg(long, action = ArgAction::Set)]
        debug_mode: Option<bool>,
    },
    /// Remove every favicon, cache record and setting
    Uninstall,
}

impl Commands {
    /// Whether the command asked for debug output itself.
    pub fn wants_debug(&self) -> bool {
        matches!(self, Commands::Autotest { debug: true, .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
    Yaml,
}

impl OutputFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_case_subcommands() {
        let cli = Cli::try_parse_from(["favicon", "cache_list", "--format=json"]).unwrap();
        assert!(matches!(cli.command, Commands::CacheList { format: OutputFormat::Json }));

        let cli = Cli::try_parse_from(["favicon", "cache_clear"]).unwrap();
        assert!(matches!(cli.command, Commands::CacheClear));
    }

    #[test]
    fn cache_list_defaults_to_table() {
        let cli = Cli::try_parse_from(["favicon", "cache_list"]).unwrap();
        assert!(matches!(cli.command, Commands::CacheList { format: OutputFormat::Table }));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["favicon", "cache_list", "--format=xml"]).is_err());
    }

    #[test]
    fn autotest_debug_flag() {
        let cli = Cli::try_parse_from(["favicon", "autotest", "https://example.com", "--debug"]).unwrap();
        assert!(cli.command.wants_debug());

        let cli = Cli::try_parse_from(["favicon", "autotest", "https://example.com"]).unwrap();
        assert!(!cli.command.wants_debug());
    }

    #[test]
    fn settings_values() {
        let cli = Cli::try_parse_from([
            "favicon",
            "--config",
            "site.toml",
            "settings",
            "--post-types",
            "post,page",
            "--ignore-internal",
            "false",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
        match cli.command {
            Commands::Settings { post_types, ignore_internal, debug_mode } => {
                assert_eq!(post_types, Some(vec!["post".to_string(), "page".to_string()]));
                assert_eq!(ignore_internal, Some(false));
                assert_eq!(debug_mode, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flags_are_kebab_case() {
        let cli = Cli::try_parse_from(["favicon", "settings", "--debug-mode", "true"]).unwrap();
        assert!(matches!(cli.command, Commands::Settings { debug_mode: Some(true), .. }));

        let cli = Cli::try_parse_from(["favicon", "process", "--post-type", "page", "post.html"]).unwrap();
        match cli.command {
            Commands::Process { post_type, file } => {
                assert_eq!(post_type.as_deref(), Some("page"));
                assert_eq!(file, Some(PathBuf::from("post.html")));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["favicon", "settings", "--post_types", "post"]).is_err());
    }
}
