//! CLI argument parsing
//!
//! Options override the config file; the config file falls back to the
//! environment for credentials.

use crate::cli::{Error, Result};

/// Default config file name, looked up under the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sqlunit.toml";

/// Parsed CLI arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    /// Config file path (default: sqlunit.toml if present)
    pub config_file: Option<String>,

    /// Database overrides
    pub db_url: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,

    /// Project base directory override
    pub base_dir: Option<String>,

    /// Report output directory override
    pub output_dir: Option<String>,

    /// Skip the whole run
    pub skip_tests: bool,

    /// Tolerate failed tests (exit successfully, still report)
    pub ignore_failure: bool,

    /// JSON summary output
    pub json_output: bool,

    /// Show version and exit
    pub show_version: bool,

    /// Show help and exit
    pub show_help: bool,
}

/// Usage text printed for --help
pub const USAGE: &str = "\
sqlunit-runner — run database-resident unit tests and collect reports

USAGE:
  sqlunit-runner [options]

OPTIONS:
  --config <file>       Config file (default: sqlunit.toml)
  --db-url <url>        Database URL (overrides config / SQLUNIT_DB_URL)
  --db-user <user>      Database user
  --db-password <pass>  Database password
  --base-dir <dir>      Project base directory
  --output-dir <dir>    Report output directory
  --skip                Skip the test run entirely
  --ignore-failure      Exit successfully even when tests fail
  --json                Print the run summary as JSON
  --version             Show version
  --help                Show this help
";

/// Parse CLI arguments from std::env::args()
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut iter = args.into_iter();
    let _program = iter.next(); // Skip program name

    let mut out = Args::default();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => out.config_file = Some(take_value(&mut iter, "--config")?),
            "--db-url" => out.db_url = Some(take_value(&mut iter, "--db-url")?),
            "--db-user" => out.db_user = Some(take_value(&mut iter, "--db-user")?),
            "--db-password" => out.db_password = Some(take_value(&mut iter, "--db-password")?),
            "--base-dir" => out.base_dir = Some(take_value(&mut iter, "--base-dir")?),
            "--output-dir" => out.output_dir = Some(take_value(&mut iter, "--output-dir")?),
            "--skip" => out.skip_tests = true,
            "--ignore-failure" => out.ignore_failure = true,
            "--json" => out.json_output = true,
            "--version" => out.show_version = true,
            "--help" | "-h" => out.show_help = true,
            other if other.starts_with("--") => {
                return Err(Error::UnknownArgument(other.to_string()))
            }
            other => return Err(Error::InvalidArgs(other.to_string())),
        }
    }

    Ok(out)
}

fn take_value<I: Iterator<Item = String>>(iter: &mut I, flag: &str) -> Result<String> {
    iter.next().ok_or_else(|| Error::MissingValue(flag.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("sqlunit-runner")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn parses_overrides_and_flags() {
        let args = parse_args(argv(&[
            "--config",
            "ci.toml",
            "--db-url",
            "sqlite://tests.db",
            "--ignore-failure",
            "--json",
        ]))
        .unwrap();
        assert_eq!(args.config_file.as_deref(), Some("ci.toml"));
        assert_eq!(args.db_url.as_deref(), Some("sqlite://tests.db"));
        assert!(args.ignore_failure);
        assert!(args.json_output);
        assert!(!args.skip_tests);
    }

    #[test]
    fn rejects_unknown_flags_and_stray_values() {
        assert!(matches!(
            parse_args(argv(&["--frobnicate"])),
            Err(Error::UnknownArgument(_))
        ));
        assert!(matches!(
            parse_args(argv(&["stray"])),
            Err(Error::InvalidArgs(_))
        ));
        assert!(matches!(
            parse_args(argv(&["--db-url"])),
            Err(Error::MissingValue(_))
        ));
    }
}
