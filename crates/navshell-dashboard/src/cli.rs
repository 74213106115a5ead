#![forbid(unsafe_code)]

//! Command-line argument parsing for the `navshell` binary.
//!
//! Parses args manually (no external dependencies) to keep the binary lean.
//! Supports environment variable overrides via the `NAVSHELL_*` prefix.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
navshell: dashboard navigation shell

USAGE:
    navshell [OPTIONS]

OPTIONS:
    --url=PATH[?QUERY]   Starting location (default: /dashboard)
    --email=EMAIL        Signed-in user's email (default: owner@example.com)
    --user-id=ID         Signed-in user's id (default: user-1)
    --signed-out         Start without a signed-in user
    --snapshot=FILE      JSON subscription snapshot, re-read on every fetch
    --log-file=FILE      Log destination (default: navshell.log)
    --log-json           Write logs as JSON lines
    --no-mouse           Disable mouse event capture
    --exit-after-ms=N    Quit after N milliseconds
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS:
    1-9             Go to navigation entry N
    Up/Down, k/j    Move the navigation cursor
    Enter           Go to the entry under the cursor
    m / Esc         Toggle / close the navigation drawer
    r               Refresh the subscription
    u               Broadcast a subscription update
    s               Sign out
    q / Ctrl+C      Quit

ENVIRONMENT VARIABLES:
    NAVSHELL_URL              Override --url
    NAVSHELL_EMAIL            Override --email
    NAVSHELL_USER_ID          Override --user-id
    NAVSHELL_SNAPSHOT         Override --snapshot
    NAVSHELL_LOG_FILE         Override --log-file
    NAVSHELL_EXIT_AFTER_MS    Override --exit-after-ms
    RUST_LOG                  Log filter (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Starting location, path plus optional query.
    pub url: String,
    pub email: String,
    pub user_id: String,
    pub signed_in: bool,
    /// Snapshot file; a fixed trial snapshot is served when absent.
    pub snapshot: Option<PathBuf>,
    pub log_file: PathBuf,
    pub log_json: bool,
    /// Whether mouse events are enabled.
    pub mouse: bool,
    /// Auto-exit after this many milliseconds (0 = disabled).
    pub exit_after_ms: u64,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            url: "/dashboard".into(),
            email: "owner@example.com".into(),
            user_id: "user-1".into(),
            signed_in: true,
            snapshot: None,
            log_file: PathBuf::from("navshell.log"),
            log_json: false,
            mouse: true,
            exit_after_ms: 0,
        }
    }
}

/// Why parsing stopped without producing [`Opts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptsError {
    /// `--help` was given.
    Help,
    /// `--version` was given.
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArgument(String),
}

impl fmt::Display for OptsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => f.write_str(HELP_TEXT),
            Self::Version => write!(f, "navshell {VERSION}"),
            Self::InvalidValue { flag, value } => write!(f, "Invalid {flag} value: {value}"),
            Self::UnknownArgument(arg) => write!(f, "Unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for OptsError {}

impl Opts {
    /// Parse process arguments and environment, exiting on `--help`,
    /// `--version`, or bad input.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(&args, |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(e @ (OptsError::Help | OptsError::Version)) => {
                println!("{e}");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("{e}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` (without the program name) with `env` as the variable
    /// lookup.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags. Unparseable environment values are
    /// ignored.
    pub fn parse_from(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, OptsError> {
        let mut opts = Self::default();

        if let Some(val) = env("NAVSHELL_URL") {
            opts.url = val;
        }
        if let Some(val) = env("NAVSHELL_EMAIL") {
            opts.email = val;
        }
        if let Some(val) = env("NAVSHELL_USER_ID") {
            opts.user_id = val;
        }
        if let Some(val) = env("NAVSHELL_SNAPSHOT") {
            opts.snapshot = Some(PathBuf::from(val));
        }
        if let Some(val) = env("NAVSHELL_LOG_FILE") {
            opts.log_file = PathBuf::from(val);
        }
        if let Some(val) = env("NAVSHELL_EXIT_AFTER_MS")
            && let Ok(n) = val.parse()
        {
            opts.exit_after_ms = n;
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Err(OptsError::Help),
                "--version" | "-V" => return Err(OptsError::Version),
                "--signed-out" => opts.signed_in = false,
                "--log-json" => opts.log_json = true,
                "--no-mouse" => opts.mouse = false,
                other => {
                    if let Some(val) = other.strip_prefix("--url=") {
                        opts.url = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--email=") {
                        opts.email = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--user-id=") {
                        opts.user_id = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--snapshot=") {
                        opts.snapshot = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = PathBuf::from(val);
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        opts.exit_after_ms = val.parse().map_err(|_| OptsError::InvalidValue {
                            flag: "--exit-after-ms",
                            value: val.to_string(),
                        })?;
                    } else {
                        return Err(OptsError::UnknownArgument(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert_eq!(opts.url, "/dashboard");
        assert!(opts.signed_in);
        assert!(opts.mouse);
        assert!(opts.snapshot.is_none());
        assert_eq!(opts.exit_after_ms, 0);
    }

    #[test]
    fn flags_are_parsed() {
        let opts = Opts::parse_from(
            &args(&[
                "--url=/dashboard/billing?payment=success",
                "--email=a@b.co",
                "--snapshot=snap.json",
                "--log-json",
                "--no-mouse",
                "--exit-after-ms=2500",
            ]),
            no_env,
        )
        .unwrap();
        assert_eq!(opts.url, "/dashboard/billing?payment=success");
        assert_eq!(opts.email, "a@b.co");
        assert_eq!(opts.snapshot, Some(PathBuf::from("snap.json")));
        assert!(opts.log_json);
        assert!(!opts.mouse);
        assert_eq!(opts.exit_after_ms, 2500);
    }

    #[test]
    fn flags_override_env() {
        let env = |key: &str| match key {
            "NAVSHELL_URL" => Some("/analytics".to_string()),
            "NAVSHELL_EXIT_AFTER_MS" => Some("100".to_string()),
            "NAVSHELL_USER_ID" => Some("env-user".to_string()),
            _ => None,
        };
        let opts = Opts::parse_from(&args(&["--url=/customers"]), env).unwrap();
        assert_eq!(opts.url, "/customers");
        assert_eq!(opts.exit_after_ms, 100);
        assert_eq!(opts.user_id, "env-user");
    }

    #[test]
    fn bad_env_number_is_ignored() {
        let env = |key: &str| (key == "NAVSHELL_EXIT_AFTER_MS").then(|| "soon".to_string());
        assert_eq!(Opts::parse_from(&[], env).unwrap().exit_after_ms, 0);
    }

    #[test]
    fn errors() {
        assert_eq!(Opts::parse_from(&args(&["-h"]), no_env), Err(OptsError::Help));
        assert_eq!(Opts::parse_from(&args(&["--version"]), no_env), Err(OptsError::Version));
        assert_eq!(
            Opts::parse_from(&args(&["--exit-after-ms=x"]), no_env),
            Err(OptsError::InvalidValue {
                flag: "--exit-after-ms",
                value: "x".into()
            })
        );
        assert_eq!(
            Opts::parse_from(&args(&["--bogus"]), no_env),
            Err(OptsError::UnknownArgument("--bogus".into()))
        );
    }

    #[test]
    fn help_text_contains_env_vars() {
        assert!(HELP_TEXT.contains("NAVSHELL_URL"));
        assert!(HELP_TEXT.contains("NAVSHELL_EXIT_AFTER_MS"));
        assert!(OptsError::Version.to_string().contains(VERSION));
    }
}
