//! Log setup for the `skepu-gen` binary.
//!
//! Filter directives come from `SKEPU_GEN_LOG` when set; otherwise the
//! verbosity flags pick a level. Logs go to stderr so generated text on
//! stdout stays clean.

use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "SKEPU_GEN_LOG";

/// Requested verbosity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    Silent,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, silent: bool) -> Self {
        match (verbose, silent) {
            (true, _) => Verbosity::Verbose,
            (false, true) => Verbosity::Silent,
            (false, false) => Verbosity::Normal,
        }
    }

    pub fn default_directive(self) -> &'static str {
        match self {
            Verbosity::Silent => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Filter from `directives` when present and valid, else the verbosity
/// default.
pub fn resolve_filter(directives: Option<&str>, verbosity: Verbosity) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.default_directive()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbosity: Verbosity) {
    let directives = std::env::var(LOG_ENV).ok();
    let filter = resolve_filter(directives.as_deref(), verbosity);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_wins_over_silent() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Silent);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn test_filter_falls_back_to_verbosity() {
        assert_eq!(resolve_filter(None, Verbosity::Verbose).to_string(), "debug");
        assert_eq!(resolve_filter(Some("  "), Verbosity::Silent).to_string(), "warn");
        assert_eq!(
            resolve_filter(Some("skepu_codegen=trace"), Verbosity::Normal).to_string(),
            "skepu_codegen=trace"
        );
    }
}
