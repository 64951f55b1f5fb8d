//! # Logging setup
//!
//! The library logs through the `log` facade. Binaries call [init_logging()] once at startup to print the logs
//! with `env_logger`. The `RUST_LOG` environment variable takes precedence over the verbosity.

use log::LevelFilter;

/// Verbosity of the logging output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Info and above
    #[default]
    Normal,
    /// Debug and above
    Verbose,
    /// Everything
    Trace,
}

impl Verbosity {
    /// Build the verbosity from `-q` and the number of `-v` flags
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Matching log level filter
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Error,
            Self::Normal => LevelFilter::Info,
            Self::Verbose => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Install the `env_logger` logger. Calling it again has no effect.
pub fn init_logging(verbosity: Verbosity) {
    let _ = env_logger::Builder::new()
        .filter_level(verbosity.level_filter())
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_to_verbosity() {
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
    }

    #[test]
    fn level_filters() {
        assert_eq!(Verbosity::Quiet.level_filter(), LevelFilter::Error);
        assert_eq!(Verbosity::Normal.level_filter(), LevelFilter::Info);
        assert_eq!(Verbosity::Trace.level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging(Verbosity::Normal);
        init_logging(Verbosity::Verbose);
    }
}
