//! Logging setup for sluice.
//!
//! The library itself only emits `tracing` events and spans. Binaries and
//! tests that want to see them install a subscriber with [`init_tracing`].
//!
//! # Configuration
//!
//! Logging format is controlled via `SLUICE_LOG_FORMAT`:
//! - `json` - Structured JSON output
//! - `pretty` - Human-readable colored output (default for TTY)
//! - `compact` - Compact single-line format
//!
//! # Example
//!
//! ```ignore
//! use sluice_executor::observability::{LogFormat, TracingConfig, init_tracing};
//!
//! let config = TracingConfig::builder()
//!     .log_format(LogFormat::Json)
//!     .log_filter("sluice_executor=debug")
//!     .build();
//! let _guard = init_tracing(config)?;
//! ```

mod config;
mod tracing_setup;

pub use config::{LogFormat, TracingConfig, TracingConfigBuilder};
pub use tracing_setup::{TracingGuard, init_tracing};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert_eq!(config.log_filter(), "info");
        assert!(!config.span_events());
    }

    #[test]
    fn config_builder() {
        let config = TracingConfig::builder()
            .log_format(LogFormat::Json)
            .log_filter("debug")
            .include_location(true)
            .span_events(true)
            .build();

        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.log_filter(), "debug");
        assert!(config.include_location());
        assert!(config.include_target());
        assert!(config.span_events());
    }

    #[test]
    fn unknown_format_falls_back() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("xml".parse::<LogFormat>().unwrap(), LogFormat::Compact);
    }

    #[test]
    fn init_twice_fails() {
        let config = TracingConfig::builder().log_filter("off").build();
        let first = init_tracing(config.clone());
        let second = init_tracing(config);
        // Another test in this binary may have installed a subscriber first.
        assert!(first.is_err() || second.is_err());
        if let Ok(guard) = first {
            assert_eq!(guard.format(), LogFormat::Compact);
        }
    }
}
