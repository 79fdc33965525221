//! Configuration loading pipeline
//!
//! Resolution order: built-in defaults, then `.env`/environment variables,
//! then CLI arguments. The merged configuration is validated before any
//! probe runs.

use crate::cli::Cli;
use crate::error::Result;
use crate::models::Config;

// Re-export from models for convenience
pub use crate::models::Config as AppConfig;

/// A non-fatal configuration finding, surfaced before the probes run
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub message: String,
}

impl ConfigWarning {
    fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Configuration parser that layers CLI arguments over environment
/// variables over defaults
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<(Config, Vec<ConfigWarning>)> {
        let mut config = Config::default();

        // Missing .env is fine; variables may come from the process env
        dotenv::dotenv().ok();
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        let warnings = soft_warnings(&config);
        Ok((config, warnings))
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if !self.cli.probes.is_empty() {
            config.probes = self.cli.probes.clone();
        }
        if !self.cli.download_urls.is_empty() {
            config.download_urls = self.cli.download_urls.clone();
        }
        if let Some(ref upload_url) = self.cli.upload_url {
            config.upload_url = upload_url.clone();
        }
        if let Some(ref video_url) = self.cli.video_url {
            config.video_url = Some(video_url.clone());
        }
        if let Some(duration) = self.cli.video_duration {
            config.video_duration_secs = duration;
        }
        if let Some(bytes) = self.cli.transfer_bytes {
            config.transfer_bytes = bytes;
        }
        if let Some(samples) = self.cli.latency_samples {
            config.latency_samples = samples;
        }
        if let Some(interval) = self.cli.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        if let Some(duration) = self.cli.jitter_duration_secs {
            config.jitter_duration_secs = duration;
        }
        if let Some(timeout) = self.cli.timeout_seconds {
            config.timeout_seconds = timeout;
        }
        if let Some(policy) = self.cli.reduction_policy {
            config.reduction_policy = policy;
        }

        config.enable_color = self.cli.use_colors();
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
    }
}

/// Findings worth surfacing that do not block a run
fn soft_warnings(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.transfer_bytes > 100 * 1024 * 1024 {
        warnings.push(ConfigWarning::new(format!(
            "transfer size of {} bytes will take a while on slow links",
            config.transfer_bytes
        )));
    }

    if config.poll_interval_ms < 100 {
        warnings.push(ConfigWarning::new(
            "poll intervals under 100 ms add sampling overhead without improving the estimate",
        ));
    }

    if config.jitter_duration_secs > 120 {
        warnings.push(ConfigWarning::new(format!(
            "a {} s jitter run is unusually long; 20 s is typically enough",
            config.jitter_duration_secs
        )));
    }

    warnings
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<(Config, Vec<ConfigWarning>)> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!(
        "Probes: {}",
        config
            .probes
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    summary.push(format!("Download URLs: {}", config.download_urls.join(", ")));
    summary.push(format!("Upload URL: {}", config.upload_url));
    if let Some(ref video_url) = config.video_url {
        summary.push(format!(
            "Video URL: {} ({} s declared)",
            video_url, config.video_duration_secs
        ));
    }
    summary.push(format!("Transfer Size: {} bytes", config.transfer_bytes));
    summary.push(format!("Latency Samples: {}", config.latency_samples));
    summary.push(format!("Poll Interval: {} ms", config.poll_interval_ms));
    summary.push(format!("Jitter Duration: {} s", config.jitter_duration_secs));
    summary.push(format!("Timeout: {} s", config.timeout_seconds));
    summary.push(format!("Reduction Policy: {:?}", config.reduction_policy));
    summary.push(format!("Color Output: {}", config.enable_color));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProbeKind, ReductionPolicy};
    use clap::Parser;

    fn parse_cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let (config, _) = load_config(parse_cli(&["nqp"])).unwrap();
        assert_eq!(config.probes, ProbeKind::ALL.to_vec());
        assert_eq!(config.reduction_policy, ReductionPolicy::KeepLatest);
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let (config, _) = load_config(parse_cli(&[
            "nqp",
            "--probe",
            "throughput",
            "--url",
            "https://mirror.example/100MB.bin",
            "--payload",
            "2048",
            "--policy",
            "average",
            "--timeout",
            "10",
        ]))
        .unwrap();

        assert_eq!(config.probes, vec![ProbeKind::Throughput]);
        assert_eq!(
            config.download_urls,
            vec!["https://mirror.example/100MB.bin".to_string()]
        );
        assert_eq!(config.transfer_bytes, 2048);
        assert_eq!(config.reduction_policy, ReductionPolicy::RunningAverage);
        assert_eq!(config.timeout_seconds, 10);
    }

    #[test]
    fn test_invalid_merged_config_rejected() {
        let result = load_config(parse_cli(&["nqp", "--timeout", "0"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_soft_warnings_do_not_block() {
        let (config, warnings) =
            load_config(parse_cli(&["nqp", "--interval-ms", "50"])).unwrap();
        assert_eq!(config.poll_interval_ms, 50);
        assert!(warnings.iter().any(|w| w.message.contains("100 ms")));
    }

    #[test]
    fn test_no_color_flag_disables_color() {
        let (config, _) = load_config(parse_cli(&["nqp", "--no-color"])).unwrap();
        assert!(!config.enable_color);
    }
}
